// Integration tests for the HTTP API
//
// Each test boots the real router on an ephemeral port and talks to it
// with an HTTP client, the way the browser frontend would.

use anyhow::Result;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use bandprep::audio::{ChannelMicrophone, RecordingArtifact};
use bandprep::content::{samples, WritingTaskType};
use bandprep::error::PortalError;
use bandprep::examiner::{Evaluator, SpeakingFeedback, WritingFeedback};
use bandprep::session::LoggingNarrator;
use bandprep::storage::MemoryBucket;
use bandprep::{create_router, AppState, Config};

const PIN: &str = "123456";

/// Evaluator with canned scores, for tests that exercise the full
/// submission path.
struct CannedExaminer;

#[async_trait]
impl Evaluator for CannedExaminer {
    async fn evaluate_speaking(
        &self,
        _question: &str,
        transcript: &str,
    ) -> Result<SpeakingFeedback, PortalError> {
        Ok(SpeakingFeedback {
            overall_band: 7.0,
            fluency: 7.0,
            lexical: 6.5,
            grammar: 7.0,
            pronunciation: 7.5,
            strengths: vec![],
            improvements: vec![],
            detailed_feedback: "Good answer.".to_string(),
            word_count: transcript.split_whitespace().count() as u32,
        })
    }

    async fn evaluate_writing(
        &self,
        _task_type: WritingTaskType,
        _question: &str,
        essay: &str,
    ) -> Result<WritingFeedback, PortalError> {
        Ok(WritingFeedback {
            overall_band: 6.0,
            task_response: 6.0,
            coherence: 6.0,
            lexical: 6.0,
            grammar: 6.0,
            corrections: vec![],
            vocabulary_upgrades: vec![],
            improved_essay: essay.to_string(),
            tips: vec![],
        })
    }
}

/// Boot the portal on an ephemeral port with seeded sample content.
async fn spawn_portal(
    evaluator: Option<Arc<dyn Evaluator>>,
) -> Result<(String, Arc<ChannelMicrophone>)> {
    let cfg = Config::default();
    let mic = Arc::new(ChannelMicrophone::new());
    let state = AppState::new(
        cfg,
        mic.clone(),
        Arc::new(LoggingNarrator),
        Arc::new(MemoryBucket::new()),
        evaluator,
    );
    samples::seed(&state.content).await;

    let app = create_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base = format!("http://{}", listener.local_addr()?);
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    Ok((base, mic))
}

fn b64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn pcm_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

fn essay_of(words: usize) -> String {
    (0..words)
        .map(|i| format!("word{}", i))
        .collect::<Vec<_>>()
        .join(" ")
}

async fn seeded_speaking_test_id(client: &reqwest::Client, base: &str) -> Result<String> {
    let tests: Value = client
        .get(format!("{}/speaking/tests", base))
        .send()
        .await?
        .json()
        .await?;
    Ok(tests[0]["id"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn test_health_endpoint() -> Result<()> {
    let (base, _mic) = spawn_portal(None).await?;
    let res = reqwest::get(format!("{}/health", base)).await?;

    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await?, "OK");
    Ok(())
}

#[tokio::test]
async fn test_sample_content_is_listed() -> Result<()> {
    let (base, _mic) = spawn_portal(None).await?;
    let client = reqwest::Client::new();

    let tests: Value = client
        .get(format!("{}/speaking/tests", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(tests.as_array().unwrap().len(), 1);
    assert_eq!(tests[0]["intro_questions"].as_array().unwrap().len(), 6);

    let tasks: Value = client
        .get(format!("{}/writing/tasks", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(tasks.as_array().unwrap().len(), 2);

    // Category filter narrows the list
    let academic: Value = client
        .get(format!("{}/writing/tasks?category=academic", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(academic.as_array().unwrap().len(), 1);
    assert_eq!(academic[0]["task_type"], "task1");

    let part_two: Value = client
        .get(format!("{}/speaking/questions?part=2", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(part_two.as_array().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_admin_endpoints_require_the_pin() -> Result<()> {
    let (base, _mic) = spawn_portal(None).await?;
    let client = reqwest::Client::new();
    let body = json!({
        "category": "general",
        "task_type": "task2",
        "question_text": "Is homework useful for young children? Give your opinion."
    });

    // No PIN header
    let res = client
        .post(format!("{}/admin/writing/tasks", base))
        .json(&body)
        .send()
        .await?;
    assert_eq!(res.status(), 401);
    let err: Value = res.json().await?;
    assert_eq!(err["kind"], "unauthorized");

    // Wrong PIN
    let res = client
        .post(format!("{}/admin/writing/tasks", base))
        .header("x-admin-pin", "000000")
        .json(&body)
        .send()
        .await?;
    assert_eq!(res.status(), 401);

    // Correct PIN (the default)
    let res = client
        .post(format!("{}/admin/writing/tasks", base))
        .header("x-admin-pin", PIN)
        .json(&body)
        .send()
        .await?;
    assert_eq!(res.status(), 201);
    let created: Value = res.json().await?;
    assert!(created["id"].as_str().is_some());

    let tasks: Value = client
        .get(format!("{}/writing/tasks", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(tasks.as_array().unwrap().len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_speaking_test_shape_is_validated() -> Result<()> {
    let (base, _mic) = spawn_portal(None).await?;
    let client = reqwest::Client::new();

    // Two introduction questions instead of six
    let res = client
        .post(format!("{}/admin/speaking/tests", base))
        .header("x-admin-pin", PIN)
        .json(&json!({
            "title": "Broken test",
            "intro_questions": ["one", "two"],
            "cue_card": "Describe something.",
            "followup_questions": ["a", "b", "c", "d", "e"]
        }))
        .send()
        .await?;

    assert_eq!(res.status(), 422);
    let err: Value = res.json().await?;
    assert_eq!(err["kind"], "validation_failure");
    Ok(())
}

#[tokio::test]
async fn test_session_flow_over_http() -> Result<()> {
    let (base, _mic) = spawn_portal(None).await?;
    let client = reqwest::Client::new();
    let test_id = seeded_speaking_test_id(&client, &base).await?;

    // Create
    let created: Value = client
        .post(format!("{}/speaking/sessions", base))
        .json(&json!({ "test_id": test_id }))
        .send()
        .await?
        .json()
        .await?;
    let session_id = created["session"]["session_id"].as_str().unwrap().to_string();
    assert_eq!(created["session"]["phase"]["name"], "not_started");
    assert_eq!(created["slots"].as_array().unwrap().len(), 12);
    assert_eq!(created["slots"][6]["kind"], "cue_card");

    // Start
    let view: Value = client
        .post(format!("{}/speaking/sessions/{}/start", base, session_id))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(view["phase"]["name"], "intro");
    assert_eq!(view["phase"]["number"], 1);

    // Record, stream PCM, stop
    let view: Value = client
        .post(format!("{}/speaking/sessions/{}/record", base, session_id))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(view["recording_elapsed_secs"], 0);

    let res = client
        .post(format!("{}/speaking/sessions/{}/frames", base, session_id))
        .json(&json!({ "pcm_base64": b64(&pcm_bytes(&[1000i16; 8000])) }))
        .send()
        .await?;
    assert_eq!(res.status(), 204);

    let view: Value = client
        .post(format!("{}/speaking/sessions/{}/stop", base, session_id))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(view["recorded_slots"], json!([0]));
    assert_eq!(view["phase"]["number"], 1, "intro waits for an explicit next");

    // Slot audio comes back as WAV
    let res = client
        .get(format!(
            "{}/speaking/sessions/{}/slots/0/audio",
            base, session_id
        ))
        .send()
        .await?;
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "audio/wav");
    assert!(res.bytes().await?.starts_with(b"RIFF"));

    // Next
    let view: Value = client
        .post(format!("{}/speaking/sessions/{}/next", base, session_id))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(view["phase"]["number"], 2);

    // Close
    let res = client
        .delete(format!("{}/speaking/sessions/{}", base, session_id))
        .send()
        .await?;
    assert_eq!(res.status(), 200);

    let res = client
        .get(format!("{}/speaking/sessions/{}", base, session_id))
        .send()
        .await?;
    assert_eq!(res.status(), 404);
    Ok(())
}

#[tokio::test]
async fn test_unknown_session_is_a_404() -> Result<()> {
    let (base, _mic) = spawn_portal(None).await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/speaking/sessions/session-missing/record", base))
        .send()
        .await?;
    assert_eq!(res.status(), 404);
    let err: Value = res.json().await?;
    assert_eq!(err["kind"], "not_found");
    Ok(())
}

#[tokio::test]
async fn test_odd_length_frames_are_rejected() -> Result<()> {
    let (base, _mic) = spawn_portal(None).await?;
    let client = reqwest::Client::new();
    let test_id = seeded_speaking_test_id(&client, &base).await?;

    let created: Value = client
        .post(format!("{}/speaking/sessions", base))
        .json(&json!({ "test_id": test_id }))
        .send()
        .await?
        .json()
        .await?;
    let session_id = created["session"]["session_id"].as_str().unwrap();

    client
        .post(format!("{}/speaking/sessions/{}/start", base, session_id))
        .send()
        .await?;
    client
        .post(format!("{}/speaking/sessions/{}/record", base, session_id))
        .send()
        .await?;

    // Three bytes cannot be 16-bit samples
    let res = client
        .post(format!("{}/speaking/sessions/{}/frames", base, session_id))
        .json(&json!({ "pcm_base64": b64(&[1, 2, 3]) }))
        .send()
        .await?;
    assert_eq!(res.status(), 422);
    Ok(())
}

#[tokio::test]
async fn test_device_conflict_maps_to_409() -> Result<()> {
    let (base, mic) = spawn_portal(None).await?;
    let client = reqwest::Client::new();
    let test_id = seeded_speaking_test_id(&client, &base).await?;

    let created: Value = client
        .post(format!("{}/speaking/sessions", base))
        .json(&json!({ "test_id": test_id }))
        .send()
        .await?
        .json()
        .await?;
    let session_id = created["session"]["session_id"].as_str().unwrap();

    client
        .post(format!("{}/speaking/sessions/{}/start", base, session_id))
        .send()
        .await?;

    mic.set_available(false);
    let res = client
        .post(format!("{}/speaking/sessions/{}/record", base, session_id))
        .send()
        .await?;
    assert_eq!(res.status(), 409);
    let err: Value = res.json().await?;
    assert_eq!(err["kind"], "device_unavailable");

    // The failure left the session usable
    mic.set_available(true);
    let res = client
        .post(format!("{}/speaking/sessions/{}/record", base, session_id))
        .send()
        .await?;
    assert_eq!(res.status(), 200);
    Ok(())
}

#[tokio::test]
async fn test_writing_submission_validation_and_evaluator_gate() -> Result<()> {
    // No evaluator configured on this portal
    let (base, _mic) = spawn_portal(None).await?;
    let client = reqwest::Client::new();

    let tasks: Value = client
        .get(format!("{}/writing/tasks", base))
        .send()
        .await?
        .json()
        .await?;
    let task2 = tasks
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["task_type"] == "task2")
        .unwrap();
    let task_id = task2["id"].as_str().unwrap();

    // Too short: rejected before anything else runs
    let res = client
        .post(format!("{}/writing/submissions", base))
        .json(&json!({ "task_id": task_id, "essay": essay_of(100) }))
        .send()
        .await?;
    assert_eq!(res.status(), 422);
    let err: Value = res.json().await?;
    assert_eq!(err["kind"], "validation_failure");

    // Long enough, but there is nothing to score it with
    let res = client
        .post(format!("{}/writing/submissions", base))
        .json(&json!({ "task_id": task_id, "essay": essay_of(260) }))
        .send()
        .await?;
    assert_eq!(res.status(), 502);
    let err: Value = res.json().await?;
    assert_eq!(err["kind"], "evaluator_failure");
    Ok(())
}

#[tokio::test]
async fn test_speaking_submission_over_http() -> Result<()> {
    let (base, _mic) = spawn_portal(Some(Arc::new(CannedExaminer))).await?;
    let client = reqwest::Client::new();

    let artifact = RecordingArtifact::from_samples(&vec![500i16; 16000], 16000, 1)?;
    let res = client
        .post(format!("{}/speaking/submissions", base))
        .json(&json!({
            "question": "Describe a journey you remember well.",
            "transcript": "I took a night train through the mountains last winter.",
            "audio_base64": b64(&artifact.wav)
        }))
        .send()
        .await?;
    assert_eq!(res.status(), 200);

    let submission: Value = res.json().await?;
    // Feedback crosses the wire in camelCase
    assert_eq!(submission["feedback"]["overallBand"], 7.0);
    assert!(submission["audio_url"]
        .as_str()
        .unwrap()
        .contains("speaking-recordings/recording-"));

    // Without a question there is nothing to evaluate against
    let res = client
        .post(format!("{}/speaking/submissions", base))
        .json(&json!({
            "transcript": "An answer with no question.",
            "audio_base64": b64(&artifact.wav)
        }))
        .send()
        .await?;
    assert_eq!(res.status(), 422);
    Ok(())
}

#[tokio::test]
async fn test_listening_test_upload_roundtrip() -> Result<()> {
    let (base, _mic) = spawn_portal(None).await?;
    let client = reqwest::Client::new();

    let part = |n: u32| {
        json!({
            "audio_base64": b64(format!("fake-audio-{}", n).as_bytes()),
            "questions_base64": b64(format!("fake-questions-{}", n).as_bytes())
        })
    };

    let res = client
        .post(format!("{}/admin/listening/tests", base))
        .header("x-admin-pin", PIN)
        .json(&json!({
            "title": "Campus conversations",
            "difficulty": "medium",
            "answer_key": "1. B\n2. library\n3. A",
            "parts": [part(1), part(2)]
        }))
        .send()
        .await?;
    assert_eq!(res.status(), 201);

    let created: Value = res.json().await?;
    let parts = created["parts"].as_array().unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0]["part"], 1);
    assert!(parts[0]["audio_url"]
        .as_str()
        .unwrap()
        .starts_with("memory://listening-audio/part1-audio-"));
    assert!(parts[1]["questions_url"]
        .as_str()
        .unwrap()
        .starts_with("memory://listening-questions/part2-questions-"));

    // The record is retrievable, then deletable
    let id = created["id"].as_str().unwrap();
    let res = client
        .get(format!("{}/listening/tests/{}", base, id))
        .send()
        .await?;
    assert_eq!(res.status(), 200);

    let res = client
        .delete(format!("{}/admin/listening/tests/{}", base, id))
        .header("x-admin-pin", PIN)
        .send()
        .await?;
    assert_eq!(res.status(), 200);

    let res = client
        .get(format!("{}/listening/tests/{}", base, id))
        .send()
        .await?;
    assert_eq!(res.status(), 404);

    // Five parts is out of range
    let res = client
        .post(format!("{}/admin/listening/tests", base))
        .header("x-admin-pin", PIN)
        .json(&json!({
            "title": "Too many parts",
            "answer_key": "1. A",
            "parts": [part(1), part(2), part(3), part(4), part(5)]
        }))
        .send()
        .await?;
    assert_eq!(res.status(), 422);
    Ok(())
}

#[tokio::test]
async fn test_admin_submission_review() -> Result<()> {
    let (base, _mic) = spawn_portal(Some(Arc::new(CannedExaminer))).await?;
    let client = reqwest::Client::new();

    let tasks: Value = client
        .get(format!("{}/writing/tasks", base))
        .send()
        .await?
        .json()
        .await?;
    let task_id = tasks[0]["id"].as_str().unwrap();

    client
        .post(format!("{}/writing/submissions", base))
        .json(&json!({ "task_id": task_id, "essay": essay_of(300) }))
        .send()
        .await?;

    let res = client
        .get(format!("{}/admin/submissions", base))
        .header("x-admin-pin", PIN)
        .send()
        .await?;
    assert_eq!(res.status(), 200);
    let review: Value = res.json().await?;
    assert_eq!(review["writing"].as_array().unwrap().len(), 1);
    assert_eq!(review["speaking"].as_array().unwrap().len(), 0);
    Ok(())
}
