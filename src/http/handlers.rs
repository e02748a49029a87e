use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::state::AppState;
use crate::audio::RecordingArtifact;
use crate::content::{
    Category, ListeningTest, ReadingTest, SpeakingQuestion, SpeakingSubmission, SpeakingTest,
    WritingSubmission, WritingTask,
};
use crate::error::PortalError;
use crate::script::PromptScript;
use crate::session::{GuidedSession, SessionView, SlotView};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// Speaking test to run the session against
    pub test_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session: SessionView,
    pub slots: Vec<SlotView>,
}

#[derive(Debug, Deserialize)]
pub struct PushFramesRequest {
    /// Little-endian 16-bit PCM, base64 encoded
    pub pcm_base64: String,
}

#[derive(Debug, Deserialize)]
pub struct SpeakingSubmissionRequest {
    /// Bank question this answers, if any
    pub question_id: Option<Uuid>,
    /// Free-form question text; required when question_id is absent
    pub question: Option<String>,
    pub transcript: String,
    /// Complete WAV file, base64 encoded
    pub audio_base64: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionSubmissionRequest {
    pub transcript: String,
}

#[derive(Debug, Deserialize)]
pub struct WritingSubmissionRequest {
    pub task_id: Uuid,
    pub essay: String,
}

#[derive(Debug, Deserialize)]
pub struct SpeakingQuestionFilter {
    pub category: Option<Category>,
    pub part: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryFilter {
    pub category: Option<Category>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

// ============================================================================
// Helpers
// ============================================================================

async fn fetch_session(
    state: &AppState,
    session_id: &str,
) -> Result<Arc<GuidedSession>, PortalError> {
    state
        .sessions
        .read()
        .await
        .get(session_id)
        .cloned()
        .ok_or_else(|| PortalError::NotFound(format!("session {}", session_id)))
}

pub(super) fn decode_base64(label: &str, payload: &str) -> Result<Vec<u8>, PortalError> {
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| PortalError::ValidationFailure(format!("invalid base64 {}: {}", label, e)))
}

// ============================================================================
// Content Catalogue
// ============================================================================

/// GET /speaking/tests
/// List full guided speaking tests
pub async fn list_speaking_tests(State(state): State<AppState>) -> Json<Vec<SpeakingTest>> {
    Json(state.content.list_speaking_tests().await)
}

/// GET /speaking/tests/:test_id
pub async fn get_speaking_test(
    State(state): State<AppState>,
    Path(test_id): Path<Uuid>,
) -> Result<Json<SpeakingTest>, PortalError> {
    state
        .content
        .speaking_test(test_id)
        .await
        .map(Json)
        .ok_or_else(|| PortalError::NotFound(format!("speaking test {}", test_id)))
}

/// GET /speaking/questions?category=&part=
/// List standalone speaking questions from the bank
pub async fn list_speaking_questions(
    State(state): State<AppState>,
    Query(filter): Query<SpeakingQuestionFilter>,
) -> Json<Vec<SpeakingQuestion>> {
    Json(
        state
            .content
            .list_speaking_questions(filter.category, filter.part)
            .await,
    )
}

/// GET /writing/tasks?category=
pub async fn list_writing_tasks(
    State(state): State<AppState>,
    Query(filter): Query<CategoryFilter>,
) -> Json<Vec<WritingTask>> {
    Json(state.content.list_writing_tasks(filter.category).await)
}

/// GET /writing/tasks/:task_id
pub async fn get_writing_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<WritingTask>, PortalError> {
    state
        .content
        .writing_task(task_id)
        .await
        .map(Json)
        .ok_or_else(|| PortalError::NotFound(format!("writing task {}", task_id)))
}

/// GET /listening/tests
pub async fn list_listening_tests(State(state): State<AppState>) -> Json<Vec<ListeningTest>> {
    Json(state.content.list_listening_tests().await)
}

/// GET /listening/tests/:test_id
pub async fn get_listening_test(
    State(state): State<AppState>,
    Path(test_id): Path<Uuid>,
) -> Result<Json<ListeningTest>, PortalError> {
    state
        .content
        .listening_test(test_id)
        .await
        .map(Json)
        .ok_or_else(|| PortalError::NotFound(format!("listening test {}", test_id)))
}

/// GET /reading/tests?category=
pub async fn list_reading_tests(
    State(state): State<AppState>,
    Query(filter): Query<CategoryFilter>,
) -> Json<Vec<ReadingTest>> {
    Json(state.content.list_reading_tests(filter.category).await)
}

/// GET /reading/tests/:test_id
pub async fn get_reading_test(
    State(state): State<AppState>,
    Path(test_id): Path<Uuid>,
) -> Result<Json<ReadingTest>, PortalError> {
    state
        .content
        .reading_test(test_id)
        .await
        .map(Json)
        .ok_or_else(|| PortalError::NotFound(format!("reading test {}", test_id)))
}

// ============================================================================
// Guided Speaking Sessions
// ============================================================================

/// POST /speaking/sessions
/// Create a guided session for a speaking test
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, PortalError> {
    let test = state
        .content
        .speaking_test(req.test_id)
        .await
        .ok_or_else(|| PortalError::NotFound(format!("speaking test {}", req.test_id)))?;

    let script = PromptScript::from_test(&test, state.config.recording.timing())?;
    let session_id = format!("session-{}", Uuid::new_v4());
    let session = Arc::new(GuidedSession::new(
        session_id.clone(),
        script,
        Arc::clone(&state.microphone),
        Arc::clone(&state.narrator),
        state.config.recording.capture_spec(),
    ));

    let slots = session.slot_views().await;
    let view = session.snapshot().await;

    state
        .sessions
        .write()
        .await
        .insert(session_id.clone(), session);

    info!("Created session {} for test {}", session_id, test.id);

    Ok(Json(CreateSessionResponse {
        session: view,
        slots,
    }))
}

/// GET /speaking/sessions/:session_id
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>, PortalError> {
    let session = fetch_session(&state, &session_id).await?;
    Ok(Json(session.snapshot().await))
}

/// POST /speaking/sessions/:session_id/start
/// Move from not-started to the first introduction prompt
pub async fn start_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>, PortalError> {
    let session = fetch_session(&state, &session_id).await?;
    Ok(Json(session.start().await?))
}

/// POST /speaking/sessions/:session_id/prepare
/// Start the cue card preparation countdown
pub async fn begin_preparation(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>, PortalError> {
    let session = fetch_session(&state, &session_id).await?;
    Ok(Json(session.begin_preparation().await?))
}

/// POST /speaking/sessions/:session_id/record
/// Open the microphone and start recording the active prompt
pub async fn begin_recording(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>, PortalError> {
    let session = fetch_session(&state, &session_id).await?;
    Ok(Json(session.begin_recording().await?))
}

/// POST /speaking/sessions/:session_id/stop
/// Stop recording; a no-op when nothing is being recorded
pub async fn stop_recording(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>, PortalError> {
    let session = fetch_session(&state, &session_id).await?;
    Ok(Json(session.stop_recording().await?))
}

/// POST /speaking/sessions/:session_id/next
/// Advance to the next prompt once the current one is answered
pub async fn next_prompt(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>, PortalError> {
    let session = fetch_session(&state, &session_id).await?;
    Ok(Json(session.next().await?))
}

/// POST /speaking/sessions/:session_id/discard
/// Throw away the active slot's recording so it can be retaken
pub async fn discard_recording(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>, PortalError> {
    let session = fetch_session(&state, &session_id).await?;
    Ok(Json(session.discard().await?))
}

/// POST /speaking/sessions/:session_id/speak
/// Replay the active prompt through the narrator
pub async fn speak_prompt(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>, PortalError> {
    let session = fetch_session(&state, &session_id).await?;
    Ok(Json(session.speak().await?))
}

/// POST /speaking/sessions/:session_id/frames
/// Append captured PCM to the in-flight recording
pub async fn push_frames(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<PushFramesRequest>,
) -> Result<StatusCode, PortalError> {
    let session = fetch_session(&state, &session_id).await?;

    let bytes = decode_base64("audio", &req.pcm_base64)?;
    if bytes.len() % 2 != 0 {
        return Err(PortalError::ValidationFailure(
            "PCM payload has an odd byte length".to_string(),
        ));
    }
    let samples: Vec<i16> = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    session.push_frame(samples).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /speaking/sessions/:session_id/slots/:index/audio
/// Download the WAV recorded for a slot
pub async fn slot_audio(
    State(state): State<AppState>,
    Path((session_id, index)): Path<(String, usize)>,
) -> Result<impl IntoResponse, PortalError> {
    let session = fetch_session(&state, &session_id).await?;
    let wav = session
        .slot_audio(index)
        .await
        .ok_or_else(|| PortalError::NotFound(format!("recording for slot {}", index)))?;
    Ok(([(header::CONTENT_TYPE, "audio/wav")], wav))
}

/// POST /speaking/sessions/:session_id/slots/:index/submit
/// Submit a slot's recording for evaluation
pub async fn submit_session_answer(
    State(state): State<AppState>,
    Path((session_id, index)): Path<(String, usize)>,
    Json(req): Json<SessionSubmissionRequest>,
) -> Result<Json<SpeakingSubmission>, PortalError> {
    let session = fetch_session(&state, &session_id).await?;
    let (question, artifact) = session
        .recorded_answer(index)
        .await
        .ok_or_else(|| PortalError::NotFound(format!("recording for slot {}", index)))?;

    let submission = state
        .pipeline
        .submit_speaking(&question, None, &artifact, &req.transcript)
        .await?;
    Ok(Json(submission))
}

/// DELETE /speaking/sessions/:session_id
/// Tear the session down, stopping timers and releasing the microphone
pub async fn close_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<StatusResponse>, PortalError> {
    let session = state
        .sessions
        .write()
        .await
        .remove(&session_id)
        .ok_or_else(|| PortalError::NotFound(format!("session {}", session_id)))?;

    session.close().await;
    info!("Closed session {}", session_id);

    Ok(Json(StatusResponse {
        status: "closed".to_string(),
    }))
}

// ============================================================================
// Submissions
// ============================================================================

/// POST /speaking/submissions
/// Submit a standalone speaking answer (audio + transcript) for evaluation
pub async fn submit_speaking(
    State(state): State<AppState>,
    Json(req): Json<SpeakingSubmissionRequest>,
) -> Result<Json<SpeakingSubmission>, PortalError> {
    let wav = decode_base64("audio", &req.audio_base64)?;
    let artifact = RecordingArtifact::from_wav_bytes(wav)
        .map_err(|e| PortalError::ValidationFailure(format!("unreadable WAV payload: {}", e)))?;

    let question = match (req.question, req.question_id) {
        (Some(text), _) => text,
        (None, Some(id)) => {
            state
                .content
                .speaking_question(id)
                .await
                .ok_or_else(|| PortalError::NotFound(format!("speaking question {}", id)))?
                .question_text
        }
        (None, None) => {
            return Err(PortalError::ValidationFailure(
                "a question or question_id is required".to_string(),
            ))
        }
    };

    let submission = state
        .pipeline
        .submit_speaking(&question, req.question_id, &artifact, &req.transcript)
        .await?;
    Ok(Json(submission))
}

/// POST /writing/submissions
/// Submit an essay for evaluation
pub async fn submit_essay(
    State(state): State<AppState>,
    Json(req): Json<WritingSubmissionRequest>,
) -> Result<Json<WritingSubmission>, PortalError> {
    let task = state
        .content
        .writing_task(req.task_id)
        .await
        .ok_or_else(|| PortalError::NotFound(format!("writing task {}", req.task_id)))?;

    let submission = state.pipeline.submit_essay(&task, &req.essay).await?;
    Ok(Json(submission))
}

// ============================================================================
// Health
// ============================================================================

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
