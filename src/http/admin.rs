//! PIN-protected content management endpoints.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::handlers::{decode_base64, StatusResponse};
use super::state::AppState;
use crate::content::{
    Category, ListeningPart, ListeningTest, ReadingTest, SpeakingQuestion, SpeakingSubmission,
    SpeakingTest, WritingSubmission, WritingTask, WritingTaskType,
};
use crate::error::PortalError;
use crate::script::{FOLLOWUP_QUESTIONS, INTRO_QUESTIONS};

const ADMIN_PIN_HEADER: &str = "x-admin-pin";

const LISTENING_AUDIO_BUCKET: &str = "listening-audio";
const LISTENING_QUESTIONS_BUCKET: &str = "listening-questions";
const READING_PASSAGES_BUCKET: &str = "reading-passages";
const READING_QUESTIONS_BUCKET: &str = "reading-questions";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateSpeakingTestRequest {
    pub title: String,
    pub intro_questions: Vec<String>,
    pub cue_card: String,
    pub followup_questions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSpeakingQuestionRequest {
    pub category: Category,
    pub part: u8,
    pub question_text: String,
    pub cue_card: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateWritingTaskRequest {
    pub category: Category,
    pub task_type: WritingTaskType,
    pub question_text: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListeningPartUpload {
    /// Part audio, base64 encoded
    pub audio_base64: String,
    pub audio_content_type: Option<String>,
    /// Question sheet for the part, base64 encoded
    pub questions_base64: String,
    pub questions_content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateListeningTestRequest {
    pub title: String,
    pub difficulty: Option<String>,
    pub answer_key: String,
    /// Parts in order; numbered 1..=4 from position
    pub parts: Vec<ListeningPartUpload>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReadingTestRequest {
    pub title: String,
    pub category: Category,
    pub passage_base64: String,
    pub passage_content_type: Option<String>,
    pub questions_base64: String,
    pub questions_content_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionsResponse {
    pub speaking: Vec<SpeakingSubmission>,
    pub writing: Vec<WritingSubmission>,
}

// ============================================================================
// Helpers
// ============================================================================

fn require_pin(state: &AppState, headers: &HeaderMap) -> Result<(), PortalError> {
    let presented = headers
        .get(ADMIN_PIN_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if presented != state.config.admin.pin {
        return Err(PortalError::Unauthorized);
    }
    Ok(())
}

fn require_text(label: &str, value: &str) -> Result<(), PortalError> {
    if value.trim().is_empty() {
        return Err(PortalError::ValidationFailure(format!(
            "{} must not be empty",
            label
        )));
    }
    Ok(())
}

// ============================================================================
// Speaking Content
// ============================================================================

/// POST /admin/speaking/tests
pub async fn create_speaking_test(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateSpeakingTestRequest>,
) -> Result<(StatusCode, Json<SpeakingTest>), PortalError> {
    require_pin(&state, &headers)?;
    require_text("title", &req.title)?;
    require_text("cue_card", &req.cue_card)?;
    if req.intro_questions.len() != INTRO_QUESTIONS {
        return Err(PortalError::ValidationFailure(format!(
            "expected {} introduction questions, got {}",
            INTRO_QUESTIONS,
            req.intro_questions.len()
        )));
    }
    if req.followup_questions.len() != FOLLOWUP_QUESTIONS {
        return Err(PortalError::ValidationFailure(format!(
            "expected {} follow-up questions, got {}",
            FOLLOWUP_QUESTIONS,
            req.followup_questions.len()
        )));
    }

    let test = SpeakingTest {
        id: Uuid::new_v4(),
        title: req.title,
        intro_questions: req.intro_questions,
        cue_card: req.cue_card,
        followup_questions: req.followup_questions,
        created_at: Utc::now(),
    };
    state.content.insert_speaking_test(test.clone()).await;
    info!("Created speaking test {}", test.id);
    Ok((StatusCode::CREATED, Json(test)))
}

/// DELETE /admin/speaking/tests/:id
pub async fn delete_speaking_test(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusResponse>, PortalError> {
    require_pin(&state, &headers)?;
    if !state.content.delete_speaking_test(id).await {
        return Err(PortalError::NotFound(format!("speaking test {}", id)));
    }
    Ok(Json(StatusResponse {
        status: "deleted".to_string(),
    }))
}

/// POST /admin/speaking/questions
pub async fn create_speaking_question(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateSpeakingQuestionRequest>,
) -> Result<(StatusCode, Json<SpeakingQuestion>), PortalError> {
    require_pin(&state, &headers)?;
    require_text("question_text", &req.question_text)?;
    if !(1..=3).contains(&req.part) {
        return Err(PortalError::ValidationFailure(format!(
            "part must be 1, 2 or 3, got {}",
            req.part
        )));
    }

    let question = SpeakingQuestion {
        id: Uuid::new_v4(),
        category: req.category,
        part: req.part,
        question_text: req.question_text,
        cue_card: req.cue_card,
        created_at: Utc::now(),
    };
    state
        .content
        .insert_speaking_question(question.clone())
        .await;
    Ok((StatusCode::CREATED, Json(question)))
}

/// DELETE /admin/speaking/questions/:id
pub async fn delete_speaking_question(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusResponse>, PortalError> {
    require_pin(&state, &headers)?;
    if !state.content.delete_speaking_question(id).await {
        return Err(PortalError::NotFound(format!("speaking question {}", id)));
    }
    Ok(Json(StatusResponse {
        status: "deleted".to_string(),
    }))
}

// ============================================================================
// Writing Content
// ============================================================================

/// POST /admin/writing/tasks
pub async fn create_writing_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateWritingTaskRequest>,
) -> Result<(StatusCode, Json<WritingTask>), PortalError> {
    require_pin(&state, &headers)?;
    require_text("question_text", &req.question_text)?;

    let task = WritingTask {
        id: Uuid::new_v4(),
        category: req.category,
        task_type: req.task_type,
        question_text: req.question_text,
        image_url: req.image_url,
        created_at: Utc::now(),
    };
    state.content.insert_writing_task(task.clone()).await;
    Ok((StatusCode::CREATED, Json(task)))
}

/// DELETE /admin/writing/tasks/:id
pub async fn delete_writing_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusResponse>, PortalError> {
    require_pin(&state, &headers)?;
    if !state.content.delete_writing_task(id).await {
        return Err(PortalError::NotFound(format!("writing task {}", id)));
    }
    Ok(Json(StatusResponse {
        status: "deleted".to_string(),
    }))
}

// ============================================================================
// Listening Content
// ============================================================================

/// POST /admin/listening/tests
/// Upload a multi-part listening test; audio and question sheets go to the
/// blob store, the record keeps their public URLs
pub async fn create_listening_test(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateListeningTestRequest>,
) -> Result<(StatusCode, Json<ListeningTest>), PortalError> {
    require_pin(&state, &headers)?;
    require_text("title", &req.title)?;
    require_text("answer_key", &req.answer_key)?;
    if req.parts.is_empty() || req.parts.len() > 4 {
        return Err(PortalError::ValidationFailure(format!(
            "a listening test has 1 to 4 parts, got {}",
            req.parts.len()
        )));
    }

    let mut parts = Vec::with_capacity(req.parts.len());
    for (i, upload) in req.parts.iter().enumerate() {
        let part = (i + 1) as u8;
        let audio = decode_base64(&format!("audio for part {}", part), &upload.audio_base64)?;
        let questions = decode_base64(
            &format!("questions for part {}", part),
            &upload.questions_base64,
        )?;

        let audio_type = upload.audio_content_type.as_deref().unwrap_or("audio/mpeg");
        let questions_type = upload
            .questions_content_type
            .as_deref()
            .unwrap_or("application/pdf");

        let audio_object = state
            .blobs
            .upload(
                LISTENING_AUDIO_BUCKET,
                &format!("part{}-audio-{}", part, Uuid::new_v4()),
                audio,
                audio_type,
            )
            .await?;
        let questions_object = state
            .blobs
            .upload(
                LISTENING_QUESTIONS_BUCKET,
                &format!("part{}-questions-{}", part, Uuid::new_v4()),
                questions,
                questions_type,
            )
            .await?;

        parts.push(ListeningPart {
            part,
            audio_url: audio_object.url,
            questions_url: questions_object.url,
        });
    }

    let test = ListeningTest {
        id: Uuid::new_v4(),
        title: req.title,
        difficulty: req.difficulty,
        answer_key: req.answer_key,
        parts,
        created_at: Utc::now(),
    };
    state.content.insert_listening_test(test.clone()).await;
    info!(
        "Created listening test {} with {} parts",
        test.id,
        test.parts.len()
    );
    Ok((StatusCode::CREATED, Json(test)))
}

/// DELETE /admin/listening/tests/:id
pub async fn delete_listening_test(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusResponse>, PortalError> {
    require_pin(&state, &headers)?;
    if !state.content.delete_listening_test(id).await {
        return Err(PortalError::NotFound(format!("listening test {}", id)));
    }
    Ok(Json(StatusResponse {
        status: "deleted".to_string(),
    }))
}

// ============================================================================
// Reading Content
// ============================================================================

/// POST /admin/reading/tests
pub async fn create_reading_test(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateReadingTestRequest>,
) -> Result<(StatusCode, Json<ReadingTest>), PortalError> {
    require_pin(&state, &headers)?;
    require_text("title", &req.title)?;

    let passage = decode_base64("passage", &req.passage_base64)?;
    let questions = decode_base64("questions", &req.questions_base64)?;

    let passage_object = state
        .blobs
        .upload(
            READING_PASSAGES_BUCKET,
            &format!("passage-{}", Uuid::new_v4()),
            passage,
            req.passage_content_type
                .as_deref()
                .unwrap_or("application/pdf"),
        )
        .await?;
    let questions_object = state
        .blobs
        .upload(
            READING_QUESTIONS_BUCKET,
            &format!("questions-{}", Uuid::new_v4()),
            questions,
            req.questions_content_type
                .as_deref()
                .unwrap_or("application/pdf"),
        )
        .await?;

    let test = ReadingTest {
        id: Uuid::new_v4(),
        title: req.title,
        category: req.category,
        passage_url: passage_object.url,
        questions_url: questions_object.url,
        created_at: Utc::now(),
    };
    state.content.insert_reading_test(test.clone()).await;
    info!("Created reading test {}", test.id);
    Ok((StatusCode::CREATED, Json(test)))
}

/// DELETE /admin/reading/tests/:id
pub async fn delete_reading_test(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusResponse>, PortalError> {
    require_pin(&state, &headers)?;
    if !state.content.delete_reading_test(id).await {
        return Err(PortalError::NotFound(format!("reading test {}", id)));
    }
    Ok(Json(StatusResponse {
        status: "deleted".to_string(),
    }))
}

// ============================================================================
// Submissions
// ============================================================================

/// GET /admin/submissions
/// Review everything students have submitted, newest first
pub async fn list_submissions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SubmissionsResponse>, PortalError> {
    require_pin(&state, &headers)?;
    Ok(Json(SubmissionsResponse {
        speaking: state.content.list_speaking_submissions().await,
        writing: state.content.list_writing_submissions().await,
    }))
}
