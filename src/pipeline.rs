//! Submission pipeline: validate, upload, evaluate, persist.
//!
//! Both operations run the same strict order. Validation happens before any
//! network call; a failure at any later step halts the pipeline with a
//! typed error and persists nothing, so a submission is either fully
//! recorded or absent. Object keys are fresh UUIDs, which makes retrying a
//! failed submission safe.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::audio::RecordingArtifact;
use crate::content::{ContentStore, SpeakingSubmission, WritingSubmission, WritingTask};
use crate::error::PortalError;
use crate::examiner::Evaluator;
use crate::storage::BlobStore;

/// Bucket for uploaded answer recordings.
pub const SPEAKING_BUCKET: &str = "speaking-recordings";
/// Bucket for uploaded essays.
pub const ESSAY_BUCKET: &str = "writing-essays";

/// Words separated by any whitespace, empty runs ignored.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub struct SubmissionPipeline {
    blobs: Arc<dyn BlobStore>,
    evaluator: Option<Arc<dyn Evaluator>>,
    content: Arc<ContentStore>,
}

impl SubmissionPipeline {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        evaluator: Option<Arc<dyn Evaluator>>,
        content: Arc<ContentStore>,
    ) -> Self {
        Self {
            blobs,
            evaluator,
            content,
        }
    }

    /// Submit an essay for a writing task.
    #[instrument(level = "info", skip(self, essay), fields(task_id = %task.id))]
    pub async fn submit_essay(
        &self,
        task: &WritingTask,
        essay: &str,
    ) -> Result<WritingSubmission, PortalError> {
        let words = word_count(essay);
        let min_words = task.task_type.min_words();
        if words < min_words {
            return Err(PortalError::ValidationFailure(format!(
                "essay has {} words; the task requires at least {}",
                words, min_words
            )));
        }

        let key = format!("essay-{}.txt", Uuid::new_v4());
        let stored = self
            .blobs
            .upload(ESSAY_BUCKET, &key, essay.as_bytes().to_vec(), "text/plain")
            .await?;

        let feedback = self
            .evaluator()?
            .evaluate_writing(task.task_type, &task.question_text, essay)
            .await?;

        let submission = WritingSubmission {
            id: Uuid::new_v4(),
            task_id: task.id,
            essay_url: stored.url,
            word_count: words,
            feedback,
            created_at: Utc::now(),
        };
        self.content
            .insert_writing_submission(submission.clone())
            .await;

        info!(
            "Essay scored: submission {} band {:.1}",
            submission.id, submission.feedback.overall_band
        );
        Ok(submission)
    }

    /// Submit a recorded spoken answer with its transcript.
    ///
    /// Transcription is done upstream; the pipeline scores the transcript
    /// against the question and archives the audio.
    #[instrument(level = "info", skip_all, fields(question_len = question.len()))]
    pub async fn submit_speaking(
        &self,
        question: &str,
        question_id: Option<Uuid>,
        artifact: &RecordingArtifact,
        transcript: &str,
    ) -> Result<SpeakingSubmission, PortalError> {
        if artifact.is_empty() {
            return Err(PortalError::ValidationFailure(
                "the recording contains no audio".to_string(),
            ));
        }
        if transcript.trim().is_empty() {
            return Err(PortalError::ValidationFailure(
                "a transcript of the answer is required".to_string(),
            ));
        }

        let key = format!("recording-{}.wav", Uuid::new_v4());
        let stored = self
            .blobs
            .upload(SPEAKING_BUCKET, &key, artifact.wav.clone(), "audio/wav")
            .await?;

        let feedback = self
            .evaluator()?
            .evaluate_speaking(question, transcript)
            .await?;

        let submission = SpeakingSubmission {
            id: Uuid::new_v4(),
            question_id,
            question: question.to_string(),
            audio_url: stored.url,
            transcript: transcript.to_string(),
            feedback,
            created_at: Utc::now(),
        };
        self.content
            .insert_speaking_submission(submission.clone())
            .await;

        info!(
            "Answer scored: submission {} band {:.1}",
            submission.id, submission.feedback.overall_band
        );
        Ok(submission)
    }

    fn evaluator(&self) -> Result<&Arc<dyn Evaluator>, PortalError> {
        self.evaluator.as_ref().ok_or_else(|| {
            PortalError::EvaluatorFailure("no evaluator is configured".to_string())
        })
    }
}
