use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::examiner::{SpeakingFeedback, WritingFeedback};

/// Exam stream a piece of content belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Academic,
    General,
}

/// Writing task kind. The kind fixes the word minimum and time allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritingTaskType {
    Task1,
    Task2,
}

impl WritingTaskType {
    pub fn min_words(self) -> usize {
        match self {
            WritingTaskType::Task1 => 150,
            WritingTaskType::Task2 => 250,
        }
    }

    pub fn time_allowance_mins(self) -> u32 {
        match self {
            WritingTaskType::Task1 => 20,
            WritingTaskType::Task2 => 40,
        }
    }
}

/// A full guided speaking test: six introduction questions, one cue card,
/// five follow-ups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakingTest {
    pub id: Uuid,
    pub title: String,
    pub intro_questions: Vec<String>,
    pub cue_card: String,
    pub followup_questions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A single speaking prompt for question-by-question practice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakingQuestion {
    pub id: Uuid,
    pub category: Category,
    /// Exam part the question belongs to (1-3).
    pub part: u8,
    pub question_text: String,
    /// Bullet points shown alongside part-2 cue cards.
    pub cue_card: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WritingTask {
    pub id: Uuid,
    pub category: Category,
    pub task_type: WritingTaskType,
    pub question_text: String,
    /// Chart or diagram reference for task-1 prompts.
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One part of a listening test: its audio and its question sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListeningPart {
    pub part: u8,
    pub audio_url: String,
    pub questions_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListeningTest {
    pub id: Uuid,
    pub title: String,
    pub difficulty: Option<String>,
    /// Marking key covering all parts.
    pub answer_key: String,
    pub parts: Vec<ListeningPart>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingTest {
    pub id: Uuid,
    pub title: String,
    pub category: Category,
    pub passage_url: String,
    pub questions_url: String,
    pub created_at: DateTime<Utc>,
}

/// A scored speaking answer: where the audio went, what was said, and what
/// the examiner made of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakingSubmission {
    pub id: Uuid,
    pub question_id: Option<Uuid>,
    pub question: String,
    pub audio_url: String,
    pub transcript: String,
    pub feedback: SpeakingFeedback,
    pub created_at: DateTime<Utc>,
}

/// A scored essay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WritingSubmission {
    pub id: Uuid,
    pub task_id: Uuid,
    pub essay_url: String,
    pub word_count: usize,
    pub feedback: WritingFeedback,
    pub created_at: DateTime<Utc>,
}
