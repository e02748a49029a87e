//! Prompt scripts for guided speaking sessions.
//!
//! A script is the ordered list of prompts a session walks through. The
//! standard shape mirrors the three-part speaking exam: six introduction
//! questions, one cue card with preparation time, five follow-up questions.
//! Cue-ness is carried by the slot's kind; nothing keys off positions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::content::SpeakingTest;
use crate::error::PortalError;

/// Number of introduction questions in a standard test.
pub const INTRO_QUESTIONS: usize = 6;
/// Number of follow-up questions in a standard test.
pub const FOLLOWUP_QUESTIONS: usize = 5;

/// What role a prompt plays in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Introduction,
    CueCard,
    FollowUp,
}

/// One prompt in the script, with its timing policy.
#[derive(Debug, Clone)]
pub struct PromptSlot {
    pub kind: SlotKind,
    pub text: String,
    /// Preparation countdown before the answer. Zero for prompts that are
    /// answered immediately.
    pub prep: Duration,
    /// Upper bound on the answer recording. Reaching it stops the recording.
    pub max_record: Duration,
}

/// Per-kind timing applied when building a script from a test record.
#[derive(Debug, Clone, Copy)]
pub struct SessionTiming {
    /// Cue-card preparation countdown.
    pub prep: Duration,
    /// Recording bound for the cue-card answer.
    pub cue_answer: Duration,
    /// Recording bound for introduction and follow-up answers.
    pub prompt_answer: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            prep: Duration::from_secs(60),
            cue_answer: Duration::from_secs(120),
            prompt_answer: Duration::from_secs(60),
        }
    }
}

/// Immutable ordered prompt list for one session.
#[derive(Debug, Clone)]
pub struct PromptScript {
    slots: Vec<PromptSlot>,
}

impl PromptScript {
    /// Build a script from explicit slots. Every slot needs prompt text and
    /// a recording bound of at least one second.
    pub fn new(slots: Vec<PromptSlot>) -> Result<Self, PortalError> {
        if slots.is_empty() {
            return Err(PortalError::ValidationFailure(
                "a script needs at least one prompt".to_string(),
            ));
        }
        for (i, slot) in slots.iter().enumerate() {
            if slot.text.trim().is_empty() {
                return Err(PortalError::ValidationFailure(format!(
                    "prompt {} has no text",
                    i + 1
                )));
            }
            if slot.max_record < Duration::from_secs(1) {
                return Err(PortalError::ValidationFailure(format!(
                    "prompt {} has a recording bound under one second",
                    i + 1
                )));
            }
        }
        Ok(Self { slots })
    }

    /// Build the standard three-part script from a speaking test record.
    pub fn from_test(test: &SpeakingTest, timing: SessionTiming) -> Result<Self, PortalError> {
        if test.intro_questions.len() != INTRO_QUESTIONS {
            return Err(PortalError::ValidationFailure(format!(
                "expected {} introduction questions, got {}",
                INTRO_QUESTIONS,
                test.intro_questions.len()
            )));
        }
        if test.followup_questions.len() != FOLLOWUP_QUESTIONS {
            return Err(PortalError::ValidationFailure(format!(
                "expected {} follow-up questions, got {}",
                FOLLOWUP_QUESTIONS,
                test.followup_questions.len()
            )));
        }

        let mut slots = Vec::with_capacity(INTRO_QUESTIONS + 1 + FOLLOWUP_QUESTIONS);
        for text in &test.intro_questions {
            slots.push(PromptSlot {
                kind: SlotKind::Introduction,
                text: text.clone(),
                prep: Duration::ZERO,
                max_record: timing.prompt_answer,
            });
        }
        slots.push(PromptSlot {
            kind: SlotKind::CueCard,
            text: test.cue_card.clone(),
            prep: timing.prep,
            max_record: timing.cue_answer,
        });
        for text in &test.followup_questions {
            slots.push(PromptSlot {
                kind: SlotKind::FollowUp,
                text: text.clone(),
                prep: Duration::ZERO,
                max_record: timing.prompt_answer,
            });
        }

        Self::new(slots)
    }

    pub fn slots(&self) -> &[PromptSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PromptSlot> {
        self.slots.get(index)
    }
}
