//! AI examiner boundary: band-score feedback for spoken answers and essays.

mod client;

use serde::{Deserialize, Serialize};

use crate::content::WritingTaskType;
use crate::error::PortalError;

pub use client::AiExaminer;

/// Band-score feedback for a spoken answer.
///
/// Field names cross the wire in camelCase; that is the schema the examiner
/// model is instructed to produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakingFeedback {
    pub overall_band: f32,
    pub fluency: f32,
    pub lexical: f32,
    pub grammar: f32,
    pub pronunciation: f32,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    pub detailed_feedback: String,
    pub word_count: u32,
}

/// One line-level correction in an essay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Correction {
    pub line: u32,
    pub error: String,
    pub correction: String,
    pub explanation: String,
}

/// A suggested stronger phrasing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyUpgrade {
    pub original: String,
    pub upgrade: String,
    pub context: String,
}

/// Band-score feedback for an essay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WritingFeedback {
    pub overall_band: f32,
    pub task_response: f32,
    pub coherence: f32,
    pub lexical: f32,
    pub grammar: f32,
    #[serde(default)]
    pub corrections: Vec<Correction>,
    #[serde(default)]
    pub vocabulary_upgrades: Vec<VocabularyUpgrade>,
    pub improved_essay: String,
    #[serde(default)]
    pub tips: Vec<String>,
}

/// Scoring boundary. Implementations turn an answer into structured
/// feedback or report why they could not.
#[async_trait::async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate_speaking(
        &self,
        question: &str,
        transcript: &str,
    ) -> Result<SpeakingFeedback, PortalError>;

    async fn evaluate_writing(
        &self,
        task_type: WritingTaskType,
        question: &str,
        essay: &str,
    ) -> Result<WritingFeedback, PortalError>;
}

/// Parse a JSON object out of a model response.
///
/// Models asked for strict JSON still wrap it in markdown code fences often
/// enough that the fences are stripped before parsing. Anything that does
/// not parse into the expected shape is an evaluator failure, never a
/// panic.
pub fn parse_model_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, PortalError> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str(cleaned)
        .map_err(|e| PortalError::EvaluatorFailure(format!("malformed evaluator response: {}", e)))
}

fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "JSON", ...) after the opening fence.
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEAKING_JSON: &str = r#"{
        "overallBand": 6.5,
        "fluency": 6.0,
        "lexical": 6.5,
        "grammar": 6.0,
        "pronunciation": 7.0,
        "strengths": ["natural pace"],
        "improvements": ["expand answers"],
        "detailedFeedback": "A solid answer.",
        "wordCount": 84
    }"#;

    #[test]
    fn test_parses_plain_json() {
        let feedback: SpeakingFeedback = parse_model_json(SPEAKING_JSON).unwrap();
        assert_eq!(feedback.overall_band, 6.5);
        assert_eq!(feedback.word_count, 84);
        assert_eq!(feedback.strengths, vec!["natural pace"]);
    }

    #[test]
    fn test_strips_json_code_fences() {
        let wrapped = format!("```json\n{}\n```", SPEAKING_JSON);
        let feedback: SpeakingFeedback = parse_model_json(&wrapped).unwrap();
        assert_eq!(feedback.pronunciation, 7.0);
    }

    #[test]
    fn test_strips_bare_code_fences() {
        let wrapped = format!("```\n{}\n```", SPEAKING_JSON);
        let feedback: SpeakingFeedback = parse_model_json(&wrapped).unwrap();
        assert_eq!(feedback.detailed_feedback, "A solid answer.");

        // Some models skip the newline after the fence entirely
        let inline = format!("```{}```", "{\"x\": 1}");
        let value: serde_json::Value = parse_model_json(&inline).unwrap();
        assert_eq!(value["x"], 1);
    }

    #[test]
    fn test_missing_list_fields_default_to_empty() {
        let minimal = r#"{
            "overallBand": 5.0,
            "fluency": 5.0,
            "lexical": 5.0,
            "grammar": 5.0,
            "pronunciation": 5.0,
            "detailedFeedback": "Short.",
            "wordCount": 12
        }"#;
        let feedback: SpeakingFeedback = parse_model_json(minimal).unwrap();
        assert!(feedback.strengths.is_empty());
        assert!(feedback.improvements.is_empty());
    }

    #[test]
    fn test_malformed_response_is_an_evaluator_failure() {
        let err = parse_model_json::<SpeakingFeedback>("I would rate this a 7.").unwrap_err();
        assert!(matches!(err, PortalError::EvaluatorFailure(_)));

        let err = parse_model_json::<WritingFeedback>("{\"overallBand\": true}").unwrap_err();
        assert!(matches!(err, PortalError::EvaluatorFailure(_)));
    }
}
