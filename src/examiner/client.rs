//! Chat-completions client for the AI examiner.
//!
//! We only call chat.completions and always request a strict JSON object.
//! Calls log model names and latencies, never transcripts or essays.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use super::{parse_model_json, Evaluator, SpeakingFeedback, WritingFeedback};
use crate::config::{EvaluationPrompts, EvaluatorConfig};
use crate::content::WritingTaskType;
use crate::error::PortalError;

/// Examiner backed by an OpenAI-compatible chat-completions API.
pub struct AiExaminer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    prompts: EvaluationPrompts,
}

impl AiExaminer {
    /// Construct the examiner if its API key is present in the environment;
    /// otherwise return None and evaluation surfaces as unavailable.
    pub fn from_config(cfg: &EvaluatorConfig, prompts: EvaluationPrompts) -> Option<Self> {
        let api_key = std::env::var(&cfg.api_key_env).ok()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .ok()?;

        Some(Self {
            client,
            api_key,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            prompts,
        })
    }

    /// JSON-object chat completion, parsed into the target type.
    #[instrument(level = "info", skip(self, system, user), fields(model = %self.model))]
    async fn chat_json<T: serde::de::DeserializeOwned>(
        &self,
        system: &str,
        user: &str,
    ) -> Result<T, PortalError> {
        let url = format!("{}/chat/completions", self.base_url);
        let req = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessageReq {
                    role: "system".into(),
                    content: system.into(),
                },
                ChatMessageReq {
                    role: "user".into(),
                    content: user.into(),
                },
            ],
            temperature: 0.2,
            response_format: Some(ResponseFormat {
                r#type: "json_object".into(),
            }),
        };

        let start = std::time::Instant::now();
        let res = self
            .client
            .post(&url)
            .header(USER_AGENT, "bandprep/0.1")
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&req)
            .send()
            .await
            .map_err(|e| PortalError::EvaluatorFailure(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            let msg = extract_model_error(&body).unwrap_or(body);
            error!("Evaluator HTTP {}: {}", status, msg);
            return Err(PortalError::EvaluatorFailure(format!(
                "HTTP {}: {}",
                status, msg
            )));
        }

        let body: ChatCompletionResponse = res
            .json()
            .await
            .map_err(|e| PortalError::EvaluatorFailure(e.to_string()))?;
        if let Some(usage) = &body.usage {
            info!(
                prompt_tokens = ?usage.prompt_tokens,
                completion_tokens = ?usage.completion_tokens,
                "Evaluator usage"
            );
        }
        let text = body
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();
        let elapsed = start.elapsed();
        info!(?elapsed, response_len = text.len(), "Evaluator response received");

        parse_model_json(&text)
    }
}

#[async_trait::async_trait]
impl Evaluator for AiExaminer {
    #[instrument(level = "info", skip_all, fields(transcript_len = transcript.len()))]
    async fn evaluate_speaking(
        &self,
        question: &str,
        transcript: &str,
    ) -> Result<SpeakingFeedback, PortalError> {
        let user = fill_template(
            &self.prompts.speaking_user,
            &[("question", question), ("transcript", transcript)],
        );
        self.chat_json(&self.prompts.speaking_system, &user).await
    }

    #[instrument(level = "info", skip_all, fields(essay_len = essay.len()))]
    async fn evaluate_writing(
        &self,
        task_type: WritingTaskType,
        question: &str,
        essay: &str,
    ) -> Result<WritingFeedback, PortalError> {
        let task_name = match task_type {
            WritingTaskType::Task1 => "Task 1",
            WritingTaskType::Task2 => "Task 2",
        };
        let min_words = task_type.min_words().to_string();
        let user = fill_template(
            &self.prompts.writing_user,
            &[
                ("task_type", task_name),
                ("min_words", &min_words),
                ("question", question),
                ("essay", essay),
            ],
        );
        self.chat_json(&self.prompts.writing_system, &user).await
    }
}

/// Replace `{name}` placeholders in a prompt template.
fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{}}}", name), value);
    }
    out
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessageReq>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessageReq {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    r#type: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResp,
}

#[derive(Deserialize)]
struct ChatMessageResp {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: Option<u32>,
    #[serde(default)]
    completion_tokens: Option<u32>,
}

/// Try to extract a clean error message from an API error body.
fn extract_model_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct EWrap {
        error: EObj,
    }
    #[derive(Deserialize)]
    struct EObj {
        message: String,
    }
    serde_json::from_str::<EWrap>(body)
        .ok()
        .map(|w| w.error.message)
}
