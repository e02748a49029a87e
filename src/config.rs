use anyhow::Result;
use serde::Deserialize;

use crate::audio::CaptureSpec;
use crate::script::SessionTiming;

/// Service configuration.
///
/// Every field has a default, so the service runs without a config file.
/// Values load from an optional TOML file and can be overridden with
/// `BANDPREP_`-prefixed environment variables (`__` separates nesting,
/// e.g. `BANDPREP_SERVICE__HTTP__PORT`). Secrets (evaluator API key,
/// storage key) are only ever read from the environment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub recording: RecordingConfig,
    pub storage: StorageConfig,
    pub evaluator: EvaluatorConfig,
    pub admin: AdminConfig,
    pub prompts: EvaluationPrompts,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Cue-card preparation countdown, in seconds.
    pub prep_secs: u64,
    /// Recording bound for the cue-card answer.
    pub cue_answer_secs: u64,
    /// Recording bound for introduction and follow-up answers.
    pub prompt_answer_secs: u64,
}

impl RecordingConfig {
    pub fn timing(&self) -> SessionTiming {
        SessionTiming {
            prep: std::time::Duration::from_secs(self.prep_secs),
            cue_answer: std::time::Duration::from_secs(self.cue_answer_secs),
            prompt_answer: std::time::Duration::from_secs(self.prompt_answer_secs),
        }
    }

    pub fn capture_spec(&self) -> CaptureSpec {
        CaptureSpec {
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Hosted storage API base, e.g. "https://xyz.supabase.co/storage/v1".
    /// Unset means the in-memory bucket.
    pub base_url: Option<String>,
    /// Environment variable holding the storage service key.
    pub service_key_env: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// OpenAI-compatible API base.
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key. No key, no evaluator.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Shared PIN for the admin surface. A shared secret, not an auth
    /// system; deployments must override the default.
    pub pin: String,
}

/// Prompt templates for the AI examiner. `{name}` placeholders are filled
/// per call.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EvaluationPrompts {
    pub speaking_system: String,
    pub speaking_user: String,
    pub writing_system: String,
    pub writing_user: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("BANDPREP").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            recording: RecordingConfig::default(),
            storage: StorageConfig::default(),
            evaluator: EvaluatorConfig::default(),
            admin: AdminConfig::default(),
            prompts: EvaluationPrompts::default(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "bandprep".to_string(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            prep_secs: 60,
            cue_answer_secs: 120,
            prompt_answer_secs: 60,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            service_key_env: "STORAGE_SERVICE_KEY".to_string(),
        }
    }
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "EVALUATOR_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            pin: "123456".to_string(),
        }
    }
}

impl Default for EvaluationPrompts {
    fn default() -> Self {
        Self {
            speaking_system: SPEAKING_SYSTEM.to_string(),
            speaking_user: SPEAKING_USER.to_string(),
            writing_system: WRITING_SYSTEM.to_string(),
            writing_user: WRITING_USER.to_string(),
        }
    }
}

const SPEAKING_SYSTEM: &str = r#"You are a certified IELTS speaking examiner. Score the candidate's answer against the official band descriptors: fluency and coherence, lexical resource, grammatical range and accuracy, and pronunciation.

Respond with a single JSON object and nothing else. No markdown, no commentary. The object must have exactly these fields:
{
  "overallBand": <number, 0-9 in 0.5 steps>,
  "fluency": <number, 0-9>,
  "lexical": <number, 0-9>,
  "grammar": <number, 0-9>,
  "pronunciation": <number, 0-9>,
  "strengths": [<2-4 short strings>],
  "improvements": [<2-4 short strings>],
  "detailedFeedback": <string, 3-5 sentences>,
  "wordCount": <number, words in the transcript>
}"#;

const SPEAKING_USER: &str = r#"Question: {question}

Candidate's transcribed answer:
{transcript}"#;

const WRITING_SYSTEM: &str = r#"You are a certified IELTS writing examiner. Score the essay against the official band descriptors: task response, coherence and cohesion, lexical resource, and grammatical range and accuracy.

Respond with a single JSON object and nothing else. No markdown, no commentary. The object must have exactly these fields:
{
  "overallBand": <number, 0-9 in 0.5 steps>,
  "taskResponse": <number, 0-9>,
  "coherence": <number, 0-9>,
  "lexical": <number, 0-9>,
  "grammar": <number, 0-9>,
  "corrections": [{"line": <number>, "error": <string>, "correction": <string>, "explanation": <string>}],
  "vocabularyUpgrades": [{"original": <string>, "upgrade": <string>, "context": <string>}],
  "improvedEssay": <string, the essay rewritten at band 8+>,
  "tips": [<3-5 short strings>]
}"#;

const WRITING_USER: &str = r#"{task_type} ({min_words} words minimum).

Prompt: {question}

Candidate's essay:
{essay}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_run_without_a_config_file() {
        let cfg = Config::default();

        assert_eq!(cfg.service.http.port, 8080);
        assert_eq!(cfg.recording.prep_secs, 60);
        assert_eq!(cfg.recording.cue_answer_secs, 120);
        assert_eq!(cfg.recording.sample_rate, 16000);
        assert_eq!(cfg.admin.pin, "123456");
        assert!(cfg.storage.base_url.is_none());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let cfg = Config::load("/nonexistent/bandprep").unwrap();
        assert_eq!(cfg.service.http.port, 8080);
        assert_eq!(cfg.evaluator.model, "gpt-4o-mini");
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bandprep.toml");
        std::fs::write(
            &path,
            r#"
[service.http]
port = 9999

[recording]
prep_secs = 5

[admin]
pin = "777777"
"#,
        )
        .unwrap();

        let cfg = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.service.http.port, 9999);
        assert_eq!(cfg.recording.prep_secs, 5);
        assert_eq!(cfg.admin.pin, "777777");
        // Untouched sections keep their defaults
        assert_eq!(cfg.recording.cue_answer_secs, 120);
        assert_eq!(cfg.service.name, "bandprep");
    }

    #[test]
    fn test_timing_and_capture_spec_derive_from_recording() {
        let recording = RecordingConfig {
            sample_rate: 44100,
            channels: 2,
            prep_secs: 30,
            cue_answer_secs: 90,
            prompt_answer_secs: 45,
        };

        let timing = recording.timing();
        assert_eq!(timing.prep.as_secs(), 30);
        assert_eq!(timing.cue_answer.as_secs(), 90);
        assert_eq!(timing.prompt_answer.as_secs(), 45);

        let spec = recording.capture_spec();
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(spec.channels, 2);
    }
}
