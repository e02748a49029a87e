use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::audio::Microphone;
use crate::config::Config;
use crate::content::ContentStore;
use crate::examiner::Evaluator;
use crate::pipeline::SubmissionPipeline;
use crate::session::{GuidedSession, Narrator};
use crate::storage::BlobStore;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Active guided sessions (session_id → session)
    pub sessions: Arc<RwLock<HashMap<String, Arc<GuidedSession>>>>,
    pub content: Arc<ContentStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub pipeline: Arc<SubmissionPipeline>,
    pub microphone: Arc<dyn Microphone>,
    pub narrator: Arc<dyn Narrator>,
}

impl AppState {
    pub fn new(
        config: Config,
        microphone: Arc<dyn Microphone>,
        narrator: Arc<dyn Narrator>,
        blobs: Arc<dyn BlobStore>,
        evaluator: Option<Arc<dyn Evaluator>>,
    ) -> Self {
        let content = Arc::new(ContentStore::new());
        let pipeline = Arc::new(SubmissionPipeline::new(
            Arc::clone(&blobs),
            evaluator,
            Arc::clone(&content),
        ));
        Self {
            config: Arc::new(config),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            content,
            blobs,
            pipeline,
            microphone,
            narrator,
        }
    }
}
