use tracing::info;

/// Reads prompts aloud for the candidate.
///
/// Narration is fire-and-forget: it must never block or fail a session
/// operation, and it never touches session state or timers. Speech synthesis
/// happens client-side; the default implementation just logs what would be
/// spoken.
#[async_trait::async_trait]
pub trait Narrator: Send + Sync {
    async fn speak(&self, text: &str);
}

/// Narrator that logs the prompt instead of synthesizing speech.
pub struct LoggingNarrator;

#[async_trait::async_trait]
impl Narrator for LoggingNarrator {
    async fn speak(&self, text: &str) {
        info!("Narrating prompt: {}", text);
    }
}
