pub mod audio;
pub mod config;
pub mod content;
pub mod error;
pub mod examiner;
pub mod http;
pub mod pipeline;
pub mod script;
pub mod session;
pub mod storage;
pub mod telemetry;

pub use audio::{
    AudioFrame, Capture, CaptureSpec, ChannelMicrophone, DeviceError, Microphone,
    RecordingArtifact,
};
pub use config::Config;
pub use content::ContentStore;
pub use error::{PortalError, SessionError};
pub use examiner::{AiExaminer, Evaluator, SpeakingFeedback, WritingFeedback};
pub use http::{create_router, AppState};
pub use pipeline::SubmissionPipeline;
pub use script::{PromptScript, PromptSlot, SessionTiming, SlotKind};
pub use session::{
    GuidedSession, LoggingNarrator, Narrator, Phase, SessionMachine, SessionView, TickOutcome,
};
pub use storage::{BlobStore, HostedBucket, MemoryBucket, StoredObject};
