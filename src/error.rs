use thiserror::Error;

/// Session lifecycle violations: an operation was invoked in a phase that
/// does not allow it. These never mutate the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session has already started")]
    AlreadyStarted,

    #[error("session has no active prompt")]
    NotActive,

    #[error("preparation is only available on the cue card")]
    PreparationNotAllowed,

    #[error("preparation has already been used for this cue card")]
    PreparationAlreadyStarted,

    #[error("a recording is already in progress")]
    AlreadyRecording,

    #[error("no recording is in progress")]
    NotRecording,
}

/// Failures surfaced to clients, by kind.
///
/// Every fallible operation in the portal resolves to one of these; the HTTP
/// layer maps kinds to status codes in one place.
#[derive(Debug, Error)]
pub enum PortalError {
    /// The recording device could not be acquired (busy, or access denied).
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The blob store rejected or failed an upload.
    #[error("upload failure: {0}")]
    UploadFailure(String),

    /// The AI evaluator is unreachable, unconfigured, or returned an
    /// unusable response.
    #[error("evaluator failure: {0}")]
    EvaluatorFailure(String),

    /// The submission was rejected before any network call was made.
    #[error("validation failure: {0}")]
    ValidationFailure(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid admin pin")]
    Unauthorized,

    #[error("internal error: {0}")]
    Internal(String),
}

impl PortalError {
    /// Stable machine-readable name for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            PortalError::DeviceUnavailable(_) => "device_unavailable",
            PortalError::UploadFailure(_) => "upload_failure",
            PortalError::EvaluatorFailure(_) => "evaluator_failure",
            PortalError::ValidationFailure(_) => "validation_failure",
            PortalError::Session(_) => "invalid_transition",
            PortalError::NotFound(_) => "not_found",
            PortalError::Unauthorized => "unauthorized",
            PortalError::Internal(_) => "internal",
        }
    }
}
