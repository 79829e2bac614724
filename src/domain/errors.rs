//! Domain errors for the medtriage engine.

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors that can occur in the triage engine.
///
/// The taxonomy follows the degradation policy of the engine: provider and
/// parse failures are recovered internally wherever a turn can proceed in a
/// degraded form; only validation and session-identity errors are surfaced
/// to the caller as request failures.
#[derive(Debug, Error)]
pub enum TriageError {
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Session {0} is already complete")]
    SessionComplete(Uuid),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Vector index is empty")]
    EmptyIndex,

    #[error("Embedding provider failed: {0}")]
    Embedding(String),

    #[error("Generation provider failed: {0}")]
    Generation(String),

    #[error("Failed to parse structured model output: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type DomainResult<T> = Result<T, TriageError>;

impl TriageError {
    /// True for errors that identify a bad request on the session boundary
    /// (unknown or completed session, malformed input). These are the only
    /// errors a single `submit_message` call surfaces to the caller.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            TriageError::SessionNotFound(_)
                | TriageError::SessionComplete(_)
                | TriageError::Validation(_)
        )
    }
}

impl From<serde_json::Error> for TriageError {
    fn from(err: serde_json::Error) -> Self {
        TriageError::Parse(err.to_string())
    }
}
