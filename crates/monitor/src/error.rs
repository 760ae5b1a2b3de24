use event_store::EventStoreError;
use thiserror::Error;

/// Errors from consistency checks.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("event store error: {0}")]
    EventStore(#[from] EventStoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("check error: {0}")]
    Check(String),
}

impl MonitorError {
    /// Creates a check error from any displayable cause.
    pub fn check(cause: impl std::fmt::Display) -> Self {
        Self::Check(cause.to_string())
    }
}
