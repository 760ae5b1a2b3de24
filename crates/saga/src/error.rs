use common::AggregateId;
use domain::DomainError;
use event_store::EventStoreError;
use thiserror::Error;

/// Error returned by an individual saga step or compensation.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct StepError(String);

impl StepError {
    /// Creates a step error from any displayable cause.
    pub fn new(cause: impl std::fmt::Display) -> Self {
        Self(cause.to_string())
    }
}

impl From<DomainError> for StepError {
    fn from(e: DomainError) -> Self {
        Self(e.to_string())
    }
}

/// Errors from saga coordination.
#[derive(Debug, Error)]
pub enum SagaError {
    #[error("event store error: {0}")]
    EventStore(#[from] EventStoreError),

    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A forward step failed and compensation ran.
    ///
    /// `compensation_incomplete` is set when at least one compensation
    /// failed, leaving external state that needs manual cleanup.
    #[error("saga {saga_id} failed at step '{step_name}': {reason}")]
    StepFailed {
        saga_id: AggregateId,
        step_name: String,
        reason: String,
        compensation_incomplete: bool,
    },

    /// The saga definition has no steps.
    #[error("saga '{0}' has no steps defined")]
    NoSteps(String),
}
