use event_store::EventStoreError;
use thiserror::Error;

use crate::order::OrderError;
use crate::payment::PaymentError;

/// Errors from the domain layer.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("event store error: {0}")]
    EventStore(#[from] EventStoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("order error: {0}")]
    Order(#[from] OrderError),

    #[error("payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Command rejected by aggregate validation.
    #[error("command rejected: {0}")]
    Rejected(String),
}

impl DomainError {
    /// Whether a retry of the same command could succeed.
    ///
    /// Concurrency conflicts are transient: the caller reloads and retries.
    /// Validation rejections are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. })
        )
    }
}
