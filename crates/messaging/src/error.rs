use thiserror::Error;

/// Errors from processing an integration event.
///
/// The distinction drives retry behavior: transient failures are retried
/// with backoff, permanent failures go straight to the dead-letter queue.
#[derive(Debug, Clone, Error)]
pub enum ProcessingError {
    /// A retry of the same event may succeed (timeouts, contention).
    #[error("transient processing failure: {0}")]
    Transient(String),

    /// No retry will ever succeed (malformed payload, business rejection).
    #[error("permanent processing failure: {0}")]
    Permanent(String),
}

impl ProcessingError {
    /// Creates a transient error from any displayable cause.
    pub fn transient(cause: impl std::fmt::Display) -> Self {
        ProcessingError::Transient(cause.to_string())
    }

    /// Creates a permanent error from any displayable cause.
    pub fn permanent(cause: impl std::fmt::Display) -> Self {
        ProcessingError::Permanent(cause.to_string())
    }

    /// Returns true if a retry could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProcessingError::Transient(_))
    }
}
