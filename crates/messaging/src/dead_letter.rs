//! Retry with backoff and dead-lettering for failed event deliveries.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use event_store::EventId;
use tokio::sync::RwLock;

use crate::error::ProcessingError;
use crate::integration::IntegrationEvent;
use crate::router::VersionRouter;

/// Retry policy with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Redeliveries allowed after the initial delivery before the event
    /// is parked.
    pub max_retries: u32,

    /// Delay before the first retry.
    pub base_delay: Duration,

    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Returns the delay before the given retry attempt (0-based).
    ///
    /// Doubles per attempt, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// A failed event parked for manual inspection or redrive.
#[derive(Debug, Clone)]
pub struct DeadLetterEntry {
    /// The event that failed to process.
    pub event: IntegrationEvent,

    /// The final error, rendered as text.
    pub error: String,

    /// Retries made before parking. Zero for a permanent failure parked
    /// on first delivery.
    pub attempt_count: u32,

    /// When the event was dead-lettered.
    pub failed_at: DateTime<Utc>,
}

/// Queue of dead-lettered events.
#[async_trait]
pub trait DeadLetterQueue: Send + Sync {
    /// Parks a failed event.
    async fn push(&self, entry: DeadLetterEntry) -> Result<(), ProcessingError>;

    /// Lists all parked entries.
    async fn entries(&self) -> Result<Vec<DeadLetterEntry>, ProcessingError>;

    /// Removes and returns the entry for an event, if parked.
    async fn take(&self, event_id: EventId) -> Result<Option<DeadLetterEntry>, ProcessingError>;

    /// Returns the number of parked entries.
    async fn len(&self) -> Result<usize, ProcessingError>;
}

/// In-memory dead-letter queue.
#[derive(Clone, Default)]
pub struct InMemoryDeadLetterQueue {
    entries: Arc<RwLock<Vec<DeadLetterEntry>>>,
}

impl InMemoryDeadLetterQueue {
    /// Creates a new empty queue.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeadLetterQueue for InMemoryDeadLetterQueue {
    async fn push(&self, entry: DeadLetterEntry) -> Result<(), ProcessingError> {
        tracing::error!(
            event_id = %entry.event.id,
            event_type = %entry.event.event_type,
            retries = entry.attempt_count,
            error = %entry.error,
            "event dead-lettered"
        );
        metrics::counter!("dead_letter_events").increment(1);
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<DeadLetterEntry>, ProcessingError> {
        Ok(self.entries.read().await.clone())
    }

    async fn take(&self, event_id: EventId) -> Result<Option<DeadLetterEntry>, ProcessingError> {
        let mut entries = self.entries.write().await;
        let index = entries.iter().position(|e| e.event.id == event_id);
        Ok(index.map(|i| entries.remove(i)))
    }

    async fn len(&self) -> Result<usize, ProcessingError> {
        Ok(self.entries.read().await.len())
    }
}

/// Dispatches events through a [`VersionRouter`] with retry and
/// dead-lettering.
///
/// Transient failures are retried with exponential backoff up to the
/// policy's limit; permanent failures are parked immediately.
pub struct RetryingDispatcher {
    router: Arc<VersionRouter>,
    policy: RetryPolicy,
    dead_letters: Arc<dyn DeadLetterQueue>,
}

impl RetryingDispatcher {
    /// Creates a new dispatcher.
    pub fn new(
        router: Arc<VersionRouter>,
        policy: RetryPolicy,
        dead_letters: Arc<dyn DeadLetterQueue>,
    ) -> Self {
        Self {
            router,
            policy,
            dead_letters,
        }
    }

    /// Returns the dead-letter queue.
    pub fn dead_letters(&self) -> &Arc<dyn DeadLetterQueue> {
        &self.dead_letters
    }

    /// Dispatches an event, retrying transient failures.
    ///
    /// The initial delivery does not count against the retry budget: with
    /// `max_retries = 3` a persistently failing event is delivered four
    /// times, with three backoff delays, before it is parked.
    ///
    /// Returns the handler result, or the final error after the event has
    /// been dead-lettered.
    #[tracing::instrument(skip(self, event), fields(event_id = %event.id, event_type = %event.event_type))]
    pub async fn dispatch(
        &self,
        event: IntegrationEvent,
    ) -> Result<Option<serde_json::Value>, ProcessingError> {
        let mut retries = 0u32;

        loop {
            match self.router.dispatch(event.clone()).await {
                Ok(result) => return Ok(result),
                Err(error @ ProcessingError::Permanent(_)) => {
                    self.park(event, &error, retries).await?;
                    return Err(error);
                }
                Err(error @ ProcessingError::Transient(_)) => {
                    if retries >= self.policy.max_retries {
                        self.park(event, &error, retries).await?;
                        return Err(error);
                    }

                    let delay = self.policy.delay_for(retries);
                    retries += 1;
                    tracing::warn!(
                        retry = retries,
                        delay_ms = delay.as_millis() as u64,
                        %error,
                        "transient failure, retrying"
                    );
                    metrics::counter!("dispatch_retries").increment(1);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Takes a parked event and runs it through the full retry cycle again.
    ///
    /// Returns Ok(None) if no entry with that ID is parked.
    pub async fn redrive(
        &self,
        event_id: EventId,
    ) -> Result<Option<serde_json::Value>, ProcessingError> {
        let Some(entry) = self.dead_letters.take(event_id).await? else {
            return Ok(None);
        };

        tracing::info!(%event_id, "redriving dead-lettered event");
        self.dispatch(entry.event).await
    }

    async fn park(
        &self,
        event: IntegrationEvent,
        error: &ProcessingError,
        retries: u32,
    ) -> Result<(), ProcessingError> {
        self.dead_letters
            .push(DeadLetterEntry {
                event,
                error: error.to_string(),
                attempt_count: retries,
                failed_at: Utc::now(),
            })
            .await
    }
}
