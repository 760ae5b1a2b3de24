//! Publishing integration events.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::ProcessingError;
use crate::integration::IntegrationEvent;

/// Outbound port for integration events.
///
/// Implementations deliver events to whatever transport the deployment
/// uses; the in-memory implementation delivers to subscribers in-process.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes an event.
    async fn publish(&self, event: IntegrationEvent) -> Result<(), ProcessingError>;
}

/// In-memory publisher that records published events.
///
/// Used in tests and as the transport for in-process choreography.
#[derive(Clone, Default)]
pub struct InMemoryPublisher {
    published: Arc<RwLock<Vec<IntegrationEvent>>>,
}

impl InMemoryPublisher {
    /// Creates a new empty publisher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all events published so far.
    pub async fn published(&self) -> Vec<IntegrationEvent> {
        self.published.read().await.clone()
    }

    /// Returns the number of events published.
    pub async fn len(&self) -> usize {
        self.published.read().await.len()
    }

    /// Returns true if nothing has been published.
    pub async fn is_empty(&self) -> bool {
        self.published.read().await.is_empty()
    }
}

#[async_trait]
impl EventPublisher for InMemoryPublisher {
    async fn publish(&self, event: IntegrationEvent) -> Result<(), ProcessingError> {
        tracing::debug!(
            event_id = %event.id,
            event_type = %event.event_type,
            "publishing integration event"
        );
        metrics::counter!("events_published").increment(1);
        self.published.write().await.push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_published_events() {
        let publisher = InMemoryPublisher::new();
        assert!(publisher.is_empty().await);

        let event = IntegrationEvent::builder()
            .event_type("OrderPaid")
            .source("Order")
            .payload_raw(serde_json::json!({}))
            .build();
        publisher.publish(event.clone()).await.unwrap();

        assert_eq!(publisher.len().await, 1);
        assert_eq!(publisher.published().await[0].id, event.id);
    }
}
