use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{
    AggregateId, EventEnvelope, EventQuery, EventStoreError, GlobalPosition, Result,
    SequencedEvent, Version,
};

/// Options for appending events to the store.
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Expected version of the aggregate for optimistic concurrency control.
    /// If None, no version check is performed (use with caution).
    pub expected_version: Option<Version>,
}

impl AppendOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the aggregate to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting the aggregate to not exist (new aggregate).
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// A lazy, restartable stream over the store-wide log.
///
/// Items carry the commit-time `GlobalPosition` so a consumer can persist
/// its cursor and resume after the last position it processed.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<SequencedEvent>> + Send>>;

/// Core trait for event store implementations.
///
/// An event store persists immutable events in per-aggregate streams. All
/// implementations must serialize appends per aggregate (the engine's only
/// mandatory mutual-exclusion boundary) while allowing different aggregates
/// to append in parallel, and must be thread-safe (Send + Sync).
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends events to the store.
    ///
    /// The batch is atomic: either every event is durably committed with
    /// contiguous versions, or none are. If `options.expected_version` is
    /// set, the operation fails with `ConcurrencyConflict` when the
    /// aggregate's current version doesn't match. A successful append is
    /// immediately visible to both the per-aggregate and the all-events
    /// reads.
    ///
    /// Returns the new version of the aggregate after appending.
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version>;

    /// Retrieves all events for a specific aggregate.
    ///
    /// Events are returned in version order (oldest first).
    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>>;

    /// Retrieves all events for an aggregate starting from a specific version.
    async fn get_events_for_aggregate_from_version(
        &self,
        aggregate_id: AggregateId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>>;

    /// Retrieves events matching a query.
    ///
    /// Used by out-of-band readers (consistency checks); per-aggregate
    /// logic reads its own stream instead.
    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>>;

    /// Streams every event committed after the given global position, in
    /// commit order across all aggregates.
    async fn stream_all_events_from(&self, after: GlobalPosition) -> Result<EventStream>;

    /// Gets the current version of an aggregate.
    ///
    /// Returns None if the aggregate doesn't exist.
    async fn get_aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>>;
}

/// Extension trait providing convenience methods for event stores.
#[async_trait]
pub trait EventStoreExt: EventStore {
    /// Appends a single event to the store.
    async fn append_event(&self, event: EventEnvelope, options: AppendOptions) -> Result<Version> {
        self.append(vec![event], options).await
    }

    /// Checks if an aggregate exists (has any events).
    async fn aggregate_exists(&self, aggregate_id: AggregateId) -> Result<bool> {
        Ok(self.get_aggregate_version(aggregate_id).await?.is_some())
    }
}

// Blanket implementation for all EventStore implementations
impl<T: EventStore + ?Sized> EventStoreExt for T {}

/// Validates a batch of events before appending.
///
/// The batch must be non-empty, target a single aggregate, and carry
/// contiguous versions.
pub fn validate_events_for_append(events: &[EventEnvelope]) -> Result<()> {
    let first = events
        .first()
        .ok_or_else(|| EventStoreError::InvalidBatch("empty event batch".to_string()))?;

    for event in events.iter().skip(1) {
        if event.aggregate_id != first.aggregate_id {
            return Err(EventStoreError::InvalidBatch(
                "all events in a batch must target the same aggregate".to_string(),
            ));
        }
        if event.aggregate_type != first.aggregate_type {
            return Err(EventStoreError::InvalidBatch(
                "all events in a batch must share the aggregate type".to_string(),
            ));
        }
    }

    let mut expected = first.version;
    for event in events.iter().skip(1) {
        expected = expected.next();
        if event.version != expected {
            return Err(EventStoreError::InvalidBatch(format!(
                "event versions must be contiguous: expected {}, got {}",
                expected, event.version
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(aggregate_id: AggregateId, version: Version) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(aggregate_id)
            .aggregate_type("TestAggregate")
            .event_type("TestEvent")
            .version(version)
            .payload_raw(serde_json::json!({}))
            .build()
    }

    #[test]
    fn empty_batch_is_rejected() {
        let result = validate_events_for_append(&[]);
        assert!(matches!(result, Err(EventStoreError::InvalidBatch(_))));
    }

    #[test]
    fn mixed_aggregates_are_rejected() {
        let batch = vec![
            event(AggregateId::new(), Version::new(1)),
            event(AggregateId::new(), Version::new(2)),
        ];
        assert!(matches!(
            validate_events_for_append(&batch),
            Err(EventStoreError::InvalidBatch(_))
        ));
    }

    #[test]
    fn version_gap_is_rejected() {
        let id = AggregateId::new();
        let batch = vec![event(id, Version::new(1)), event(id, Version::new(3))];
        assert!(matches!(
            validate_events_for_append(&batch),
            Err(EventStoreError::InvalidBatch(_))
        ));
    }

    #[test]
    fn contiguous_batch_is_accepted() {
        let id = AggregateId::new();
        let batch = vec![
            event(id, Version::new(1)),
            event(id, Version::new(2)),
            event(id, Version::new(3)),
        ];
        assert!(validate_events_for_append(&batch).is_ok());
    }
}
