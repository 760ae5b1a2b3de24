use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, EventEnvelope, EventQuery, EventStoreError, GlobalPosition, Result,
    SequencedEvent, Version,
    store::{AppendOptions, EventStore, EventStream, validate_events_for_append},
};

#[derive(Debug, Default)]
struct Log {
    events: Vec<SequencedEvent>,
    next_position: GlobalPosition,
}

impl Log {
    fn current_version(&self, aggregate_id: AggregateId) -> Version {
        self.events
            .iter()
            .filter(|e| e.event.aggregate_id == aggregate_id)
            .map(|e| e.event.version)
            .max()
            .unwrap_or(Version::initial())
    }
}

/// In-memory event store.
///
/// Holds the whole log behind one write lock, which trivially serializes
/// appends (per aggregate and otherwise) and makes each batch atomic. Used
/// in tests and as the reference implementation of the store contract;
/// a durable backend needs a unique `(aggregate_id, version)` constraint
/// and an auto-increment global sequence to provide the same guarantees.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    log: Arc<RwLock<Log>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.log.read().await.events.len()
    }

    /// Returns the position of the most recently committed event.
    pub async fn last_position(&self) -> GlobalPosition {
        self.log.read().await.next_position
    }

    /// Clears all events.
    pub async fn clear(&self) {
        let mut log = self.log.write().await;
        log.events.clear();
        log.next_position = GlobalPosition::start();
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_events_for_append(&events)?;

        let first = &events[0];
        let aggregate_id = first.aggregate_id;
        let first_version = first.version;

        let mut log = self.log.write().await;
        let current_version = log.current_version(aggregate_id);

        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual: current_version,
            });
        }

        // Gap-free invariant: the batch must continue the stream exactly
        // where it currently ends, even without an explicit version check.
        if first_version != current_version.next() {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: options.expected_version.unwrap_or(current_version),
                actual: current_version,
            });
        }

        let mut last_version = current_version;
        for event in events {
            let position = log.next_position.next();
            log.next_position = position;
            last_version = event.version;
            log.events.push(SequencedEvent { position, event });
        }

        metrics::counter!("event_store_events_appended").increment(1);

        Ok(last_version)
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        self.get_events_for_aggregate_from_version(aggregate_id, Version::first())
            .await
    }

    async fn get_events_for_aggregate_from_version(
        &self,
        aggregate_id: AggregateId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>> {
        let log = self.log.read().await;
        let mut events: Vec<_> = log
            .events
            .iter()
            .filter(|e| e.event.aggregate_id == aggregate_id && e.event.version >= from_version)
            .map(|e| e.event.clone())
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>> {
        let log = self.log.read().await;
        let mut events: Vec<_> = log
            .events
            .iter()
            .filter(|e| query.matches(&e.event))
            .collect();

        events.sort_by_key(|e| e.position);

        let events = events.into_iter().map(|e| e.event.clone());
        let events = if let Some(limit) = query.limit {
            events.take(limit).collect()
        } else {
            events.collect()
        };

        Ok(events)
    }

    async fn stream_all_events_from(&self, after: GlobalPosition) -> Result<EventStream> {
        use futures_util::stream;

        let log = self.log.read().await;
        let mut events: Vec<_> = log
            .events
            .iter()
            .filter(|e| e.position > after)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.position);

        let stream = stream::iter(events.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    async fn get_aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        let log = self.log.read().await;
        let version = log
            .events
            .iter()
            .filter(|e| e.event.aggregate_id == aggregate_id)
            .map(|e| e.event.version)
            .max();
        Ok(version)
    }
}
