//! Command handling infrastructure: the replay-based aggregate rebuilder
//! plus the validate-then-append cycle.

use std::marker::PhantomData;

use common::AggregateId;
use event_store::{AppendOptions, EventEnvelope, EventStore, Version};
use serde::Serialize;

use crate::aggregate::{Aggregate, DomainEvent};
use crate::error::DomainError;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate after applying the new events.
    pub aggregate: A,

    /// The events that were generated and persisted.
    pub events: Vec<A::Event>,

    /// The new version of the aggregate after the command.
    pub new_version: Version,
}

/// Handler for executing commands against aggregates.
///
/// The handler is responsible for:
/// 1. Rebuilding the aggregate by folding its event stream
/// 2. Executing the command against the rebuilt state to produce events
/// 3. Appending the events with the rebuilt version as the optimistic check
///
/// A `ConcurrencyConflict` from step 3 propagates to the caller, which
/// retries the whole cycle from a fresh read; the handler never re-appends.
pub struct CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    store: S,
    _phantom: PhantomData<A>,
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    /// Creates a new command handler with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    /// Returns a reference to the underlying event store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Rebuilds an aggregate by replaying its event stream.
    ///
    /// If the aggregate doesn't exist, returns a default instance at
    /// version 0. Payloads that no longer deserialize into `A::Event`
    /// (event types this build does not know) are skipped with a warning
    /// rather than failing the replay, so old streams stay readable across
    /// rolling deploys; the tracked version still advances past them.
    pub async fn load(&self, aggregate_id: AggregateId) -> Result<A, DomainError>
    where
        A::Event: for<'de> serde::Deserialize<'de>,
    {
        let events = self.store.get_events_for_aggregate(aggregate_id).await?;

        let mut aggregate = A::default();
        for envelope in events {
            match serde_json::from_value::<A::Event>(envelope.payload) {
                Ok(event) => aggregate.apply(event),
                Err(error) => {
                    tracing::warn!(
                        %aggregate_id,
                        event_type = %envelope.event_type,
                        version = %envelope.version,
                        %error,
                        "skipping unknown event type during replay"
                    );
                    metrics::counter!("aggregate_replay_unknown_events").increment(1);
                }
            }
            aggregate.set_version(envelope.version);
        }

        Ok(aggregate)
    }

    /// Rebuilds an aggregate, returning None if it doesn't exist.
    pub async fn load_existing(&self, aggregate_id: AggregateId) -> Result<Option<A>, DomainError>
    where
        A::Event: for<'de> serde::Deserialize<'de>,
    {
        let aggregate = self.load(aggregate_id).await?;
        if aggregate.id().is_some() {
            Ok(Some(aggregate))
        } else {
            Ok(None)
        }
    }

    /// Executes a command and persists the resulting events.
    ///
    /// The command function receives the rebuilt aggregate state and returns
    /// either a list of events to apply, or a validation error that
    /// surfaces synchronously to the caller with no retry.
    pub async fn execute<F>(
        &self,
        aggregate_id: AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        A::Event: for<'de> serde::Deserialize<'de> + Serialize,
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let mut aggregate = self.load(aggregate_id).await?;
        let current_version = aggregate.version();

        let events = command_fn(&aggregate)?;

        if events.is_empty() {
            return Ok(CommandResult {
                aggregate,
                events: vec![],
                new_version: current_version,
            });
        }

        let envelopes = self.build_envelopes(aggregate_id, current_version, &events)?;

        // Optimistic concurrency: the rebuilt version is the expected one.
        let options = if current_version == Version::initial() {
            AppendOptions::expect_new()
        } else {
            AppendOptions::expect_version(current_version)
        };

        let new_version = self.store.append(envelopes, options).await?;

        for event in &events {
            aggregate.apply(event.clone());
        }
        aggregate.set_version(new_version);

        Ok(CommandResult {
            aggregate,
            events,
            new_version,
        })
    }

    /// Builds event envelopes from domain events.
    fn build_envelopes(
        &self,
        aggregate_id: AggregateId,
        current_version: Version,
        events: &[A::Event],
    ) -> Result<Vec<EventEnvelope>, DomainError>
    where
        A::Event: Serialize,
    {
        let mut envelopes = Vec::with_capacity(events.len());
        let mut version = current_version;

        for event in events {
            version = version.next();
            let envelope = EventEnvelope::builder()
                .aggregate_id(aggregate_id)
                .aggregate_type(A::aggregate_type())
                .event_type(event.event_type())
                .version(version)
                .payload(event)?
                .build();
            envelopes.push(envelope);
        }

        Ok(envelopes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_store::InMemoryEventStore;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    enum TestEvent {
        Created { name: String },
        Updated { value: i32 },
    }

    impl DomainEvent for TestEvent {
        fn event_type(&self) -> &'static str {
            match self {
                TestEvent::Created { .. } => "TestCreated",
                TestEvent::Updated { .. } => "TestUpdated",
            }
        }
    }

    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    struct TestAggregate {
        id: Option<AggregateId>,
        name: String,
        value: i32,
        version: Version,
    }

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error("invalid value: {0}")]
        InvalidValue(i32),
    }

    impl Aggregate for TestAggregate {
        type Event = TestEvent;
        type Error = TestError;

        fn aggregate_type() -> &'static str {
            "TestAggregate"
        }

        fn id(&self) -> Option<AggregateId> {
            self.id
        }

        fn version(&self) -> Version {
            self.version
        }

        fn set_version(&mut self, version: Version) {
            self.version = version;
        }

        fn apply(&mut self, event: Self::Event) {
            match event {
                TestEvent::Created { name } => {
                    if self.id.is_none() {
                        self.id = Some(AggregateId::new());
                    }
                    self.name = name;
                }
                TestEvent::Updated { value } => {
                    self.value = value;
                }
            }
        }
    }

    impl From<TestError> for DomainError {
        fn from(e: TestError) -> Self {
            DomainError::Rejected(e.to_string())
        }
    }

    #[tokio::test]
    async fn execute_creates_aggregate() {
        let store = InMemoryEventStore::new();
        let handler: CommandHandler<_, TestAggregate> = CommandHandler::new(store);
        let aggregate_id = AggregateId::new();

        let result = handler
            .execute(aggregate_id, |_agg| {
                Ok(vec![TestEvent::Created {
                    name: "Test".to_string(),
                }])
            })
            .await
            .unwrap();

        assert_eq!(result.events.len(), 1);
        assert_eq!(result.new_version, Version::first());
        assert!(result.aggregate.id().is_some());
        assert_eq!(result.aggregate.name, "Test");
    }

    #[tokio::test]
    async fn execute_advances_version() {
        let store = InMemoryEventStore::new();
        let handler: CommandHandler<_, TestAggregate> = CommandHandler::new(store);
        let aggregate_id = AggregateId::new();

        handler
            .execute(aggregate_id, |_| {
                Ok(vec![TestEvent::Created {
                    name: "Test".to_string(),
                }])
            })
            .await
            .unwrap();

        let result = handler
            .execute(aggregate_id, |_| Ok(vec![TestEvent::Updated { value: 42 }]))
            .await
            .unwrap();

        assert_eq!(result.new_version, Version::new(2));
        assert_eq!(result.aggregate.value, 42);
    }

    #[tokio::test]
    async fn validation_error_propagates_without_persisting() {
        let store = InMemoryEventStore::new();
        let handler: CommandHandler<_, TestAggregate> = CommandHandler::new(store.clone());
        let aggregate_id = AggregateId::new();

        let result = handler
            .execute(aggregate_id, |_| Err(TestError::InvalidValue(-1)))
            .await;

        assert!(matches!(result, Err(DomainError::Rejected(_))));
        assert_eq!(store.event_count().await, 0);
    }

    #[tokio::test]
    async fn load_existing_returns_none_for_new() {
        let store = InMemoryEventStore::new();
        let handler: CommandHandler<_, TestAggregate> = CommandHandler::new(store);

        let result = handler.load_existing(AggregateId::new()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn unknown_event_types_are_skipped_with_version_advance() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        // Version 1 is a known event; version 2 was written by a newer build.
        let known = EventEnvelope::builder()
            .aggregate_id(aggregate_id)
            .aggregate_type("TestAggregate")
            .event_type("TestCreated")
            .version(Version::first())
            .payload(&TestEvent::Created {
                name: "Test".to_string(),
            })
            .unwrap()
            .build();
        let unknown = EventEnvelope::builder()
            .aggregate_id(aggregate_id)
            .aggregate_type("TestAggregate")
            .event_type("TestArchived")
            .version(Version::new(2))
            .payload_raw(serde_json::json!({"type": "Archived", "data": {}}))
            .build();
        store
            .append(vec![known, unknown], AppendOptions::expect_new())
            .await
            .unwrap();

        let handler: CommandHandler<_, TestAggregate> = CommandHandler::new(store);
        let aggregate = handler.load(aggregate_id).await.unwrap();

        assert_eq!(aggregate.name, "Test");
        assert_eq!(aggregate.version(), Version::new(2));
    }

    #[tokio::test]
    async fn empty_events_returns_without_persisting() {
        let store = InMemoryEventStore::new();
        let handler: CommandHandler<_, TestAggregate> = CommandHandler::new(store.clone());
        let aggregate_id = AggregateId::new();

        let result = handler.execute(aggregate_id, |_| Ok(vec![])).await.unwrap();

        assert!(result.events.is_empty());
        assert_eq!(result.new_version, Version::initial());
        assert_eq!(store.event_count().await, 0);
    }
}
