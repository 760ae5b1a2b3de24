//! Idempotent consumption of integration events.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use event_store::EventId;
use tokio::sync::RwLock;

use crate::error::ProcessingError;

/// How long processed-event results are retained by default.
pub const DEFAULT_RESULT_TTL: Duration = Duration::hours(24);

/// Store tracking which events have already been processed.
///
/// Handlers record their result AFTER executing, so a crash between
/// execution and `mark_processed` can replay the handler once. Consumers
/// that cannot tolerate that must make the handler itself idempotent.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Returns true if the event has been processed and its record has not
    /// expired.
    async fn has_processed(&self, event_id: EventId) -> Result<bool, ProcessingError>;

    /// Records the result of processing an event, retained for `ttl`.
    async fn mark_processed(
        &self,
        event_id: EventId,
        result: serde_json::Value,
        ttl: Duration,
    ) -> Result<(), ProcessingError>;

    /// Returns the recorded result for an event, if present and unexpired.
    async fn get_result(&self, event_id: EventId)
    -> Result<Option<serde_json::Value>, ProcessingError>;
}

#[derive(Debug, Clone)]
struct ProcessedRecord {
    result: serde_json::Value,
    expires_at: DateTime<Utc>,
}

/// In-memory idempotency store.
///
/// Expired records are dropped lazily on access and can be swept with
/// [`InMemoryIdempotencyStore::purge_expired`].
#[derive(Clone, Default)]
pub struct InMemoryIdempotencyStore {
    records: Arc<RwLock<HashMap<EventId, ProcessedRecord>>>,
}

impl InMemoryIdempotencyStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes all expired records, returning how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| record.expires_at > now);
        before - records.len()
    }

    /// Returns the number of live records.
    pub async fn len(&self) -> usize {
        let now = Utc::now();
        self.records
            .read()
            .await
            .values()
            .filter(|r| r.expires_at > now)
            .count()
    }

    /// Returns true if there are no live records.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn has_processed(&self, event_id: EventId) -> Result<bool, ProcessingError> {
        let records = self.records.read().await;
        Ok(records
            .get(&event_id)
            .is_some_and(|record| record.expires_at > Utc::now()))
    }

    async fn mark_processed(
        &self,
        event_id: EventId,
        result: serde_json::Value,
        ttl: Duration,
    ) -> Result<(), ProcessingError> {
        let mut records = self.records.write().await;
        records.insert(
            event_id,
            ProcessedRecord {
                result,
                expires_at: Utc::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get_result(
        &self,
        event_id: EventId,
    ) -> Result<Option<serde_json::Value>, ProcessingError> {
        let records = self.records.read().await;
        Ok(records
            .get(&event_id)
            .filter(|record| record.expires_at > Utc::now())
            .map(|record| record.result.clone()))
    }
}

/// Runs `handler` for the event unless it has already been processed.
///
/// Returns the cached result on a duplicate without invoking the handler.
/// On first delivery the handler runs, then the result is recorded with
/// [`DEFAULT_RESULT_TTL`].
pub async fn process_once<S, F, Fut>(
    store: &S,
    event_id: EventId,
    handler: F,
) -> Result<serde_json::Value, ProcessingError>
where
    S: IdempotencyStore,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<serde_json::Value, ProcessingError>>,
{
    if let Some(result) = store.get_result(event_id).await? {
        tracing::debug!(%event_id, "duplicate delivery, returning cached result");
        metrics::counter!("idempotency_duplicates_skipped").increment(1);
        return Ok(result);
    }

    let result = handler().await?;
    store
        .mark_processed(event_id, result.clone(), DEFAULT_RESULT_TTL)
        .await?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn mark_and_check() {
        let store = InMemoryIdempotencyStore::new();
        let event_id = EventId::new();

        assert!(!store.has_processed(event_id).await.unwrap());

        store
            .mark_processed(event_id, serde_json::json!({"ok": true}), Duration::hours(1))
            .await
            .unwrap();

        assert!(store.has_processed(event_id).await.unwrap());
        assert_eq!(
            store.get_result(event_id).await.unwrap(),
            Some(serde_json::json!({"ok": true}))
        );
    }

    #[tokio::test]
    async fn expired_records_are_not_processed() {
        let store = InMemoryIdempotencyStore::new();
        let event_id = EventId::new();

        store
            .mark_processed(
                event_id,
                serde_json::json!(null),
                Duration::seconds(-1), // already expired
            )
            .await
            .unwrap();

        assert!(!store.has_processed(event_id).await.unwrap());
        assert_eq!(store.get_result(event_id).await.unwrap(), None);

        assert_eq!(store.purge_expired().await, 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn process_once_skips_duplicate_deliveries() {
        let store = InMemoryIdempotencyStore::new();
        let event_id = EventId::new();
        let calls = AtomicUsize::new(0);

        let run = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(serde_json::json!({"charge_id": "ch-1"}))
        };

        let first = process_once(&store, event_id, run).await.unwrap();
        let second = process_once(&store, event_id, run).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn process_once_does_not_record_failures() {
        let store = InMemoryIdempotencyStore::new();
        let event_id = EventId::new();

        let result = process_once(&store, event_id, || async {
            Err(ProcessingError::transient("downstream unavailable"))
        })
        .await;

        assert!(result.is_err());
        assert!(!store.has_processed(event_id).await.unwrap());
    }
}
