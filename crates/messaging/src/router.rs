//! Schema-version routing for integration events.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ProcessingError;
use crate::integration::IntegrationEvent;

/// Handler for integration events of one type and schema version.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Processes the event, returning its result as JSON.
    async fn handle(&self, event: IntegrationEvent)
    -> Result<serde_json::Value, ProcessingError>;
}

/// Payload transform upgrading one schema version to the next.
pub type Transform =
    Arc<dyn Fn(serde_json::Value) -> Result<serde_json::Value, ProcessingError> + Send + Sync>;

/// Routes integration events to handlers by event type and schema version.
///
/// Dispatch resolves in this order:
/// 1. A handler registered for the event's exact (type, version) pair.
/// 2. The highest registered version for the type, reached by applying the
///    single-step transforms from the event's version upward.
/// 3. No handler for the type at all: the event is dropped with a warning.
#[derive(Default)]
pub struct VersionRouter {
    handlers: HashMap<String, BTreeMap<u32, Arc<dyn EventHandler>>>,
    transforms: HashMap<(String, u32), Transform>,
}

impl VersionRouter {
    /// Creates an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for an event type at a schema version.
    ///
    /// Registering the same (type, version) twice replaces the handler.
    pub fn register(
        &mut self,
        event_type: impl Into<String>,
        schema_version: u32,
        handler: Arc<dyn EventHandler>,
    ) {
        self.handlers
            .entry(event_type.into())
            .or_default()
            .insert(schema_version, handler);
    }

    /// Registers a transform that upgrades payloads from `from_version` to
    /// `from_version + 1`.
    pub fn register_transform<F>(
        &mut self,
        event_type: impl Into<String>,
        from_version: u32,
        transform: F,
    ) where
        F: Fn(serde_json::Value) -> Result<serde_json::Value, ProcessingError>
            + Send
            + Sync
            + 'static,
    {
        self.transforms
            .insert((event_type.into(), from_version), Arc::new(transform));
    }

    /// Returns true if any handler is registered for the event type.
    pub fn handles(&self, event_type: &str) -> bool {
        self.handlers.contains_key(event_type)
    }

    /// Dispatches an event to the appropriate handler.
    ///
    /// Events of an unregistered type are dropped (Ok(None)) so one
    /// service's new event types don't break existing consumers.
    #[tracing::instrument(skip(self, event), fields(event_type = %event.event_type, schema_version = event.schema_version))]
    pub async fn dispatch(
        &self,
        event: IntegrationEvent,
    ) -> Result<Option<serde_json::Value>, ProcessingError> {
        let Some(versions) = self.handlers.get(&event.event_type) else {
            tracing::warn!(
                event_type = %event.event_type,
                "no handler registered for event type, dropping"
            );
            metrics::counter!("router_events_dropped").increment(1);
            return Ok(None);
        };

        // Exact version match first.
        if let Some(handler) = versions.get(&event.schema_version) {
            let result = handler.handle(event).await?;
            return Ok(Some(result));
        }

        // Upcast toward the highest registered version.
        let (&target_version, handler) =
            versions
                .last_key_value()
                .ok_or_else(|| ProcessingError::Permanent(format!(
                    "no versions registered for event type {}",
                    event.event_type
                )))?;

        if event.schema_version > target_version {
            return Err(ProcessingError::Permanent(format!(
                "event {} v{} is newer than highest registered handler v{}",
                event.event_type, event.schema_version, target_version
            )));
        }

        let upcasted = self.upcast(event, target_version)?;
        let result = handler.handle(upcasted).await?;
        Ok(Some(result))
    }

    /// Applies single-step transforms until the event reaches `target_version`.
    fn upcast(
        &self,
        mut event: IntegrationEvent,
        target_version: u32,
    ) -> Result<IntegrationEvent, ProcessingError> {
        while event.schema_version < target_version {
            let key = (event.event_type.clone(), event.schema_version);
            let transform = self.transforms.get(&key).ok_or_else(|| {
                ProcessingError::Permanent(format!(
                    "no transform from {} v{} to v{}",
                    event.event_type,
                    event.schema_version,
                    event.schema_version + 1
                ))
            })?;

            event.payload = transform(event.payload)?;
            event.schema_version += 1;
            metrics::counter!("router_events_upcasted").increment(1);
        }
        Ok(event)
    }
}
