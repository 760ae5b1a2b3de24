//! Choreographed saga coordination.
//!
//! Instead of a central driver, participants publish integration events
//! and the choreographer reacts to them, advancing a persisted
//! [`SagaInstance`] keyed by correlation ID. Any node observing the same
//! events converges on the same saga stream.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{AggregateId, CorrelationId};
use domain::Aggregate;
use event_store::EventStore;
use messaging::{
    DEFAULT_RESULT_TTL, EventHandler, IdempotencyStore, IntegrationEvent, ProcessingError,
};
use uuid::Uuid;

use crate::error::{SagaError, StepError};
use crate::events::SagaEvent;
use crate::instance::SagaInstance;
use crate::orchestrator::{append_saga_event, load_saga};

/// Namespace for deriving saga instance IDs from correlation IDs.
pub const SAGA_NAMESPACE: Uuid = Uuid::from_u128(0x4f9a_1c52_7d3e_4b8a_9c0d_2e6f_8a1b_3c5d);

/// Derives the saga instance ID for a correlation ID.
///
/// Deterministic: every node handling events of the same execution
/// resolves the same saga stream without coordination.
pub fn saga_id_for(correlation_id: CorrelationId) -> AggregateId {
    AggregateId::from_uuid(Uuid::new_v5(
        &SAGA_NAMESPACE,
        correlation_id.as_uuid().as_bytes(),
    ))
}

/// Reaction to one integration event type within a choreographed saga.
///
/// Receives the saga as it stands (already started) and the triggering
/// event, and returns the saga events to record. Returning an empty list
/// leaves the saga unchanged.
#[async_trait]
pub trait ChoreographyHandler: Send + Sync {
    async fn handle(
        &self,
        saga: &SagaInstance,
        event: &IntegrationEvent,
    ) -> Result<Vec<SagaEvent>, StepError>;
}

/// Undoes one recorded step of a choreographed saga.
///
/// Invoked with the output the step captured when it completed. Steps
/// without a registered compensation are treated as having nothing to
/// undo.
#[async_trait]
pub trait CompensationHandler: Send + Sync {
    async fn compensate(
        &self,
        saga: &SagaInstance,
        output: &serde_json::Value,
    ) -> Result<(), StepError>;
}

/// Advances persisted saga instances as integration events arrive.
pub struct SagaChoreographer<S: EventStore> {
    store: S,
    saga_type: String,
    idempotency: Arc<dyn IdempotencyStore>,
    handlers: HashMap<String, Arc<dyn ChoreographyHandler>>,
    compensations: HashMap<String, Arc<dyn CompensationHandler>>,
}

impl<S: EventStore> SagaChoreographer<S> {
    /// Creates a new choreographer.
    pub fn new(
        store: S,
        saga_type: impl Into<String>,
        idempotency: Arc<dyn IdempotencyStore>,
    ) -> Self {
        Self {
            store,
            saga_type: saga_type.into(),
            idempotency,
            handlers: HashMap::new(),
            compensations: HashMap::new(),
        }
    }

    /// Registers a reaction for an integration event type.
    pub fn register_handler(
        mut self,
        event_type: impl Into<String>,
        handler: Arc<dyn ChoreographyHandler>,
    ) -> Self {
        self.handlers.insert(event_type.into(), handler);
        self
    }

    /// Registers a compensation for a recorded step name.
    pub fn register_compensation(
        mut self,
        step_name: impl Into<String>,
        handler: Arc<dyn CompensationHandler>,
    ) -> Self {
        self.compensations.insert(step_name.into(), handler);
        self
    }

    /// Handles one integration event.
    ///
    /// Duplicate deliveries (same event ID) and events arriving after the
    /// saga reached a terminal state are ignored. Events without a
    /// correlation ID cannot be routed to a saga and are dropped.
    ///
    /// Returns the saga instance after the event was applied, or None if
    /// the event was dropped.
    #[tracing::instrument(skip(self, event), fields(event_id = %event.id, event_type = %event.event_type))]
    pub async fn handle_event(
        &self,
        event: &IntegrationEvent,
    ) -> Result<Option<SagaInstance>, SagaError> {
        let Some(correlation_id) = event.correlation_id else {
            tracing::warn!("integration event has no correlation id, dropping");
            metrics::counter!("choreography_events_dropped").increment(1);
            return Ok(None);
        };

        if self
            .idempotency
            .has_processed(event.id)
            .await
            .map_err(|e| SagaError::StepFailed {
                saga_id: saga_id_for(correlation_id),
                step_name: event.event_type.clone(),
                reason: e.to_string(),
                compensation_incomplete: false,
            })?
        {
            tracing::debug!("duplicate delivery, skipping");
            metrics::counter!("choreography_duplicates_skipped").increment(1);
            return Ok(None);
        }

        let Some(handler) = self.handlers.get(&event.event_type) else {
            tracing::warn!("no reaction registered for event type, dropping");
            metrics::counter!("choreography_events_dropped").increment(1);
            return Ok(None);
        };

        let saga_id = saga_id_for(correlation_id);
        let mut saga = load_saga(&self.store, saga_id).await?.unwrap_or_default();

        if saga.is_terminal() {
            tracing::debug!(%saga_id, state = %saga.state(), "saga already terminal, ignoring event");
            self.mark_processed(event, &saga).await;
            return Ok(Some(saga));
        }

        let mut version = saga.version();

        // First event for this correlation starts the saga.
        if saga.id().is_none() {
            let started = SagaEvent::saga_started(saga_id, &self.saga_type, correlation_id);
            version = append_saga_event(&self.store, saga_id, version, correlation_id, &started)
                .await?;
            saga.apply(started);
            saga.set_version(version);
        }

        let reactions = match handler.handle(&saga, event).await {
            Ok(reactions) => reactions,
            Err(error) => {
                // Mirror the orchestrator: record the failure, undo what
                // already completed in reverse, surface the original error.
                let failed = SagaEvent::step_failed(&event.event_type, error.to_string());
                version = append_saga_event(&self.store, saga_id, version, correlation_id, &failed)
                    .await?;
                saga.apply(failed);
                saga.set_version(version);

                let compensation_incomplete = self
                    .compensate(&mut saga, saga_id, version, correlation_id, &event.event_type)
                    .await?;

                metrics::counter!("saga_failed").increment(1);
                self.mark_processed(event, &saga).await;

                return Err(SagaError::StepFailed {
                    saga_id,
                    step_name: event.event_type.clone(),
                    reason: error.to_string(),
                    compensation_incomplete,
                });
            }
        };

        for saga_event in reactions {
            version =
                append_saga_event(&self.store, saga_id, version, correlation_id, &saga_event)
                    .await?;
            saga.apply(saga_event);
            saga.set_version(version);
        }

        self.mark_processed(event, &saga).await;
        Ok(Some(saga))
    }

    /// Compensates the saga's recorded steps in reverse order.
    ///
    /// A failed compensation is recorded and the chain continues; the
    /// return value reports whether any compensation failed.
    async fn compensate(
        &self,
        saga: &mut SagaInstance,
        saga_id: AggregateId,
        mut version: event_store::Version,
        correlation_id: CorrelationId,
        failed_step: &str,
    ) -> Result<bool, SagaError> {
        let started = SagaEvent::compensation_started(failed_step);
        version = append_saga_event(&self.store, saga_id, version, correlation_id, &started).await?;
        saga.apply(started);
        saga.set_version(version);

        let completed: Vec<(String, serde_json::Value)> = saga.completed_steps().to_vec();
        let mut incomplete = false;

        for (step_name, output) in completed.iter().rev() {
            let event = match self.compensations.get(step_name) {
                Some(handler) => match handler.compensate(saga, output).await {
                    Ok(()) => SagaEvent::compensation_step_completed(step_name.as_str()),
                    Err(error) => {
                        tracing::error!(
                            step = step_name.as_str(),
                            %error,
                            "compensation failed, continuing with remaining steps"
                        );
                        incomplete = true;
                        SagaEvent::compensation_step_failed(step_name.as_str(), error.to_string())
                    }
                },
                // No compensation registered: nothing to undo for this step.
                None => SagaEvent::compensation_step_completed(step_name.as_str()),
            };
            version = append_saga_event(&self.store, saga_id, version, correlation_id, &event)
                .await?;
            saga.apply(event);
            saga.set_version(version);
        }

        let failed = SagaEvent::saga_failed(format!("step '{failed_step}' failed"));
        version = append_saga_event(&self.store, saga_id, version, correlation_id, &failed).await?;
        saga.apply(failed);
        saga.set_version(version);

        tracing::warn!(%saga_id, failed_step, incomplete, "choreographed saga failed");
        Ok(incomplete)
    }

    /// Loads a saga instance for a correlation ID.
    pub async fn get_saga(
        &self,
        correlation_id: CorrelationId,
    ) -> Result<Option<SagaInstance>, SagaError> {
        load_saga(&self.store, saga_id_for(correlation_id)).await
    }

    async fn mark_processed(&self, event: &IntegrationEvent, saga: &SagaInstance) {
        let result = serde_json::json!({
            "saga_state": saga.state().as_str(),
        });
        if let Err(error) = self
            .idempotency
            .mark_processed(event.id, result, DEFAULT_RESULT_TTL)
            .await
        {
            // The event was applied; a lost idempotency record only risks
            // one duplicate replay, which terminal/version checks absorb.
            tracing::warn!(%error, "failed to record idempotency marker");
        }
    }
}

/// Lets a choreographer consume events from a
/// [`messaging::VersionRouter`] or [`messaging::RetryingDispatcher`].
///
/// A duplicate delivery returns the outcome recorded when the event was
/// first processed, not the saga's current state.
#[async_trait]
impl<S: EventStore> EventHandler for SagaChoreographer<S> {
    async fn handle(
        &self,
        event: IntegrationEvent,
    ) -> Result<serde_json::Value, ProcessingError> {
        if let Some(cached) = self.idempotency.get_result(event.id).await? {
            tracing::debug!(event_id = %event.id, "duplicate delivery, returning cached result");
            return Ok(cached);
        }

        match self.handle_event(&event).await {
            Ok(Some(saga)) => Ok(serde_json::json!({"saga_state": saga.state().as_str()})),
            Ok(None) => Ok(serde_json::Value::Null),
            // A version conflict means another node advanced the saga
            // concurrently; redelivery will observe the new version.
            Err(SagaError::EventStore(e @ event_store::EventStoreError::ConcurrencyConflict { .. })) => {
                Err(ProcessingError::transient(e))
            }
            Err(e) => Err(ProcessingError::permanent(e)),
        }
    }
}
