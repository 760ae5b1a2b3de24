//! Orchestrated saga execution.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{AggregateId, CorrelationId};
use domain::{Aggregate, DomainEvent};
use event_store::{AppendOptions, EventEnvelope, EventStore, Version};

use crate::error::{SagaError, StepError};
use crate::events::SagaEvent;
use crate::instance::SagaInstance;

/// Context shared across a saga execution.
///
/// Carries the correlation ID and the outputs of completed steps, so
/// later steps and compensations can use what earlier steps produced.
#[derive(Debug, Clone)]
pub struct SagaContext {
    correlation_id: CorrelationId,
    outputs: HashMap<String, serde_json::Value>,
}

impl SagaContext {
    fn new(correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            outputs: HashMap::new(),
        }
    }

    /// Returns the correlation ID of this execution.
    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    /// Returns the output of a completed step, if any.
    pub fn output(&self, step_name: &str) -> Option<&serde_json::Value> {
        self.outputs.get(step_name)
    }

    fn record(&mut self, step_name: &str, output: serde_json::Value) {
        self.outputs.insert(step_name.to_string(), output);
    }
}

/// One step of an orchestrated saga.
///
/// `compensate` undoes the effect of a successful `execute`; it is only
/// called for steps that completed, using the context captured at the
/// time of failure (including this step's own output).
#[async_trait]
pub trait SagaStep: Send + Sync {
    /// The step name, used in saga events and logs.
    fn name(&self) -> &str;

    /// Performs the step, returning its output.
    async fn execute(&self, ctx: &SagaContext) -> Result<serde_json::Value, StepError>;

    /// Undoes a completed step. Defaults to a no-op.
    async fn compensate(&self, _ctx: &SagaContext) -> Result<(), StepError> {
        Ok(())
    }
}

/// Drives a saga's steps in order, compensating in reverse on failure.
///
/// Progress is event-sourced to the store as a [`SagaInstance`] stream,
/// one event per transition, so the recorded history always reflects how
/// far the saga got.
pub struct SagaOrchestrator<S: EventStore> {
    store: S,
    saga_type: String,
    steps: Vec<Arc<dyn SagaStep>>,
}

impl<S: EventStore> SagaOrchestrator<S> {
    /// Creates a new orchestrator for the given saga type.
    pub fn new(store: S, saga_type: impl Into<String>) -> Self {
        Self {
            store,
            saga_type: saga_type.into(),
            steps: Vec::new(),
        }
    }

    /// Appends a step to the saga definition.
    pub fn add_step(mut self, step: Arc<dyn SagaStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Executes the saga, compensating completed steps if one fails.
    ///
    /// On success returns the saga instance ID. On a step failure,
    /// compensation runs in reverse order of completed steps and the
    /// returned [`SagaError::StepFailed`] reports whether every
    /// compensation succeeded.
    #[tracing::instrument(skip(self), fields(saga_type = %self.saga_type))]
    pub async fn run(&self, correlation_id: CorrelationId) -> Result<AggregateId, SagaError> {
        if self.steps.is_empty() {
            return Err(SagaError::NoSteps(self.saga_type.clone()));
        }

        metrics::counter!("saga_executions_total").increment(1);
        let saga_start = std::time::Instant::now();

        let saga_id = AggregateId::new();
        let mut version = Version::initial();
        let mut ctx = SagaContext::new(correlation_id);
        let mut completed: Vec<Arc<dyn SagaStep>> = Vec::new();

        let started = SagaEvent::saga_started(saga_id, &self.saga_type, correlation_id);
        version = self
            .append_saga_event(saga_id, version, correlation_id, &started)
            .await?;

        for step in &self.steps {
            tracing::info!(step = step.name(), "saga step started");
            let step_started = SagaEvent::step_started(step.name());
            version = self
                .append_saga_event(saga_id, version, correlation_id, &step_started)
                .await?;

            match step.execute(&ctx).await {
                Ok(output) => {
                    ctx.record(step.name(), output.clone());
                    completed.push(step.clone());

                    let step_completed = SagaEvent::step_completed(step.name(), output);
                    version = self
                        .append_saga_event(saga_id, version, correlation_id, &step_completed)
                        .await?;
                }
                Err(error) => {
                    let step_failed = SagaEvent::step_failed(step.name(), error.to_string());
                    version = self
                        .append_saga_event(saga_id, version, correlation_id, &step_failed)
                        .await?;

                    let compensation_incomplete = self
                        .compensate(saga_id, &mut version, correlation_id, &ctx, &completed, step.name())
                        .await?;

                    metrics::histogram!("saga_duration_seconds")
                        .record(saga_start.elapsed().as_secs_f64());
                    metrics::counter!("saga_failed").increment(1);

                    return Err(SagaError::StepFailed {
                        saga_id,
                        step_name: step.name().to_string(),
                        reason: error.to_string(),
                        compensation_incomplete,
                    });
                }
            }
        }

        let completed_event = SagaEvent::saga_completed();
        self.append_saga_event(saga_id, version, correlation_id, &completed_event)
            .await?;

        let duration = saga_start.elapsed().as_secs_f64();
        metrics::histogram!("saga_duration_seconds").record(duration);
        metrics::counter!("saga_completed").increment(1);
        tracing::info!(%saga_id, duration, "saga completed successfully");

        Ok(saga_id)
    }

    /// Runs compensations in reverse order of completed steps.
    ///
    /// A failed compensation is recorded and the chain continues; the
    /// return value reports whether any compensation failed.
    #[tracing::instrument(skip_all, fields(%saga_id, failed_step))]
    async fn compensate(
        &self,
        saga_id: AggregateId,
        version: &mut Version,
        correlation_id: CorrelationId,
        ctx: &SagaContext,
        completed: &[Arc<dyn SagaStep>],
        failed_step: &str,
    ) -> Result<bool, SagaError> {
        let comp_started = SagaEvent::compensation_started(failed_step);
        *version = self
            .append_saga_event(saga_id, *version, correlation_id, &comp_started)
            .await?;

        let mut incomplete = false;
        for step in completed.iter().rev() {
            let event = match step.compensate(ctx).await {
                Ok(()) => SagaEvent::compensation_step_completed(step.name()),
                Err(error) => {
                    tracing::error!(
                        step = step.name(),
                        %error,
                        "compensation failed, continuing with remaining steps"
                    );
                    incomplete = true;
                    SagaEvent::compensation_step_failed(step.name(), error.to_string())
                }
            };
            *version = self
                .append_saga_event(saga_id, *version, correlation_id, &event)
                .await?;
        }

        let failed_event = SagaEvent::saga_failed(format!("step '{failed_step}' failed"));
        *version = self
            .append_saga_event(saga_id, *version, correlation_id, &failed_event)
            .await?;

        tracing::warn!(%saga_id, failed_step, incomplete, "saga failed");
        Ok(incomplete)
    }

    /// Loads a saga instance by ID from the event store.
    pub async fn get_saga(&self, saga_id: AggregateId) -> Result<Option<SagaInstance>, SagaError> {
        load_saga(&self.store, saga_id).await
    }

    async fn append_saga_event(
        &self,
        saga_id: AggregateId,
        current_version: Version,
        correlation_id: CorrelationId,
        event: &SagaEvent,
    ) -> Result<Version, SagaError> {
        append_saga_event(&self.store, saga_id, current_version, correlation_id, event).await
    }
}

/// Replays a saga instance from its event stream.
pub(crate) async fn load_saga<S: EventStore>(
    store: &S,
    saga_id: AggregateId,
) -> Result<Option<SagaInstance>, SagaError> {
    let events = store.get_events_for_aggregate(saga_id).await?;

    if events.is_empty() {
        return Ok(None);
    }

    let mut saga = SagaInstance::default();
    for envelope in events {
        let version = envelope.version;
        let event: SagaEvent = serde_json::from_value(envelope.payload)?;
        saga.apply(event);
        saga.set_version(version);
    }
    Ok(Some(saga))
}

/// Appends a single saga event with optimistic concurrency.
pub(crate) async fn append_saga_event<S: EventStore>(
    store: &S,
    saga_id: AggregateId,
    current_version: Version,
    correlation_id: CorrelationId,
    event: &SagaEvent,
) -> Result<Version, SagaError> {
    let next_version = current_version.next();

    let envelope = EventEnvelope::builder()
        .event_type(event.event_type())
        .aggregate_id(saga_id)
        .aggregate_type(SagaInstance::aggregate_type())
        .version(next_version)
        .payload(event)?
        .correlation_id(correlation_id)
        .build();

    let new_version = store
        .append(
            vec![envelope],
            AppendOptions::expect_version(current_version),
        )
        .await?;

    Ok(new_version)
}
