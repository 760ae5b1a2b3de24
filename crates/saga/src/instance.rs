//! Saga instance aggregate.

use common::{AggregateId, CorrelationId};
use domain::Aggregate;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::error::SagaError;
use crate::events::SagaEvent;
use crate::state::SagaState;

/// An event-sourced saga instance.
///
/// Tracks the state of one saga execution: which steps completed, what
/// each produced, and how the run ended. A coordinator restarting after a
/// crash replays this stream to find out exactly where the saga stood.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SagaInstance {
    id: Option<AggregateId>,
    version: Version,
    saga_type: String,
    correlation_id: Option<CorrelationId>,
    state: SagaState,
    /// Completed steps in execution order, with their captured outputs.
    completed_steps: Vec<(String, serde_json::Value)>,
    /// Compensations that completed during rollback.
    compensated_steps: Vec<String>,
    /// Compensations that failed during rollback.
    failed_compensations: Vec<String>,
    /// Reason for failure, if any.
    failure_reason: Option<String>,
}

impl Aggregate for SagaInstance {
    type Event = SagaEvent;
    type Error = SagaError;

    fn aggregate_type() -> &'static str {
        "Saga"
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
            SagaEvent::SagaStarted(data) => {
                self.id = Some(data.saga_id);
                self.saga_type = data.saga_type;
                self.correlation_id = Some(data.correlation_id);
                self.state = SagaState::Running;
            }
            SagaEvent::StepStarted(_) => {}
            SagaEvent::StepCompleted(data) => {
                self.completed_steps.push((data.step_name, data.output));
            }
            SagaEvent::StepFailed(data) => {
                self.failure_reason = Some(data.error);
            }
            SagaEvent::CompensationStarted(_) => {
                self.state = SagaState::Compensating;
            }
            SagaEvent::CompensationStepCompleted(data) => {
                self.compensated_steps.push(data.step_name);
            }
            SagaEvent::CompensationStepFailed(data) => {
                // Compensation failures are recorded but don't stop the chain
                self.failed_compensations.push(data.step_name);
            }
            SagaEvent::SagaCompleted(_) => {
                self.state = SagaState::Completed;
            }
            SagaEvent::SagaFailed(data) => {
                self.state = SagaState::Failed;
                self.failure_reason = Some(data.reason);
            }
        }
    }
}

// Query methods
impl SagaInstance {
    /// Returns the saga state.
    pub fn state(&self) -> SagaState {
        self.state
    }

    /// Returns the saga type.
    pub fn saga_type(&self) -> &str {
        &self.saga_type
    }

    /// Returns the correlation ID of this execution.
    pub fn correlation_id(&self) -> Option<CorrelationId> {
        self.correlation_id
    }

    /// Returns completed steps with their outputs, in execution order.
    pub fn completed_steps(&self) -> &[(String, serde_json::Value)] {
        &self.completed_steps
    }

    /// Returns completed step names in execution order.
    pub fn completed_step_names(&self) -> Vec<&str> {
        self.completed_steps
            .iter()
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Returns the output of a completed step, if any.
    pub fn step_output(&self, step_name: &str) -> Option<&serde_json::Value> {
        self.completed_steps
            .iter()
            .find(|(name, _)| name == step_name)
            .map(|(_, output)| output)
    }

    /// Returns true if the named step has completed.
    pub fn has_completed(&self, step_name: &str) -> bool {
        self.step_output(step_name).is_some()
    }

    /// Returns compensations that completed during rollback.
    pub fn compensated_steps(&self) -> &[String] {
        &self.compensated_steps
    }

    /// Returns compensations that failed during rollback.
    pub fn failed_compensations(&self) -> &[String] {
        &self.failed_compensations
    }

    /// Returns the failure reason, if any.
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Returns true if this saga reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
