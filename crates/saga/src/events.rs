//! Saga domain events.

use chrono::{DateTime, Utc};
use common::{AggregateId, CorrelationId};
use domain::DomainEvent;
use serde::{Deserialize, Serialize};

/// Events that can occur during saga execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SagaEvent {
    /// Saga execution started.
    SagaStarted(SagaStartedData),

    /// A saga step started execution.
    StepStarted(StepData),

    /// A saga step completed successfully, capturing its output.
    StepCompleted(StepCompletedData),

    /// A saga step failed.
    StepFailed(StepFailedData),

    /// Compensation started after a step failure.
    CompensationStarted(CompensationData),

    /// A compensation step completed successfully.
    CompensationStepCompleted(StepData),

    /// A compensation step failed (logged, compensation continues).
    CompensationStepFailed(StepFailedData),

    /// Saga completed successfully.
    SagaCompleted(SagaCompletedData),

    /// Saga failed after compensation.
    SagaFailed(SagaFailedData),
}

impl DomainEvent for SagaEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SagaEvent::SagaStarted(_) => "SagaStarted",
            SagaEvent::StepStarted(_) => "StepStarted",
            SagaEvent::StepCompleted(_) => "StepCompleted",
            SagaEvent::StepFailed(_) => "StepFailed",
            SagaEvent::CompensationStarted(_) => "CompensationStarted",
            SagaEvent::CompensationStepCompleted(_) => "CompensationStepCompleted",
            SagaEvent::CompensationStepFailed(_) => "CompensationStepFailed",
            SagaEvent::SagaCompleted(_) => "SagaCompleted",
            SagaEvent::SagaFailed(_) => "SagaFailed",
        }
    }
}

/// Data for SagaStarted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaStartedData {
    /// The saga instance ID.
    pub saga_id: AggregateId,
    /// The type of saga (e.g., "order-fulfillment").
    pub saga_type: String,
    /// Correlation ID shared by all events of this execution.
    pub correlation_id: CorrelationId,
    /// When the saga started.
    pub started_at: DateTime<Utc>,
}

/// Data for step started and compensation-step-completed events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepData {
    /// The step name.
    pub step_name: String,
}

/// Data for StepCompleted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepCompletedData {
    /// The step name.
    pub step_name: String,
    /// Output captured for later steps and for compensation.
    pub output: serde_json::Value,
}

/// Data for StepFailed and CompensationStepFailed events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepFailedData {
    /// The step that failed.
    pub step_name: String,
    /// Error message describing the failure.
    pub error: String,
}

/// Data for CompensationStarted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompensationData {
    /// The step that triggered compensation.
    pub from_step: String,
}

/// Data for SagaCompleted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaCompletedData {
    /// When the saga completed.
    pub completed_at: DateTime<Utc>,
}

/// Data for SagaFailed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaFailedData {
    /// Reason for failure.
    pub reason: String,
    /// When the saga failed.
    pub failed_at: DateTime<Utc>,
}

// Convenience constructors
impl SagaEvent {
    /// Creates a SagaStarted event.
    pub fn saga_started(
        saga_id: AggregateId,
        saga_type: impl Into<String>,
        correlation_id: CorrelationId,
    ) -> Self {
        SagaEvent::SagaStarted(SagaStartedData {
            saga_id,
            saga_type: saga_type.into(),
            correlation_id,
            started_at: Utc::now(),
        })
    }

    /// Creates a StepStarted event.
    pub fn step_started(step_name: impl Into<String>) -> Self {
        SagaEvent::StepStarted(StepData {
            step_name: step_name.into(),
        })
    }

    /// Creates a StepCompleted event.
    pub fn step_completed(step_name: impl Into<String>, output: serde_json::Value) -> Self {
        SagaEvent::StepCompleted(StepCompletedData {
            step_name: step_name.into(),
            output,
        })
    }

    /// Creates a StepFailed event.
    pub fn step_failed(step_name: impl Into<String>, error: impl Into<String>) -> Self {
        SagaEvent::StepFailed(StepFailedData {
            step_name: step_name.into(),
            error: error.into(),
        })
    }

    /// Creates a CompensationStarted event.
    pub fn compensation_started(from_step: impl Into<String>) -> Self {
        SagaEvent::CompensationStarted(CompensationData {
            from_step: from_step.into(),
        })
    }

    /// Creates a CompensationStepCompleted event.
    pub fn compensation_step_completed(step_name: impl Into<String>) -> Self {
        SagaEvent::CompensationStepCompleted(StepData {
            step_name: step_name.into(),
        })
    }

    /// Creates a CompensationStepFailed event.
    pub fn compensation_step_failed(
        step_name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        SagaEvent::CompensationStepFailed(StepFailedData {
            step_name: step_name.into(),
            error: error.into(),
        })
    }

    /// Creates a SagaCompleted event.
    pub fn saga_completed() -> Self {
        SagaEvent::SagaCompleted(SagaCompletedData {
            completed_at: Utc::now(),
        })
    }

    /// Creates a SagaFailed event.
    pub fn saga_failed(reason: impl Into<String>) -> Self {
        SagaEvent::SagaFailed(SagaFailedData {
            reason: reason.into(),
            failed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type() {
        let saga_id = AggregateId::new();
        let correlation_id = CorrelationId::new();

        assert_eq!(
            SagaEvent::saga_started(saga_id, "order-fulfillment", correlation_id).event_type(),
            "SagaStarted"
        );
        assert_eq!(
            SagaEvent::step_started("reserve-inventory").event_type(),
            "StepStarted"
        );
        assert_eq!(
            SagaEvent::step_completed("reserve-inventory", serde_json::json!({"id": "RES-1"}))
                .event_type(),
            "StepCompleted"
        );
        assert_eq!(
            SagaEvent::step_failed("charge-payment", "insufficient funds").event_type(),
            "StepFailed"
        );
        assert_eq!(
            SagaEvent::compensation_started("charge-payment").event_type(),
            "CompensationStarted"
        );
        assert_eq!(SagaEvent::saga_completed().event_type(), "SagaCompleted");
        assert_eq!(
            SagaEvent::saga_failed("step failed").event_type(),
            "SagaFailed"
        );
    }

    #[test]
    fn test_serialization_roundtrip() {
        let saga_id = AggregateId::new();
        let correlation_id = CorrelationId::new();

        let events = vec![
            SagaEvent::saga_started(saga_id, "order-fulfillment", correlation_id),
            SagaEvent::step_started("reserve-inventory"),
            SagaEvent::step_completed("reserve-inventory", serde_json::json!({"id": "RES-1"})),
            SagaEvent::step_failed("charge-payment", "insufficient funds"),
            SagaEvent::compensation_started("charge-payment"),
            SagaEvent::compensation_step_completed("reserve-inventory"),
            SagaEvent::compensation_step_failed("reserve-inventory", "timeout"),
            SagaEvent::saga_completed(),
            SagaEvent::saga_failed("payment failed"),
        ];

        for event in events {
            let json = serde_json::to_string(&event).unwrap();
            let deserialized: SagaEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(event.event_type(), deserialized.event_type());
        }
    }

    #[test]
    fn test_step_completed_output() {
        let event = SagaEvent::step_completed("charge-payment", serde_json::json!({"id": "PAY-1"}));

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: SagaEvent = serde_json::from_str(&json).unwrap();

        if let SagaEvent::StepCompleted(data) = deserialized {
            assert_eq!(data.step_name, "charge-payment");
            assert_eq!(data.output["id"], "PAY-1");
        } else {
            panic!("Expected StepCompleted event");
        }
    }
}
