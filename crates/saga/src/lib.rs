//! Saga coordination over the event store.
//!
//! Two coordination styles are provided:
//! - [`SagaOrchestrator`]: a central driver that runs steps in order and
//!   compensates completed steps in reverse when one fails.
//! - [`SagaChoreographer`]: a reactive coordinator that advances a
//!   persisted saga instance as integration events arrive, keyed by
//!   correlation ID.
//!
//! Both styles persist saga progress as an event-sourced [`SagaInstance`],
//! so a coordinator restart can resume from the recorded history.

pub mod choreography;
pub mod error;
pub mod events;
pub mod instance;
pub mod orchestrator;
pub mod state;

pub use choreography::{
    ChoreographyHandler, CompensationHandler, SAGA_NAMESPACE, SagaChoreographer, saga_id_for,
};
pub use error::{SagaError, StepError};
pub use events::SagaEvent;
pub use instance::SagaInstance;
pub use orchestrator::{SagaContext, SagaOrchestrator, SagaStep};
pub use state::SagaState;
