//! Shared identifier types for the saga coordination engine.

pub mod types;

pub use types::{AggregateId, CausationId, CorrelationId};
