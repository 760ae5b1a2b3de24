//! Append-only event store for the saga coordination engine.
//!
//! Events are ordered per aggregate by a gap-free `Version` and globally by
//! a monotonic `GlobalPosition`. Appends are atomic per batch and guarded by
//! an optimistic concurrency check on the aggregate's current version.

pub mod error;
pub mod event;
pub mod memory;
pub mod query;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{
    EventEnvelope, EventEnvelopeBuilder, EventId, GlobalPosition, SequencedEvent, Version, meta,
};
pub use memory::InMemoryEventStore;
pub use query::EventQuery;
pub use store::{AppendOptions, EventStore, EventStoreExt, EventStream};
