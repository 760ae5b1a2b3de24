//! Messaging layer: integration events and the machinery around their
//! delivery.
//!
//! Aggregates publish [`IntegrationEvent`]s describing facts to the rest of
//! the system. This crate provides:
//! - Exactly-once-ish consumption via the [`IdempotencyStore`]
//! - Schema-version routing and stepwise upcasting via the [`VersionRouter`]
//! - Retry with exponential backoff and dead-lettering via the
//!   [`RetryingDispatcher`]

pub mod dead_letter;
pub mod error;
pub mod idempotency;
pub mod integration;
pub mod publisher;
pub mod router;

pub use dead_letter::{
    DeadLetterEntry, DeadLetterQueue, InMemoryDeadLetterQueue, RetryPolicy, RetryingDispatcher,
};
pub use error::ProcessingError;
pub use idempotency::{DEFAULT_RESULT_TTL, IdempotencyStore, InMemoryIdempotencyStore};
pub use integration::IntegrationEvent;
pub use publisher::{EventPublisher, InMemoryPublisher};
pub use router::{EventHandler, VersionRouter};
