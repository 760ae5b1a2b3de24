//! HTTP route handlers.

pub mod checks;
pub mod dead_letters;
pub mod health;
pub mod metrics;
