//! Consistency monitoring for eventually consistent aggregates.
//!
//! Distributed flows leave windows where related aggregates disagree. The
//! [`ConsistencyMonitor`] runs named read-only checks on a schedule and
//! exposes the latest pass/fail map so operators can tell a window that is
//! still closing from one that never will.

pub mod checks;
pub mod error;
pub mod monitor;

pub use checks::PaidOrdersHaveCompletedPayments;
pub use error::MonitorError;
pub use monitor::{ConsistencyCheck, ConsistencyMonitor, FnCheck};
