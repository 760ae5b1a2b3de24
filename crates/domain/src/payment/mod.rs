//! Payment aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod service;
mod state;

pub use aggregate::Payment;
pub use commands::{CompletePayment, FailPayment, RefundPayment, RequestPayment};
pub use events::{
    PaymentCompletedData, PaymentEvent, PaymentFailedData, PaymentRefundedData,
    PaymentRequestedData,
};
pub use service::PaymentService;
pub use state::PaymentState;

use thiserror::Error;

/// Errors that can occur during payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Payment is not in the expected state.
    #[error("Invalid state transition: cannot {action} from {current_state} state")]
    InvalidStateTransition {
        current_state: PaymentState,
        action: &'static str,
    },

    /// Payment amount must be positive.
    #[error("Invalid amount: {cents} cents (must be greater than 0)")]
    InvalidAmount { cents: i64 },

    /// Payment is already requested.
    #[error("Payment already requested")]
    AlreadyRequested,

    /// Payment does not exist yet.
    #[error("Payment not found")]
    NotFound,
}
