//! Payment state machine.

use serde::{Deserialize, Serialize};

/// The state of a payment in its lifecycle.
///
/// State transitions:
/// ```text
/// Requested ──┬──► Completed ──► Refunded
///             └──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    /// Payment has been requested, awaiting settlement.
    #[default]
    Requested,

    /// Payment settled successfully.
    Completed,

    /// Payment failed (terminal state).
    Failed,

    /// A completed payment was refunded (terminal state).
    Refunded,
}

impl PaymentState {
    /// Returns true if the payment can settle in this state.
    pub fn can_complete(&self) -> bool {
        matches!(self, PaymentState::Requested)
    }

    /// Returns true if the payment can fail in this state.
    pub fn can_fail(&self) -> bool {
        matches!(self, PaymentState::Requested)
    }

    /// Returns true if the payment can be refunded in this state.
    pub fn can_refund(&self) -> bool {
        matches!(self, PaymentState::Completed)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentState::Failed | PaymentState::Refunded)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Requested => "requested",
            PaymentState::Completed => "completed",
            PaymentState::Failed => "failed",
            PaymentState::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
