//! Order state machine.

use serde::{Deserialize, Serialize};

/// The state of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Created ──► Paid ──► Shipped
///    │          │
///    └──────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
    /// Order has been created, awaiting payment.
    #[default]
    Created,

    /// Payment has been confirmed.
    Paid,

    /// Order has been shipped (terminal state).
    Shipped,

    /// Order was cancelled (terminal state).
    Cancelled,
}

impl OrderState {
    /// Returns true if the order can be marked paid in this state.
    pub fn can_mark_paid(&self) -> bool {
        matches!(self, OrderState::Created)
    }

    /// Returns true if the order can be shipped in this state.
    pub fn can_ship(&self) -> bool {
        matches!(self, OrderState::Paid)
    }

    /// Returns true if the order can be cancelled in this state.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderState::Created | OrderState::Paid)
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Shipped | OrderState::Cancelled)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Created => "created",
            OrderState::Paid => "paid",
            OrderState::Shipped => "shipped",
            OrderState::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
