//! Order aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod service;
mod state;
mod value_objects;

pub use aggregate::Order;
pub use commands::{CancelOrder, CreateOrder, MarkPaid, ShipOrder};
pub use events::{
    OrderCancelledData, OrderCreatedData, OrderEvent, OrderPaidData, OrderShippedData,
};
pub use service::OrderService;
pub use state::OrderState;
pub use value_objects::Money;

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order is not in the expected state.
    #[error("Invalid state transition: cannot {action} from {current_state} state")]
    InvalidStateTransition {
        current_state: OrderState,
        action: &'static str,
    },

    /// Order total must be positive.
    #[error("Invalid total: {cents} cents (must be greater than 0)")]
    InvalidTotal { cents: i64 },

    /// Order is already created.
    #[error("Order already created")]
    AlreadyCreated,

    /// Order does not exist yet.
    #[error("Order not found")]
    NotFound,
}
