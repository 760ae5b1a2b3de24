//! Order aggregate implementation.

use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::{
    Money, OrderError, OrderEvent, OrderState,
    events::{OrderCancelledData, OrderCreatedData, OrderPaidData, OrderShippedData},
};

/// Order aggregate root.
///
/// Represents an order from creation through payment to shipment or
/// cancellation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    id: Option<AggregateId>,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    /// Current state of the order.
    state: OrderState,

    /// Total amount of the order.
    total: Money,

    /// Payment that settled the order, once paid.
    payment_id: Option<AggregateId>,

    /// Tracking number, once shipped.
    tracking_number: Option<String>,

    /// Cancellation reason, if cancelled.
    cancellation_reason: Option<String>,
}

impl Aggregate for Order {
    type Event = OrderEvent;
    type Error = OrderError;

    fn aggregate_type() -> &'static str {
        "Order"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            OrderEvent::OrderCreated(data) => self.apply_order_created(data),
            OrderEvent::OrderPaid(data) => self.apply_order_paid(data),
            OrderEvent::OrderShipped(data) => self.apply_order_shipped(data),
            OrderEvent::OrderCancelled(data) => self.apply_order_cancelled(data),
        }
    }
}

// Query methods
impl Order {
    /// Returns the current state.
    pub fn state(&self) -> OrderState {
        self.state
    }

    /// Returns the total amount.
    pub fn total(&self) -> Money {
        self.total
    }

    /// Returns the payment that settled the order, if any.
    pub fn payment_id(&self) -> Option<AggregateId> {
        self.payment_id
    }

    /// Returns the tracking number, if shipped.
    pub fn tracking_number(&self) -> Option<&str> {
        self.tracking_number.as_deref()
    }

    /// Returns the cancellation reason, if cancelled.
    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    /// Returns true if the order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

// Command methods (return events)
impl Order {
    /// Creates a new order with the given total.
    pub fn create(
        &self,
        order_id: AggregateId,
        total: Money,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_some() {
            return Err(OrderError::AlreadyCreated);
        }

        if !total.is_positive() {
            return Err(OrderError::InvalidTotal {
                cents: total.cents(),
            });
        }

        Ok(vec![OrderEvent::order_created(order_id, total)])
    }

    /// Marks the order as paid.
    pub fn mark_paid(&self, payment_id: AggregateId) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_none() {
            return Err(OrderError::NotFound);
        }

        if !self.state.can_mark_paid() {
            return Err(OrderError::InvalidStateTransition {
                current_state: self.state,
                action: "mark paid",
            });
        }

        Ok(vec![OrderEvent::order_paid(payment_id)])
    }

    /// Ships the order.
    pub fn ship(&self, tracking_number: impl Into<String>) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_none() {
            return Err(OrderError::NotFound);
        }

        if !self.state.can_ship() {
            return Err(OrderError::InvalidStateTransition {
                current_state: self.state,
                action: "ship",
            });
        }

        Ok(vec![OrderEvent::order_shipped(tracking_number)])
    }

    /// Cancels the order.
    pub fn cancel(&self, reason: impl Into<String>) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_none() {
            return Err(OrderError::NotFound);
        }

        if !self.state.can_cancel() {
            return Err(OrderError::InvalidStateTransition {
                current_state: self.state,
                action: "cancel",
            });
        }

        Ok(vec![OrderEvent::order_cancelled(reason)])
    }
}

// Apply event helpers
impl Order {
    fn apply_order_created(&mut self, data: OrderCreatedData) {
        self.id = Some(data.order_id);
        self.total = data.total;
        self.state = OrderState::Created;
    }

    fn apply_order_paid(&mut self, data: OrderPaidData) {
        self.payment_id = Some(data.payment_id);
        self.state = OrderState::Paid;
    }

    fn apply_order_shipped(&mut self, data: OrderShippedData) {
        self.tracking_number = Some(data.tracking_number);
        self.state = OrderState::Shipped;
    }

    fn apply_order_cancelled(&mut self, data: OrderCancelledData) {
        self.cancellation_reason = Some(data.reason);
        self.state = OrderState::Cancelled;
    }
}
