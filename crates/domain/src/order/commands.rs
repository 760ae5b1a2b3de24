//! Order commands.

use common::AggregateId;

use super::Money;

/// Command to create a new order.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    /// The order ID to create.
    pub order_id: AggregateId,

    /// Total amount of the order.
    pub total: Money,
}

impl CreateOrder {
    /// Creates a new CreateOrder command.
    pub fn new(order_id: AggregateId, total: Money) -> Self {
        Self { order_id, total }
    }

    /// Creates a new CreateOrder command with a generated order ID.
    pub fn with_total(total: Money) -> Self {
        Self {
            order_id: AggregateId::new(),
            total,
        }
    }
}

/// Command to mark an order as paid.
#[derive(Debug, Clone)]
pub struct MarkPaid {
    /// The order to mark as paid.
    pub order_id: AggregateId,

    /// The payment that settled the order.
    pub payment_id: AggregateId,
}

impl MarkPaid {
    /// Creates a new MarkPaid command.
    pub fn new(order_id: AggregateId, payment_id: AggregateId) -> Self {
        Self {
            order_id,
            payment_id,
        }
    }
}

/// Command to ship an order.
#[derive(Debug, Clone)]
pub struct ShipOrder {
    /// The order to ship.
    pub order_id: AggregateId,

    /// Shipment tracking number.
    pub tracking_number: String,
}

impl ShipOrder {
    /// Creates a new ShipOrder command.
    pub fn new(order_id: AggregateId, tracking_number: impl Into<String>) -> Self {
        Self {
            order_id,
            tracking_number: tracking_number.into(),
        }
    }
}

/// Command to cancel an order.
#[derive(Debug, Clone)]
pub struct CancelOrder {
    /// The order to cancel.
    pub order_id: AggregateId,

    /// Reason for cancellation.
    pub reason: String,
}

impl CancelOrder {
    /// Creates a new CancelOrder command.
    pub fn new(order_id: AggregateId, reason: impl Into<String>) -> Self {
        Self {
            order_id,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_order_command() {
        let order_id = AggregateId::new();
        let cmd = CreateOrder::new(order_id, Money::from_cents(2500));
        assert_eq!(cmd.order_id, order_id);
        assert_eq!(cmd.total.cents(), 2500);
    }

    #[test]
    fn test_ship_order_command() {
        let order_id = AggregateId::new();
        let cmd = ShipOrder::new(order_id, "TRACK-001");
        assert_eq!(cmd.order_id, order_id);
        assert_eq!(cmd.tracking_number, "TRACK-001");
    }

    #[test]
    fn test_cancel_order_command() {
        let order_id = AggregateId::new();
        let cmd = CancelOrder::new(order_id, "Customer request");
        assert_eq!(cmd.reason, "Customer request");
    }
}
