//! Order domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::Money;

/// Events that can occur on an order aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// Order was created.
    OrderCreated(OrderCreatedData),

    /// Payment for the order was confirmed.
    OrderPaid(OrderPaidData),

    /// Order was shipped.
    OrderShipped(OrderShippedData),

    /// Order was cancelled.
    OrderCancelled(OrderCancelledData),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated(_) => "OrderCreated",
            OrderEvent::OrderPaid(_) => "OrderPaid",
            OrderEvent::OrderShipped(_) => "OrderShipped",
            OrderEvent::OrderCancelled(_) => "OrderCancelled",
        }
    }
}

/// Data for OrderCreated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreatedData {
    /// The unique order ID.
    pub order_id: AggregateId,

    /// Total amount of the order.
    pub total: Money,

    /// When the order was created.
    pub created_at: DateTime<Utc>,
}

/// Data for OrderPaid event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPaidData {
    /// The payment aggregate that settled this order.
    pub payment_id: AggregateId,

    /// When payment was confirmed.
    pub paid_at: DateTime<Utc>,
}

/// Data for OrderShipped event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderShippedData {
    /// Shipment tracking number.
    pub tracking_number: String,

    /// When the order was shipped.
    pub shipped_at: DateTime<Utc>,
}

/// Data for OrderCancelled event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancelledData {
    /// Reason for cancellation.
    pub reason: String,

    /// When the order was cancelled.
    pub cancelled_at: DateTime<Utc>,
}

// Convenience constructors for events
impl OrderEvent {
    /// Creates an OrderCreated event.
    pub fn order_created(order_id: AggregateId, total: Money) -> Self {
        OrderEvent::OrderCreated(OrderCreatedData {
            order_id,
            total,
            created_at: Utc::now(),
        })
    }

    /// Creates an OrderPaid event.
    pub fn order_paid(payment_id: AggregateId) -> Self {
        OrderEvent::OrderPaid(OrderPaidData {
            payment_id,
            paid_at: Utc::now(),
        })
    }

    /// Creates an OrderShipped event.
    pub fn order_shipped(tracking_number: impl Into<String>) -> Self {
        OrderEvent::OrderShipped(OrderShippedData {
            tracking_number: tracking_number.into(),
            shipped_at: Utc::now(),
        })
    }

    /// Creates an OrderCancelled event.
    pub fn order_cancelled(reason: impl Into<String>) -> Self {
        OrderEvent::OrderCancelled(OrderCancelledData {
            reason: reason.into(),
            cancelled_at: Utc::now(),
        })
    }
}
