//! Payment domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::order::Money;

/// Events that can occur on a payment aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PaymentEvent {
    /// Payment was requested.
    PaymentRequested(PaymentRequestedData),

    /// Payment settled successfully.
    PaymentCompleted(PaymentCompletedData),

    /// Payment failed.
    PaymentFailed(PaymentFailedData),

    /// A completed payment was refunded.
    PaymentRefunded(PaymentRefundedData),
}

impl DomainEvent for PaymentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PaymentEvent::PaymentRequested(_) => "PaymentRequested",
            PaymentEvent::PaymentCompleted(_) => "PaymentCompleted",
            PaymentEvent::PaymentFailed(_) => "PaymentFailed",
            PaymentEvent::PaymentRefunded(_) => "PaymentRefunded",
        }
    }
}

/// Data for PaymentRequested event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequestedData {
    /// The unique payment ID.
    pub payment_id: AggregateId,

    /// The order this payment settles.
    pub order_id: AggregateId,

    /// Amount to charge.
    pub amount: Money,

    /// When the payment was requested.
    pub requested_at: DateTime<Utc>,
}

/// Data for PaymentCompleted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCompletedData {
    /// When the payment settled.
    pub completed_at: DateTime<Utc>,
}

/// Data for PaymentFailed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentFailedData {
    /// Reason the payment failed.
    pub reason: String,

    /// When the payment failed.
    pub failed_at: DateTime<Utc>,
}

/// Data for PaymentRefunded event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRefundedData {
    /// When the refund was issued.
    pub refunded_at: DateTime<Utc>,
}

// Convenience constructors for events
impl PaymentEvent {
    /// Creates a PaymentRequested event.
    pub fn payment_requested(
        payment_id: AggregateId,
        order_id: AggregateId,
        amount: Money,
    ) -> Self {
        PaymentEvent::PaymentRequested(PaymentRequestedData {
            payment_id,
            order_id,
            amount,
            requested_at: Utc::now(),
        })
    }

    /// Creates a PaymentCompleted event.
    pub fn payment_completed() -> Self {
        PaymentEvent::PaymentCompleted(PaymentCompletedData {
            completed_at: Utc::now(),
        })
    }

    /// Creates a PaymentFailed event.
    pub fn payment_failed(reason: impl Into<String>) -> Self {
        PaymentEvent::PaymentFailed(PaymentFailedData {
            reason: reason.into(),
            failed_at: Utc::now(),
        })
    }

    /// Creates a PaymentRefunded event.
    pub fn payment_refunded() -> Self {
        PaymentEvent::PaymentRefunded(PaymentRefundedData {
            refunded_at: Utc::now(),
        })
    }
}
