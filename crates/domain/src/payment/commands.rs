//! Payment commands.

use common::AggregateId;

use crate::order::Money;

/// Command to request a payment for an order.
#[derive(Debug, Clone)]
pub struct RequestPayment {
    /// The payment ID to create.
    pub payment_id: AggregateId,

    /// The order this payment settles.
    pub order_id: AggregateId,

    /// Amount to charge.
    pub amount: Money,
}

impl RequestPayment {
    /// Creates a new RequestPayment command.
    pub fn new(payment_id: AggregateId, order_id: AggregateId, amount: Money) -> Self {
        Self {
            payment_id,
            order_id,
            amount,
        }
    }

    /// Creates a new RequestPayment command with a generated payment ID.
    pub fn for_order(order_id: AggregateId, amount: Money) -> Self {
        Self {
            payment_id: AggregateId::new(),
            order_id,
            amount,
        }
    }
}

/// Command to settle a payment.
#[derive(Debug, Clone)]
pub struct CompletePayment {
    /// The payment to settle.
    pub payment_id: AggregateId,
}

impl CompletePayment {
    pub fn new(payment_id: AggregateId) -> Self {
        Self { payment_id }
    }
}

/// Command to fail a payment.
#[derive(Debug, Clone)]
pub struct FailPayment {
    /// The payment to fail.
    pub payment_id: AggregateId,

    /// Reason the payment failed.
    pub reason: String,
}

impl FailPayment {
    pub fn new(payment_id: AggregateId, reason: impl Into<String>) -> Self {
        Self {
            payment_id,
            reason: reason.into(),
        }
    }
}

/// Command to refund a completed payment.
#[derive(Debug, Clone)]
pub struct RefundPayment {
    /// The payment to refund.
    pub payment_id: AggregateId,
}

impl RefundPayment {
    pub fn new(payment_id: AggregateId) -> Self {
        Self { payment_id }
    }
}
