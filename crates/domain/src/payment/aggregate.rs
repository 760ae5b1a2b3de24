//! Payment aggregate implementation.

use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::order::Money;

use super::{
    PaymentError, PaymentEvent, PaymentState,
    events::{PaymentFailedData, PaymentRequestedData},
};

/// Payment aggregate root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Payment {
    id: Option<AggregateId>,

    #[serde(default)]
    version: Version,

    /// The order this payment settles.
    order_id: Option<AggregateId>,

    state: PaymentState,

    amount: Money,

    /// Failure reason, if failed.
    failure_reason: Option<String>,
}

impl Aggregate for Payment {
    type Event = PaymentEvent;
    type Error = PaymentError;

    fn aggregate_type() -> &'static str {
        "Payment"
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
            PaymentEvent::PaymentRequested(data) => self.apply_payment_requested(data),
            PaymentEvent::PaymentCompleted(_) => {
                self.state = PaymentState::Completed;
            }
            PaymentEvent::PaymentFailed(data) => self.apply_payment_failed(data),
            PaymentEvent::PaymentRefunded(_) => {
                self.state = PaymentState::Refunded;
            }
        }
    }
}

// Query methods
impl Payment {
    pub fn state(&self) -> PaymentState {
        self.state
    }

    pub fn order_id(&self) -> Option<AggregateId> {
        self.order_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

// Command methods (return events)
impl Payment {
    /// Requests a payment for an order.
    pub fn request(
        &self,
        payment_id: AggregateId,
        order_id: AggregateId,
        amount: Money,
    ) -> Result<Vec<PaymentEvent>, PaymentError> {
        if self.id.is_some() {
            return Err(PaymentError::AlreadyRequested);
        }

        if !amount.is_positive() {
            return Err(PaymentError::InvalidAmount {
                cents: amount.cents(),
            });
        }

        Ok(vec![PaymentEvent::payment_requested(
            payment_id, order_id, amount,
        )])
    }

    /// Settles the payment.
    pub fn complete(&self) -> Result<Vec<PaymentEvent>, PaymentError> {
        if self.id.is_none() {
            return Err(PaymentError::NotFound);
        }

        if !self.state.can_complete() {
            return Err(PaymentError::InvalidStateTransition {
                current_state: self.state,
                action: "complete",
            });
        }

        Ok(vec![PaymentEvent::payment_completed()])
    }

    /// Fails the payment.
    pub fn fail(&self, reason: impl Into<String>) -> Result<Vec<PaymentEvent>, PaymentError> {
        if self.id.is_none() {
            return Err(PaymentError::NotFound);
        }

        if !self.state.can_fail() {
            return Err(PaymentError::InvalidStateTransition {
                current_state: self.state,
                action: "fail",
            });
        }

        Ok(vec![PaymentEvent::payment_failed(reason)])
    }

    /// Refunds a completed payment.
    pub fn refund(&self) -> Result<Vec<PaymentEvent>, PaymentError> {
        if self.id.is_none() {
            return Err(PaymentError::NotFound);
        }

        if !self.state.can_refund() {
            return Err(PaymentError::InvalidStateTransition {
                current_state: self.state,
                action: "refund",
            });
        }

        Ok(vec![PaymentEvent::payment_refunded()])
    }
}

// Apply event helpers
impl Payment {
    fn apply_payment_requested(&mut self, data: PaymentRequestedData) {
        self.id = Some(data.payment_id);
        self.order_id = Some(data.order_id);
        self.amount = data.amount;
        self.state = PaymentState::Requested;
    }

    fn apply_payment_failed(&mut self, data: PaymentFailedData) {
        self.failure_reason = Some(data.reason);
        self.state = PaymentState::Failed;
    }
}
