//! Payment service providing a simplified API for payment operations.

use common::AggregateId;
use event_store::EventStore;

use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{CompletePayment, FailPayment, Payment, RefundPayment, RequestPayment};

/// Service for managing payments.
pub struct PaymentService<S: EventStore> {
    handler: CommandHandler<S, Payment>,
}

impl<S: EventStore> PaymentService<S> {
    /// Creates a new payment service with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, Payment> {
        &self.handler
    }

    /// Requests a payment for an order.
    #[tracing::instrument(skip(self))]
    pub async fn request_payment(
        &self,
        cmd: RequestPayment,
    ) -> Result<CommandResult<Payment>, DomainError> {
        let payment_id = cmd.payment_id;
        let order_id = cmd.order_id;
        let amount = cmd.amount;

        self.handler
            .execute(payment_id, |payment| {
                payment.request(payment_id, order_id, amount)
            })
            .await
    }

    /// Settles a payment.
    #[tracing::instrument(skip(self))]
    pub async fn complete_payment(
        &self,
        cmd: CompletePayment,
    ) -> Result<CommandResult<Payment>, DomainError> {
        self.handler
            .execute(cmd.payment_id, |payment| payment.complete())
            .await
    }

    /// Fails a payment.
    #[tracing::instrument(skip(self))]
    pub async fn fail_payment(
        &self,
        cmd: FailPayment,
    ) -> Result<CommandResult<Payment>, DomainError> {
        let reason = cmd.reason.clone();

        self.handler
            .execute(cmd.payment_id, |payment| payment.fail(reason))
            .await
    }

    /// Refunds a completed payment.
    #[tracing::instrument(skip(self))]
    pub async fn refund_payment(
        &self,
        cmd: RefundPayment,
    ) -> Result<CommandResult<Payment>, DomainError> {
        self.handler
            .execute(cmd.payment_id, |payment| payment.refund())
            .await
    }

    /// Loads a payment by ID, returning None if it doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_payment(
        &self,
        payment_id: AggregateId,
    ) -> Result<Option<Payment>, DomainError> {
        self.handler.load_existing(payment_id).await
    }
}
