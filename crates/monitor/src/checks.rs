//! Built-in cross-aggregate checks.

use std::collections::HashSet;

use async_trait::async_trait;
use common::AggregateId;
use domain::{Aggregate, Order, Payment};
use event_store::{EventQuery, EventStore};

use crate::error::MonitorError;
use crate::monitor::ConsistencyCheck;

/// Verifies that every order marked paid is backed by a settled payment.
///
/// An order records `OrderPaid` with the payment that settled it; the
/// payment records `PaymentCompleted` on its own stream. In between the
/// two commits the aggregates legitimately disagree, so a failure here
/// means either an open consistency window or a paid order pointing at a
/// payment that never settled.
pub struct PaidOrdersHaveCompletedPayments<S: EventStore> {
    store: S,
}

impl<S: EventStore> PaidOrdersHaveCompletedPayments<S> {
    pub const NAME: &'static str = "paid-orders-have-completed-payments";

    /// Creates the check over the given event store.
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: EventStore> ConsistencyCheck for PaidOrdersHaveCompletedPayments<S> {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn evaluate(&self) -> Result<bool, MonitorError> {
        let completed = self
            .store
            .query_events(
                EventQuery::new()
                    .aggregate_type(Payment::aggregate_type())
                    .event_type("PaymentCompleted"),
            )
            .await?;
        let settled: HashSet<AggregateId> =
            completed.iter().map(|event| event.aggregate_id).collect();

        let paid_orders = self
            .store
            .query_events(
                EventQuery::new()
                    .aggregate_type(Order::aggregate_type())
                    .event_type("OrderPaid"),
            )
            .await?;

        let mut consistent = true;
        for event in &paid_orders {
            let payment_id: AggregateId =
                serde_json::from_value(event.payload["data"]["payment_id"].clone())?;
            if !settled.contains(&payment_id) {
                tracing::warn!(
                    order_id = %event.aggregate_id,
                    %payment_id,
                    "paid order references a payment with no completion"
                );
                consistent = false;
            }
        }

        Ok(consistent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{
        CompletePayment, CreateOrder, MarkPaid, Money, OrderService, PaymentService,
        RequestPayment,
    };
    use event_store::InMemoryEventStore;

    async fn paid_order(
        orders: &OrderService<InMemoryEventStore>,
        payment_id: AggregateId,
    ) -> AggregateId {
        let cmd = CreateOrder::with_total(Money::from_cents(2500));
        let order_id = cmd.order_id;
        orders.create_order(cmd).await.unwrap();
        orders
            .mark_paid(MarkPaid::new(order_id, payment_id))
            .await
            .unwrap();
        order_id
    }

    #[tokio::test]
    async fn passes_when_every_paid_order_has_a_settled_payment() {
        let store = InMemoryEventStore::new();
        let orders = OrderService::new(store.clone());
        let payments = PaymentService::new(store.clone());

        let order_id = AggregateId::new();
        let cmd = RequestPayment::for_order(order_id, Money::from_cents(2500));
        let payment_id = cmd.payment_id;
        payments.request_payment(cmd).await.unwrap();
        payments
            .complete_payment(CompletePayment::new(payment_id))
            .await
            .unwrap();
        paid_order(&orders, payment_id).await;

        let check = PaidOrdersHaveCompletedPayments::new(store);
        assert!(check.evaluate().await.unwrap());
    }

    #[tokio::test]
    async fn fails_when_a_paid_order_has_no_settled_payment() {
        let store = InMemoryEventStore::new();
        let orders = OrderService::new(store.clone());

        // Order claims a payment that was never even requested.
        paid_order(&orders, AggregateId::new()).await;

        let check = PaidOrdersHaveCompletedPayments::new(store);
        assert!(!check.evaluate().await.unwrap());
    }

    #[tokio::test]
    async fn fails_while_payment_is_still_pending() {
        let store = InMemoryEventStore::new();
        let orders = OrderService::new(store.clone());
        let payments = PaymentService::new(store.clone());

        let order_id = AggregateId::new();
        let cmd = RequestPayment::for_order(order_id, Money::from_cents(2500));
        let payment_id = cmd.payment_id;
        payments.request_payment(cmd).await.unwrap();
        paid_order(&orders, payment_id).await;

        let check = PaidOrdersHaveCompletedPayments::new(store);
        assert!(!check.evaluate().await.unwrap());
    }

    #[tokio::test]
    async fn passes_with_no_orders_at_all() {
        let check = PaidOrdersHaveCompletedPayments::new(InMemoryEventStore::new());
        assert!(check.evaluate().await.unwrap());
    }
}
