//! End-to-end order fulfillment saga over real domain services.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::{AggregateId, CorrelationId};
use domain::order::{CancelOrder, CreateOrder, MarkPaid, Money, OrderService, OrderState, ShipOrder};
use domain::payment::{
    CompletePayment, FailPayment, PaymentService, PaymentState, RefundPayment, RequestPayment,
};
use event_store::InMemoryEventStore;
use messaging::{InMemoryIdempotencyStore, IntegrationEvent};
use saga::{
    ChoreographyHandler, SagaChoreographer, SagaContext, SagaError, SagaEvent, SagaInstance,
    SagaOrchestrator, SagaState, SagaStep, StepError,
};

/// Creates the order when the saga starts, cancels it on rollback.
struct PlaceOrderStep {
    orders: Arc<OrderService<InMemoryEventStore>>,
    order_id: AggregateId,
    total: Money,
}

#[async_trait]
impl SagaStep for PlaceOrderStep {
    fn name(&self) -> &str {
        "place-order"
    }

    async fn execute(&self, _ctx: &SagaContext) -> Result<serde_json::Value, StepError> {
        self.orders
            .create_order(CreateOrder::new(self.order_id, self.total))
            .await?;
        Ok(serde_json::json!({"order_id": self.order_id}))
    }

    async fn compensate(&self, _ctx: &SagaContext) -> Result<(), StepError> {
        self.orders
            .cancel_order(CancelOrder::new(self.order_id, "fulfillment failed"))
            .await?;
        Ok(())
    }
}

/// Reserves stock from a shared pool, releasing it on rollback.
struct ReserveInventoryStep {
    stock: Arc<Mutex<u32>>,
    quantity: u32,
}

#[async_trait]
impl SagaStep for ReserveInventoryStep {
    fn name(&self) -> &str {
        "reserve-inventory"
    }

    async fn execute(&self, _ctx: &SagaContext) -> Result<serde_json::Value, StepError> {
        let mut stock = self.stock.lock().unwrap();
        if *stock < self.quantity {
            return Err(StepError::new("out of stock"));
        }
        *stock -= self.quantity;
        Ok(serde_json::json!({"reserved": self.quantity}))
    }

    async fn compensate(&self, _ctx: &SagaContext) -> Result<(), StepError> {
        *self.stock.lock().unwrap() += self.quantity;
        Ok(())
    }
}

/// Charges the payment, refunding it on rollback.
struct ChargePaymentStep {
    payments: Arc<PaymentService<InMemoryEventStore>>,
    order_id: AggregateId,
    amount: Money,
    decline: bool,
}

#[async_trait]
impl SagaStep for ChargePaymentStep {
    fn name(&self) -> &str {
        "charge-payment"
    }

    async fn execute(&self, _ctx: &SagaContext) -> Result<serde_json::Value, StepError> {
        let cmd = RequestPayment::for_order(self.order_id, self.amount);
        let payment_id = cmd.payment_id;
        self.payments.request_payment(cmd).await?;

        if self.decline {
            self.payments
                .fail_payment(FailPayment::new(payment_id, "card declined"))
                .await?;
            return Err(StepError::new("card declined"));
        }

        self.payments
            .complete_payment(CompletePayment::new(payment_id))
            .await?;
        Ok(serde_json::json!({"payment_id": payment_id}))
    }

    async fn compensate(&self, ctx: &SagaContext) -> Result<(), StepError> {
        let payment_id = ctx
            .output("charge-payment")
            .and_then(|o| o["payment_id"].as_str())
            .and_then(|s| s.parse().ok())
            .map(AggregateId::from_uuid)
            .ok_or_else(|| StepError::new("no payment to refund"))?;
        self.payments
            .refund_payment(RefundPayment::new(payment_id))
            .await?;
        Ok(())
    }
}

/// Marks the order paid and ships it.
struct ShipOrderStep {
    orders: Arc<OrderService<InMemoryEventStore>>,
    order_id: AggregateId,
}

#[async_trait]
impl SagaStep for ShipOrderStep {
    fn name(&self) -> &str {
        "ship-order"
    }

    async fn execute(&self, ctx: &SagaContext) -> Result<serde_json::Value, StepError> {
        let payment_id = ctx
            .output("charge-payment")
            .and_then(|o| o["payment_id"].as_str())
            .and_then(|s| s.parse().ok())
            .map(AggregateId::from_uuid)
            .ok_or_else(|| StepError::new("order was never charged"))?;

        self.orders
            .mark_paid(MarkPaid::new(self.order_id, payment_id))
            .await?;
        self.orders
            .ship_order(ShipOrder::new(self.order_id, "TRACK-001"))
            .await?;
        Ok(serde_json::json!({"tracking_number": "TRACK-001"}))
    }
}

struct Fixture {
    store: InMemoryEventStore,
    orders: Arc<OrderService<InMemoryEventStore>>,
    payments: Arc<PaymentService<InMemoryEventStore>>,
    stock: Arc<Mutex<u32>>,
    order_id: AggregateId,
    total: Money,
}

impl Fixture {
    fn new() -> Self {
        let store = InMemoryEventStore::new();
        Self {
            orders: Arc::new(OrderService::new(store.clone())),
            payments: Arc::new(PaymentService::new(store.clone())),
            store,
            stock: Arc::new(Mutex::new(10)),
            order_id: AggregateId::new(),
            total: Money::from_cents(2500),
        }
    }

    fn orchestrator(&self, decline_payment: bool) -> SagaOrchestrator<InMemoryEventStore> {
        SagaOrchestrator::new(self.store.clone(), "order-fulfillment")
            .add_step(Arc::new(PlaceOrderStep {
                orders: self.orders.clone(),
                order_id: self.order_id,
                total: self.total,
            }))
            .add_step(Arc::new(ReserveInventoryStep {
                stock: self.stock.clone(),
                quantity: 2,
            }))
            .add_step(Arc::new(ChargePaymentStep {
                payments: self.payments.clone(),
                order_id: self.order_id,
                amount: self.total,
                decline: decline_payment,
            }))
            .add_step(Arc::new(ShipOrderStep {
                orders: self.orders.clone(),
                order_id: self.order_id,
            }))
    }
}

#[tokio::test]
async fn successful_fulfillment_ships_the_order() {
    let fixture = Fixture::new();
    let orchestrator = fixture.orchestrator(false);

    let saga_id = orchestrator.run(CorrelationId::new()).await.unwrap();

    let saga = orchestrator.get_saga(saga_id).await.unwrap().unwrap();
    assert_eq!(saga.state(), SagaState::Completed);
    assert_eq!(
        saga.completed_step_names(),
        vec![
            "place-order",
            "reserve-inventory",
            "charge-payment",
            "ship-order"
        ]
    );

    let order = fixture
        .orders
        .get_order(fixture.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.state(), OrderState::Shipped);
    assert!(order.payment_id().is_some());

    let payment = fixture
        .payments
        .get_payment(order.payment_id().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.state(), PaymentState::Completed);

    assert_eq!(*fixture.stock.lock().unwrap(), 8);
}

#[tokio::test]
async fn declined_payment_rolls_back_order_and_stock() {
    let fixture = Fixture::new();
    let orchestrator = fixture.orchestrator(true);

    let result = orchestrator.run(CorrelationId::new()).await;

    let Err(SagaError::StepFailed {
        saga_id,
        step_name,
        compensation_incomplete,
        ..
    }) = result
    else {
        panic!("expected StepFailed");
    };
    assert_eq!(step_name, "charge-payment");
    assert!(!compensation_incomplete);

    let saga = orchestrator.get_saga(saga_id).await.unwrap().unwrap();
    assert_eq!(saga.state(), SagaState::Failed);
    assert_eq!(
        saga.compensated_steps(),
        &["reserve-inventory", "place-order"]
    );

    // Order cancelled, stock back where it started.
    let order = fixture
        .orders
        .get_order(fixture.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.state(), OrderState::Cancelled);
    assert_eq!(*fixture.stock.lock().unwrap(), 10);
}

#[tokio::test]
async fn saga_history_survives_coordinator_restart() {
    let fixture = Fixture::new();
    let saga_id = fixture
        .orchestrator(false)
        .run(CorrelationId::new())
        .await
        .unwrap();

    // A fresh orchestrator over the same store sees the full history.
    let restarted = SagaOrchestrator::new(fixture.store.clone(), "order-fulfillment");
    let saga = restarted.get_saga(saga_id).await.unwrap().unwrap();

    assert_eq!(saga.state(), SagaState::Completed);
    assert_eq!(saga.completed_steps().len(), 4);
}

/// Reacts to order and payment integration events in a choreographed saga.
struct FulfillmentReaction {
    step_name: &'static str,
    completes: bool,
}

#[async_trait]
impl ChoreographyHandler for FulfillmentReaction {
    async fn handle(
        &self,
        _saga: &SagaInstance,
        event: &IntegrationEvent,
    ) -> Result<Vec<SagaEvent>, StepError> {
        let mut events = vec![SagaEvent::step_completed(
            self.step_name,
            event.payload.clone(),
        )];
        if self.completes {
            events.push(SagaEvent::saga_completed());
        }
        Ok(events)
    }
}

#[tokio::test]
async fn choreographed_saga_advances_across_services() {
    let fixture = Fixture::new();
    let correlation_id = CorrelationId::new();

    let choreographer = SagaChoreographer::new(
        fixture.store.clone(),
        "order-fulfillment",
        Arc::new(InMemoryIdempotencyStore::new()),
    )
    .register_handler(
        "OrderCreated",
        Arc::new(FulfillmentReaction {
            step_name: "await-payment",
            completes: false,
        }),
    )
    .register_handler(
        "PaymentCompleted",
        Arc::new(FulfillmentReaction {
            step_name: "confirm-payment",
            completes: true,
        }),
    );

    // Order service emits OrderCreated.
    let created = fixture
        .orders
        .create_order(CreateOrder::new(fixture.order_id, fixture.total))
        .await
        .unwrap();
    let order_created = IntegrationEvent::builder()
        .event_type("OrderCreated")
        .source("Order")
        .payload(&created.events[0])
        .unwrap()
        .correlation_id(correlation_id)
        .build();

    let saga = choreographer
        .handle_event(&order_created)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saga.state(), SagaState::Running);

    // Redelivery of the same event is a no-op.
    assert!(choreographer
        .handle_event(&order_created)
        .await
        .unwrap()
        .is_none());

    // Payment service settles the payment and emits PaymentCompleted.
    let cmd = RequestPayment::for_order(fixture.order_id, fixture.total);
    let payment_id = cmd.payment_id;
    fixture.payments.request_payment(cmd).await.unwrap();
    let completed = fixture
        .payments
        .complete_payment(CompletePayment::new(payment_id))
        .await
        .unwrap();
    let payment_completed = IntegrationEvent::builder()
        .event_type("PaymentCompleted")
        .source("Payment")
        .payload(&completed.events[0])
        .unwrap()
        .correlation_id(correlation_id)
        .build();

    let saga = choreographer
        .handle_event(&payment_completed)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saga.state(), SagaState::Completed);
    assert_eq!(
        saga.completed_step_names(),
        vec!["await-payment", "confirm-payment"]
    );

    // Both coordination styles read the same persisted instance.
    let reloaded = choreographer
        .get_saga(correlation_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.state(), SagaState::Completed);
    assert!(reloaded.is_terminal());
}
