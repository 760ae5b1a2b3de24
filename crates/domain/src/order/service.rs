//! Order service providing a simplified API for order operations.

use common::AggregateId;
use event_store::EventStore;

use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{CancelOrder, CreateOrder, MarkPaid, Order, ShipOrder};

/// Service for managing orders.
///
/// Provides a high-level API for order operations, wrapping the command
/// handler and providing convenient methods for common operations.
pub struct OrderService<S: EventStore> {
    handler: CommandHandler<S, Order>,
}

impl<S: EventStore> OrderService<S> {
    /// Creates a new order service with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, Order> {
        &self.handler
    }

    /// Creates a new order.
    #[tracing::instrument(skip(self))]
    pub async fn create_order(
        &self,
        cmd: CreateOrder,
    ) -> Result<CommandResult<Order>, DomainError> {
        let order_id = cmd.order_id;
        let total = cmd.total;

        self.handler
            .execute(order_id, |order| order.create(order_id, total))
            .await
    }

    /// Marks an order as paid.
    #[tracing::instrument(skip(self))]
    pub async fn mark_paid(&self, cmd: MarkPaid) -> Result<CommandResult<Order>, DomainError> {
        let payment_id = cmd.payment_id;

        self.handler
            .execute(cmd.order_id, |order| order.mark_paid(payment_id))
            .await
    }

    /// Ships an order.
    #[tracing::instrument(skip(self))]
    pub async fn ship_order(&self, cmd: ShipOrder) -> Result<CommandResult<Order>, DomainError> {
        let tracking_number = cmd.tracking_number.clone();

        self.handler
            .execute(cmd.order_id, |order| order.ship(tracking_number))
            .await
    }

    /// Cancels an order.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        cmd: CancelOrder,
    ) -> Result<CommandResult<Order>, DomainError> {
        let reason = cmd.reason.clone();

        self.handler
            .execute(cmd.order_id, |order| order.cancel(reason))
            .await
    }

    /// Loads an order by ID.
    ///
    /// Returns None if the order doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: AggregateId) -> Result<Option<Order>, DomainError> {
        self.handler.load_existing(order_id).await
    }
}
