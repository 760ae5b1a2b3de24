//! Domain layer for the saga coordination engine.
//!
//! This crate provides the core event-sourcing abstractions:
//! - Aggregate trait for replay-built entities
//! - DomainEvent trait for domain events
//! - CommandHandler for the load/validate/append cycle
//! - Order and Payment aggregates used by sagas and consistency checks

pub mod aggregate;
pub mod command;
pub mod error;
pub mod order;
pub mod payment;

pub use aggregate::{Aggregate, DomainEvent};
pub use command::{CommandHandler, CommandResult};
pub use error::DomainError;
pub use order::{
    CancelOrder, CreateOrder, MarkPaid, Money, Order, OrderError, OrderEvent, OrderService,
    OrderState, ShipOrder,
};
pub use payment::{
    CompletePayment, FailPayment, Payment, PaymentError, PaymentEvent, PaymentService,
    PaymentState, RefundPayment, RequestPayment,
};
