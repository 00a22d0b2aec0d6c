//! Domain layer for the ordering system.
//!
//! This crate provides the Order aggregate and everything it is built from:
//! - The status state machine governing legal transitions
//! - Value objects (money, addresses, line items)
//! - Domain events raised by legal transitions
//!
//! The aggregate performs no I/O; raised events are its only observable
//! side effect and are drained by the repository layer.

pub mod event;
pub mod order;

pub use event::{AggregateRoot, DomainEvent};
pub use order::{
    Address, Money, Order, OrderAwaitingValidationData, OrderCancelledData, OrderDomainEvent,
    OrderError, OrderItem, OrderPaidData, OrderShippedData, OrderStartedData, OrderStatus,
    OrderStockConfirmedData, ProductId, StockItem,
};
