//! Application layer: the idempotent command pipeline.
//!
//! Inbound commands arrive wrapped in an [`IdentifiedCommand`] carrying a
//! caller-supplied request identifier. The [`CommandProcessor`] routes each
//! command kind through an [`IdempotentHandler`] that consults the request
//! ledger before delegating to the per-kind handler, so re-delivery of the
//! same identifier never executes the handler twice. Handlers load the
//! aggregate through an [`OrderRepository`], invoke exactly one state-machine
//! operation, and commit the mutation, its integration events, and the
//! ledger entry as one unit of work.

pub mod commands;
pub mod handlers;
pub mod idempotency;
pub mod outcome;
pub mod processor;
pub mod repository;

pub use commands::{
    CancelOrderCommand, Command, CreateOrderCommand, IdentifiedCommand, NewOrderItem,
    OrderCommand, SetAwaitingValidationStatusCommand, SetPaidOrderStatusCommand,
    SetStockConfirmedStatusCommand, ShipOrderCommand,
};
pub use handlers::{
    CancelOrderHandler, CommandHandler, CreateOrderHandler, SetAwaitingValidationStatusHandler,
    SetPaidOrderStatusHandler, SetStockConfirmedStatusHandler, ShipOrderHandler,
};
pub use idempotency::IdempotentHandler;
pub use outcome::{CommandOutcome, RejectReason};
pub use processor::CommandProcessor;
pub use repository::OrderRepository;
