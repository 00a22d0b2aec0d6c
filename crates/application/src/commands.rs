//! Command types and the inbound envelope.

use common::{BuyerId, OrderId, RequestId};
use domain::{Address, Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::outcome::CommandOutcome;

/// Trait implemented by every command kind.
///
/// `result_for_duplicate` is the per-kind duplicate policy: the outcome a
/// caller sees when the ledger already holds an accepted entry for their
/// request identifier. It is a pure function of the command kind. All
/// current kinds treat a duplicate as success, since re-sending a command
/// that already took effect must not read as an error.
pub trait Command: Send + Sync {
    /// Returns the command kind name, stored in the ledger.
    fn name(&self) -> &'static str;

    /// Returns the outcome reported for a duplicate delivery.
    fn result_for_duplicate(&self) -> CommandOutcome {
        CommandOutcome::Accepted
    }
}

/// The inbound envelope: a command paired with its caller-supplied
/// request identifier. Any command routed through the idempotency layer
/// must arrive in this wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifiedCommand<C> {
    pub request_id: RequestId,
    pub command: C,
}

impl<C> IdentifiedCommand<C> {
    /// Creates a new identified command.
    pub fn new(request_id: RequestId, command: C) -> Self {
        Self {
            request_id,
            command,
        }
    }
}

/// A line item as supplied by the caller, validated when the aggregate
/// is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Money,
    pub discount: Money,
    pub units: u32,
}

/// Places a new order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderCommand {
    pub order_id: OrderId,
    pub buyer_id: BuyerId,
    pub address: Address,
    pub items: Vec<NewOrderItem>,
    pub description: Option<String>,
}

impl Command for CreateOrderCommand {
    fn name(&self) -> &'static str {
        "CreateOrderCommand"
    }
}

/// Cancels an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelOrderCommand {
    pub order_number: OrderId,
}

impl Command for CancelOrderCommand {
    fn name(&self) -> &'static str {
        "CancelOrderCommand"
    }
}

/// Moves an order to stock validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetAwaitingValidationStatusCommand {
    pub order_number: OrderId,
}

impl Command for SetAwaitingValidationStatusCommand {
    fn name(&self) -> &'static str {
        "SetAwaitingValidationStatusCommand"
    }
}

/// Confirms stock availability for an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStockConfirmedStatusCommand {
    pub order_number: OrderId,
}

impl Command for SetStockConfirmedStatusCommand {
    fn name(&self) -> &'static str {
        "SetStockConfirmedStatusCommand"
    }
}

/// Records payment for an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetPaidOrderStatusCommand {
    pub order_number: OrderId,
}

impl Command for SetPaidOrderStatusCommand {
    fn name(&self) -> &'static str {
        "SetPaidOrderStatusCommand"
    }
}

/// Ships an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipOrderCommand {
    pub order_number: OrderId,
}

impl Command for ShipOrderCommand {
    fn name(&self) -> &'static str {
        "ShipOrderCommand"
    }
}

/// The closed set of commands the pipeline accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "commandType", content = "payload")]
pub enum OrderCommand {
    Create(CreateOrderCommand),
    Cancel(CancelOrderCommand),
    SetAwaitingValidation(SetAwaitingValidationStatusCommand),
    SetStockConfirmed(SetStockConfirmedStatusCommand),
    SetPaid(SetPaidOrderStatusCommand),
    Ship(ShipOrderCommand),
}

impl Command for OrderCommand {
    fn name(&self) -> &'static str {
        match self {
            OrderCommand::Create(c) => c.name(),
            OrderCommand::Cancel(c) => c.name(),
            OrderCommand::SetAwaitingValidation(c) => c.name(),
            OrderCommand::SetStockConfirmed(c) => c.name(),
            OrderCommand::SetPaid(c) => c.name(),
            OrderCommand::Ship(c) => c.name(),
        }
    }

    fn result_for_duplicate(&self) -> CommandOutcome {
        match self {
            OrderCommand::Create(c) => c.result_for_duplicate(),
            OrderCommand::Cancel(c) => c.result_for_duplicate(),
            OrderCommand::SetAwaitingValidation(c) => c.result_for_duplicate(),
            OrderCommand::SetStockConfirmed(c) => c.result_for_duplicate(),
            OrderCommand::SetPaid(c) => c.result_for_duplicate(),
            OrderCommand::Ship(c) => c.result_for_duplicate(),
        }
    }
}
