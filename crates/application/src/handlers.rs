//! Per-command handlers.
//!
//! Each handler executes exactly one aggregate operation. Business-rule
//! failures come back as rejected outcomes; only store faults surface as
//! errors. Handlers never touch the request ledger directly — they receive
//! the pending entry from the idempotency layer and attach it to the unit
//! of work, so the ledger write commits with the mutation it guards.

use async_trait::async_trait;
use common::OrderId;
use domain::{Order, OrderError, OrderItem};
use order_store::{LedgerEntry, OrderStore, StoreError};

use crate::commands::{
    CancelOrderCommand, Command, CreateOrderCommand, SetAwaitingValidationStatusCommand,
    SetPaidOrderStatusCommand, SetStockConfirmedStatusCommand, ShipOrderCommand,
};
use crate::outcome::{CommandOutcome, RejectReason};
use crate::repository::OrderRepository;

/// Executes one command kind against the order aggregate.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    type Command: Command;

    /// Applies the command, committing `pending_request` atomically with
    /// any mutation it performs.
    async fn handle(
        &self,
        command: &Self::Command,
        pending_request: LedgerEntry,
    ) -> Result<CommandOutcome, StoreError>;
}

/// Loads an order, applies one transition, and commits the result.
///
/// The shared path for every status-change handler: a missing order or a
/// state-machine refusal becomes a rejection, and a stale commit becomes
/// a retryable conflict.
async fn apply_transition<S, F>(
    store: &S,
    order_id: OrderId,
    pending_request: LedgerEntry,
    transition: F,
) -> Result<CommandOutcome, StoreError>
where
    S: OrderStore + Clone,
    F: FnOnce(&mut Order) -> Result<(), OrderError> + Send,
{
    let mut repository = OrderRepository::new(store.clone());

    let Some(mut order) = repository.get(order_id).await? else {
        tracing::warn!(order_id = %order_id, "command targets unknown order");
        return Ok(CommandOutcome::Rejected(RejectReason::NotFound));
    };

    if let Err(e) = transition(&mut order) {
        tracing::info!(order_id = %order_id, error = %e, "transition rejected");
        return Ok(CommandOutcome::Rejected(e.into()));
    }

    repository.update(&mut order)?;
    repository.set_pending_request(pending_request);

    if repository.save_entities().await? {
        Ok(CommandOutcome::Accepted)
    } else {
        Ok(CommandOutcome::Rejected(RejectReason::ConcurrencyConflict))
    }
}

/// Places a new order.
pub struct CreateOrderHandler<S> {
    store: S,
}

impl<S: OrderStore + Clone> CreateOrderHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: OrderStore + Clone> CommandHandler for CreateOrderHandler<S> {
    type Command = CreateOrderCommand;

    async fn handle(
        &self,
        command: &CreateOrderCommand,
        pending_request: LedgerEntry,
    ) -> Result<CommandOutcome, StoreError> {
        tracing::info!(
            order_id = %command.order_id,
            buyer_id = %command.buyer_id,
            items = command.items.len(),
            "creating order"
        );

        let mut items = Vec::with_capacity(command.items.len());
        for item in &command.items {
            match OrderItem::new(
                item.product_id,
                item.product_name.clone(),
                item.unit_price,
                item.discount,
                item.units,
            ) {
                Ok(item) => items.push(item),
                Err(e) => {
                    return Ok(CommandOutcome::Rejected(RejectReason::Validation {
                        message: e.to_string(),
                    }));
                }
            }
        }

        let mut order = match Order::place(
            command.order_id,
            command.buyer_id,
            command.address.clone(),
            items,
            command.description.clone(),
        ) {
            Ok(order) => order,
            Err(e) => return Ok(CommandOutcome::Rejected(e.into())),
        };

        let mut repository = OrderRepository::new(self.store.clone());
        repository.add(&mut order)?;
        repository.set_pending_request(pending_request);

        if repository.save_entities().await? {
            Ok(CommandOutcome::Accepted)
        } else {
            // The identifier is already taken by an existing order row.
            // No retry can ever succeed, so this is terminal rather than
            // a concurrency conflict.
            Ok(CommandOutcome::Rejected(RejectReason::Validation {
                message: format!("order {} already exists", command.order_id),
            }))
        }
    }
}

/// Cancels an order.
pub struct CancelOrderHandler<S> {
    store: S,
}

impl<S: OrderStore + Clone> CancelOrderHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: OrderStore + Clone> CommandHandler for CancelOrderHandler<S> {
    type Command = CancelOrderCommand;

    async fn handle(
        &self,
        command: &CancelOrderCommand,
        pending_request: LedgerEntry,
    ) -> Result<CommandOutcome, StoreError> {
        tracing::info!(order_id = %command.order_number, "cancelling order");
        apply_transition(&self.store, command.order_number, pending_request, |o| {
            o.set_cancelled_status()
        })
        .await
    }
}

/// Moves an order to stock validation.
pub struct SetAwaitingValidationStatusHandler<S> {
    store: S,
}

impl<S: OrderStore + Clone> SetAwaitingValidationStatusHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: OrderStore + Clone> CommandHandler for SetAwaitingValidationStatusHandler<S> {
    type Command = SetAwaitingValidationStatusCommand;

    async fn handle(
        &self,
        command: &SetAwaitingValidationStatusCommand,
        pending_request: LedgerEntry,
    ) -> Result<CommandOutcome, StoreError> {
        tracing::info!(order_id = %command.order_number, "moving order to stock validation");
        apply_transition(&self.store, command.order_number, pending_request, |o| {
            o.set_awaiting_validation_status()
        })
        .await
    }
}

/// Confirms stock availability for an order.
pub struct SetStockConfirmedStatusHandler<S> {
    store: S,
}

impl<S: OrderStore + Clone> SetStockConfirmedStatusHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: OrderStore + Clone> CommandHandler for SetStockConfirmedStatusHandler<S> {
    type Command = SetStockConfirmedStatusCommand;

    async fn handle(
        &self,
        command: &SetStockConfirmedStatusCommand,
        pending_request: LedgerEntry,
    ) -> Result<CommandOutcome, StoreError> {
        tracing::info!(order_id = %command.order_number, "confirming stock for order");
        apply_transition(&self.store, command.order_number, pending_request, |o| {
            o.set_stock_confirmed_status()
        })
        .await
    }
}

/// Records payment for an order.
pub struct SetPaidOrderStatusHandler<S> {
    store: S,
}

impl<S: OrderStore + Clone> SetPaidOrderStatusHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: OrderStore + Clone> CommandHandler for SetPaidOrderStatusHandler<S> {
    type Command = SetPaidOrderStatusCommand;

    async fn handle(
        &self,
        command: &SetPaidOrderStatusCommand,
        pending_request: LedgerEntry,
    ) -> Result<CommandOutcome, StoreError> {
        tracing::info!(order_id = %command.order_number, "marking order paid");
        apply_transition(&self.store, command.order_number, pending_request, |o| {
            o.set_paid_status()
        })
        .await
    }
}

/// Ships an order.
pub struct ShipOrderHandler<S> {
    store: S,
}

impl<S: OrderStore + Clone> ShipOrderHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: OrderStore + Clone> CommandHandler for ShipOrderHandler<S> {
    type Command = ShipOrderCommand;

    async fn handle(
        &self,
        command: &ShipOrderCommand,
        pending_request: LedgerEntry,
    ) -> Result<CommandOutcome, StoreError> {
        tracing::info!(order_id = %command.order_number, "shipping order");
        apply_transition(&self.store, command.order_number, pending_request, |o| {
            o.set_shipped_status()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{BuyerId, RequestId};
    use domain::{Address, Money, OrderStatus, ProductId};
    use order_store::InMemoryOrderStore;

    use crate::commands::NewOrderItem;

    fn pending(name: &str) -> LedgerEntry {
        LedgerEntry::from_outcome(RequestId::new(), name, &CommandOutcome::Accepted).unwrap()
    }

    fn create_command(order_id: i64) -> CreateOrderCommand {
        CreateOrderCommand {
            order_id: OrderId::new(order_id),
            buyer_id: BuyerId::new(),
            address: Address::new("1 Main St", "Seattle", "WA", "US", "98101"),
            items: vec![NewOrderItem {
                product_id: ProductId::new(1),
                product_name: "Widget".to_string(),
                unit_price: Money::from_cents(1000),
                discount: Money::zero(),
                units: 2,
            }],
            description: None,
        }
    }

    async fn seeded_store(order_id: i64) -> InMemoryOrderStore {
        let store = InMemoryOrderStore::new();
        let handler = CreateOrderHandler::new(store.clone());
        let outcome = handler
            .handle(&create_command(order_id), pending("CreateOrderCommand"))
            .await
            .unwrap();
        assert!(outcome.is_accepted());
        store
    }

    #[tokio::test]
    async fn create_commits_order_and_ledger_entry() {
        let store = InMemoryOrderStore::new();
        let handler = CreateOrderHandler::new(store.clone());

        let entry = pending("CreateOrderCommand");
        let request_id = entry.request_id;
        let outcome = handler.handle(&create_command(1), entry).await.unwrap();

        assert!(outcome.is_accepted());
        assert!(store.load(OrderId::new(1)).await.unwrap().is_some());
        assert!(store.find_request(request_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn create_rejects_invalid_items_without_committing() {
        let store = InMemoryOrderStore::new();
        let handler = CreateOrderHandler::new(store.clone());

        let mut command = create_command(1);
        command.items[0].units = 0;

        let outcome = handler
            .handle(&command, pending("CreateOrderCommand"))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            CommandOutcome::Rejected(RejectReason::Validation { .. })
        ));
        assert!(store.load(OrderId::new(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_over_existing_order_is_terminal() {
        let store = seeded_store(1).await;
        let handler = CreateOrderHandler::new(store.clone());

        let outcome = handler
            .handle(&create_command(1), pending("CreateOrderCommand"))
            .await
            .unwrap();

        // A taken identifier can never be inserted, so the rejection must
        // be one the ledger records rather than a retryable conflict.
        assert!(matches!(
            outcome,
            CommandOutcome::Rejected(RejectReason::Validation { .. })
        ));
        assert!(outcome.is_terminal_rejection());
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn cancel_unknown_order_is_not_found() {
        let store = InMemoryOrderStore::new();
        let handler = CancelOrderHandler::new(store);

        let outcome = handler
            .handle(
                &CancelOrderCommand {
                    order_number: OrderId::new(404),
                },
                pending("CancelOrderCommand"),
            )
            .await
            .unwrap();

        assert_eq!(outcome, CommandOutcome::Rejected(RejectReason::NotFound));
    }

    #[tokio::test]
    async fn ship_requires_paid_status() {
        let store = seeded_store(1).await;
        let handler = ShipOrderHandler::new(store.clone());

        let outcome = handler
            .handle(
                &ShipOrderCommand {
                    order_number: OrderId::new(1),
                },
                pending("ShipOrderCommand"),
            )
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            CommandOutcome::Rejected(RejectReason::InvalidTransition { .. })
        ));

        let record = store.load(OrderId::new(1)).await.unwrap().unwrap();
        let order: Order = record.into_state().unwrap();
        assert_eq!(order.status(), OrderStatus::Submitted);
    }

    #[tokio::test]
    async fn cancel_commits_transition_and_event() {
        let store = seeded_store(1).await;
        let events_before = store.event_count().await;

        let handler = CancelOrderHandler::new(store.clone());
        let outcome = handler
            .handle(
                &CancelOrderCommand {
                    order_number: OrderId::new(1),
                },
                pending("CancelOrderCommand"),
            )
            .await
            .unwrap();

        assert!(outcome.is_accepted());
        let record = store.load(OrderId::new(1)).await.unwrap().unwrap();
        let order: Order = record.into_state().unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(store.event_count().await, events_before + 1);
    }
}
