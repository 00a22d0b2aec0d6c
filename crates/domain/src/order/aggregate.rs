//! Order aggregate implementation.

use common::{BuyerId, OrderId};
use serde::{Deserialize, Serialize};

use crate::event::AggregateRoot;

use super::{
    Address, Money, OrderDomainEvent, OrderError, OrderItem, OrderStatus, ProductId,
};

/// Order aggregate root.
///
/// The aggregate is the sole authority over its status: every mutation goes
/// through a transition method that checks the state machine and, on
/// success, queues exactly one domain event. The aggregate performs no I/O;
/// queued events are drained by the repository via [`take_events`](Order::take_events)
/// and committed atomically with the state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    buyer_id: BuyerId,
    address: Address,

    /// Human-readable note recording status-change context.
    description: String,

    status: OrderStatus,
    items: Vec<OrderItem>,

    /// Events queued by transitions, drained at staging time.
    #[serde(skip)]
    pending_events: Vec<OrderDomainEvent>,
}

// Query methods
impl Order {
    /// Returns the order identifier.
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the buyer identifier.
    pub fn buyer_id(&self) -> BuyerId {
        self.buyer_id
    }

    /// Returns the shipping address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Returns the current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the status-change description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the line items in insertion order.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns the order total across all lines.
    pub fn total(&self) -> Money {
        self.items
            .iter()
            .fold(Money::zero(), |acc, item| acc + item.total())
    }

    /// Returns true if the order is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Transition methods
impl Order {
    /// Places a new order in `Submitted` status.
    ///
    /// An order with no line items cannot be created. Duplicate product
    /// lines in the input are merged the same way [`add_order_item`]
    /// merges them. Raises `OrderStarted`.
    ///
    /// [`add_order_item`]: Order::add_order_item
    pub fn place(
        id: OrderId,
        buyer_id: BuyerId,
        address: Address,
        items: Vec<OrderItem>,
        description: Option<String>,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }

        let mut order = Self {
            id,
            buyer_id,
            address,
            description: description.unwrap_or_else(|| "Order submitted".to_string()),
            status: OrderStatus::Submitted,
            items: Vec::with_capacity(items.len()),
            pending_events: Vec::new(),
        };

        for item in items {
            order.add_order_item(item)?;
        }

        order
            .pending_events
            .push(OrderDomainEvent::order_started(id, buyer_id));

        Ok(order)
    }

    /// Appends a line item, merging with an existing line for the same
    /// product.
    ///
    /// When merging, the unit counts are summed and the existing discount
    /// is replaced if the incoming one is higher. Legal only while the
    /// order is still in `Submitted`.
    pub fn add_order_item(&mut self, item: OrderItem) -> Result<(), OrderError> {
        if !self.status.can_add_items() {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                action: "add order item",
            });
        }

        if let Some(existing) = self.find_item_mut(item.product_id()) {
            if item.discount() > existing.discount() {
                existing.set_new_discount(item.discount())?;
            }
            existing.add_units(item.units())?;
        } else {
            self.items.push(item);
        }

        Ok(())
    }

    /// Moves the order to `AwaitingValidation` and raises
    /// `OrderAwaitingValidation` carrying the stock to verify.
    pub fn set_awaiting_validation_status(&mut self) -> Result<(), OrderError> {
        if !self.status.can_await_validation() {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                action: "set awaiting validation status",
            });
        }

        self.status = OrderStatus::AwaitingValidation;
        self.description = "Awaiting stock validation".to_string();
        self.pending_events
            .push(OrderDomainEvent::awaiting_validation(self.id, &self.items));

        Ok(())
    }

    /// Confirms stock availability and raises `OrderStockConfirmed`.
    pub fn set_stock_confirmed_status(&mut self) -> Result<(), OrderError> {
        if !self.status.can_confirm_stock() {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                action: "set stock confirmed status",
            });
        }

        self.status = OrderStatus::StockConfirmed;
        self.description =
            "All the items were confirmed with available stock".to_string();
        self.pending_events
            .push(OrderDomainEvent::stock_confirmed(self.id));

        Ok(())
    }

    /// Records payment and raises `OrderPaid`.
    ///
    /// Legal only from `StockConfirmed`. Calling this on an already-paid
    /// order fails with an invalid transition: re-delivery of the same
    /// payment command is absorbed by the request ledger, so a distinct
    /// request paying a paid order is a protocol error.
    pub fn set_paid_status(&mut self) -> Result<(), OrderError> {
        if !self.status.can_set_paid() {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                action: "set paid status",
            });
        }

        self.status = OrderStatus::Paid;
        self.description = "The payment was performed".to_string();
        self.pending_events
            .push(OrderDomainEvent::order_paid(self.id, self.total()));

        Ok(())
    }

    /// Ships the order and raises `OrderShipped`. Legal only from `Paid`.
    pub fn set_shipped_status(&mut self) -> Result<(), OrderError> {
        if !self.status.can_ship() {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                action: "set shipped status",
            });
        }

        self.status = OrderStatus::Shipped;
        self.description = "The order was shipped".to_string();
        self.pending_events
            .push(OrderDomainEvent::order_shipped(self.id));

        Ok(())
    }

    /// Cancels the order and raises `OrderCancelled`.
    ///
    /// Legal from any non-terminal status; a shipped order can no longer
    /// be cancelled.
    pub fn set_cancelled_status(&mut self) -> Result<(), OrderError> {
        if !self.status.can_cancel() {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                action: "set cancelled status",
            });
        }

        self.status = OrderStatus::Cancelled;
        self.description = "The order was cancelled".to_string();
        self.pending_events
            .push(OrderDomainEvent::order_cancelled(self.id));

        Ok(())
    }

    /// Drains the events queued by transitions since the last drain.
    pub fn take_events(&mut self) -> Vec<OrderDomainEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn find_item_mut(&mut self, product_id: ProductId) -> Option<&mut OrderItem> {
        self.items
            .iter_mut()
            .find(|item| item.product_id() == product_id)
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;
    type Event = OrderDomainEvent;

    fn aggregate_id(&self) -> OrderId {
        self.id
    }

    fn take_events(&mut self) -> Vec<OrderDomainEvent> {
        Order::take_events(self)
    }
}
