//! Order domain events.

use chrono::{DateTime, Utc};
use common::{BuyerId, OrderId};
use serde::{Deserialize, Serialize};

use crate::event::DomainEvent;

use super::{Money, OrderItem, ProductId};

/// Events raised by the order aggregate.
///
/// Each legal status transition raises exactly one event; the repository
/// drains them into the integration event log so they commit atomically
/// with the state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderDomainEvent {
    /// Order was placed.
    OrderStarted(OrderStartedData),

    /// Order moved to stock validation.
    OrderAwaitingValidation(OrderAwaitingValidationData),

    /// Stock availability was confirmed.
    OrderStockConfirmed(OrderStockConfirmedData),

    /// Payment was confirmed.
    OrderPaid(OrderPaidData),

    /// Order was shipped.
    OrderShipped(OrderShippedData),

    /// Order was cancelled.
    OrderCancelled(OrderCancelledData),
}

impl DomainEvent for OrderDomainEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderDomainEvent::OrderStarted(_) => "OrderStarted",
            OrderDomainEvent::OrderAwaitingValidation(_) => "OrderAwaitingValidation",
            OrderDomainEvent::OrderStockConfirmed(_) => "OrderStockConfirmed",
            OrderDomainEvent::OrderPaid(_) => "OrderPaid",
            OrderDomainEvent::OrderShipped(_) => "OrderShipped",
            OrderDomainEvent::OrderCancelled(_) => "OrderCancelled",
        }
    }
}

// Convenience constructors
impl OrderDomainEvent {
    /// Creates an OrderStarted event.
    pub fn order_started(order_id: OrderId, buyer_id: BuyerId) -> Self {
        OrderDomainEvent::OrderStarted(OrderStartedData {
            order_id,
            buyer_id,
            occurred_at: Utc::now(),
        })
    }

    /// Creates an OrderAwaitingValidation event carrying the stock to verify.
    pub fn awaiting_validation(order_id: OrderId, items: &[OrderItem]) -> Self {
        OrderDomainEvent::OrderAwaitingValidation(OrderAwaitingValidationData {
            order_id,
            stock_items: items
                .iter()
                .map(|item| StockItem {
                    product_id: item.product_id(),
                    units: item.units(),
                })
                .collect(),
            occurred_at: Utc::now(),
        })
    }

    /// Creates an OrderStockConfirmed event.
    pub fn stock_confirmed(order_id: OrderId) -> Self {
        OrderDomainEvent::OrderStockConfirmed(OrderStockConfirmedData {
            order_id,
            occurred_at: Utc::now(),
        })
    }

    /// Creates an OrderPaid event.
    pub fn order_paid(order_id: OrderId, total: Money) -> Self {
        OrderDomainEvent::OrderPaid(OrderPaidData {
            order_id,
            total,
            occurred_at: Utc::now(),
        })
    }

    /// Creates an OrderShipped event.
    pub fn order_shipped(order_id: OrderId) -> Self {
        OrderDomainEvent::OrderShipped(OrderShippedData {
            order_id,
            occurred_at: Utc::now(),
        })
    }

    /// Creates an OrderCancelled event.
    pub fn order_cancelled(order_id: OrderId) -> Self {
        OrderDomainEvent::OrderCancelled(OrderCancelledData {
            order_id,
            occurred_at: Utc::now(),
        })
    }
}

/// Data for OrderStarted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStartedData {
    pub order_id: OrderId,
    pub buyer_id: BuyerId,
    pub occurred_at: DateTime<Utc>,
}

/// A product/unit pair forwarded for stock verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockItem {
    pub product_id: ProductId,
    pub units: u32,
}

/// Data for OrderAwaitingValidation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAwaitingValidationData {
    pub order_id: OrderId,
    pub stock_items: Vec<StockItem>,
    pub occurred_at: DateTime<Utc>,
}

/// Data for OrderStockConfirmed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStockConfirmedData {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Data for OrderPaid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPaidData {
    pub order_id: OrderId,
    pub total: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Data for OrderShipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderShippedData {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Data for OrderCancelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancelledData {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}
