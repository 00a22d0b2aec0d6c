//! Order aggregate and related types.

mod aggregate;
mod events;
mod item;
mod status;
mod value_objects;

pub use aggregate::Order;
pub use events::{
    OrderAwaitingValidationData, OrderCancelledData, OrderDomainEvent, OrderPaidData,
    OrderShippedData, OrderStartedData, OrderStockConfirmedData, StockItem,
};
pub use item::OrderItem;
pub use status::OrderStatus;
pub use value_objects::{Address, Money, ProductId};

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The requested transition is not legal from the current status.
    #[error("invalid transition: cannot {action} from {from} status")]
    InvalidTransition {
        from: OrderStatus,
        action: &'static str,
    },

    /// An order cannot be placed without line items.
    #[error("order has no items")]
    NoItems,

    /// Line item unit count must be positive.
    #[error("invalid units: {units} (must be greater than 0)")]
    InvalidUnits { units: u32 },

    /// Discount must not be negative or exceed the line total.
    #[error("invalid discount: {discount} cents")]
    InvalidDiscount { discount: i64 },
}
