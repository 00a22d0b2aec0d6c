//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Status transitions:
/// ```text
/// Submitted ──► AwaitingValidation ──► StockConfirmed ──► Paid ──► Shipped
///     │                 │                     │             │
///     └─────────────────┴─────────────────────┴─────────────┴──► Cancelled
/// ```
///
/// `Shipped` and `Cancelled` are terminal; a shipped order can no longer
/// be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order has been placed; line items can still be added.
    #[default]
    Submitted,

    /// Stock availability is being verified.
    AwaitingValidation,

    /// Stock has been confirmed, awaiting payment.
    StockConfirmed,

    /// Payment has been confirmed.
    Paid,

    /// Order has been shipped (terminal status).
    Shipped,

    /// Order was cancelled (terminal status).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if line items can still be added in this status.
    pub fn can_add_items(&self) -> bool {
        matches!(self, OrderStatus::Submitted)
    }

    /// Returns true if stock validation can begin in this status.
    pub fn can_await_validation(&self) -> bool {
        matches!(self, OrderStatus::Submitted)
    }

    /// Returns true if stock can be confirmed in this status.
    pub fn can_confirm_stock(&self) -> bool {
        matches!(self, OrderStatus::AwaitingValidation)
    }

    /// Returns true if payment can be recorded in this status.
    pub fn can_set_paid(&self) -> bool {
        matches!(self, OrderStatus::StockConfirmed)
    }

    /// Returns true if the order can be shipped in this status.
    pub fn can_ship(&self) -> bool {
        matches!(self, OrderStatus::Paid)
    }

    /// Returns true if the order can be cancelled in this status.
    pub fn can_cancel(&self) -> bool {
        matches!(
            self,
            OrderStatus::Submitted
                | OrderStatus::AwaitingValidation
                | OrderStatus::StockConfirmed
                | OrderStatus::Paid
        )
    }

    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Shipped | OrderStatus::Cancelled)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Submitted => "Submitted",
            OrderStatus::AwaitingValidation => "AwaitingValidation",
            OrderStatus::StockConfirmed => "StockConfirmed",
            OrderStatus::Paid => "Paid",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_status_is_submitted() {
        assert_eq!(OrderStatus::default(), OrderStatus::Submitted);
    }

    #[test]
    fn only_submitted_can_add_items() {
        assert!(OrderStatus::Submitted.can_add_items());
        assert!(!OrderStatus::AwaitingValidation.can_add_items());
        assert!(!OrderStatus::StockConfirmed.can_add_items());
        assert!(!OrderStatus::Paid.can_add_items());
        assert!(!OrderStatus::Shipped.can_add_items());
        assert!(!OrderStatus::Cancelled.can_add_items());
    }

    #[test]
    fn only_awaiting_validation_can_confirm_stock() {
        assert!(!OrderStatus::Submitted.can_confirm_stock());
        assert!(OrderStatus::AwaitingValidation.can_confirm_stock());
        assert!(!OrderStatus::StockConfirmed.can_confirm_stock());
        assert!(!OrderStatus::Paid.can_confirm_stock());
        assert!(!OrderStatus::Shipped.can_confirm_stock());
        assert!(!OrderStatus::Cancelled.can_confirm_stock());
    }

    #[test]
    fn only_stock_confirmed_can_set_paid() {
        assert!(!OrderStatus::Submitted.can_set_paid());
        assert!(!OrderStatus::AwaitingValidation.can_set_paid());
        assert!(OrderStatus::StockConfirmed.can_set_paid());
        assert!(!OrderStatus::Paid.can_set_paid());
        assert!(!OrderStatus::Shipped.can_set_paid());
        assert!(!OrderStatus::Cancelled.can_set_paid());
    }

    #[test]
    fn only_paid_can_ship() {
        assert!(!OrderStatus::Submitted.can_ship());
        assert!(!OrderStatus::StockConfirmed.can_ship());
        assert!(OrderStatus::Paid.can_ship());
        assert!(!OrderStatus::Shipped.can_ship());
    }

    #[test]
    fn can_cancel_from_non_terminal_statuses() {
        assert!(OrderStatus::Submitted.can_cancel());
        assert!(OrderStatus::AwaitingValidation.can_cancel());
        assert!(OrderStatus::StockConfirmed.can_cancel());
        assert!(OrderStatus::Paid.can_cancel());
        assert!(!OrderStatus::Shipped.can_cancel());
        assert!(!OrderStatus::Cancelled.can_cancel());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!OrderStatus::Submitted.is_terminal());
        assert!(!OrderStatus::AwaitingValidation.is_terminal());
        assert!(!OrderStatus::StockConfirmed.is_terminal());
        assert!(!OrderStatus::Paid.is_terminal());
        assert!(OrderStatus::Shipped.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(OrderStatus::Submitted.to_string(), "Submitted");
        assert_eq!(
            OrderStatus::AwaitingValidation.to_string(),
            "AwaitingValidation"
        );
        assert_eq!(OrderStatus::StockConfirmed.to_string(), "StockConfirmed");
        assert_eq!(OrderStatus::Paid.to_string(), "Paid");
        assert_eq!(OrderStatus::Shipped.to_string(), "Shipped");
        assert_eq!(OrderStatus::Cancelled.to_string(), "Cancelled");
    }

    #[test]
    fn serialization_roundtrip() {
        let status = OrderStatus::StockConfirmed;
        let json = serde_json::to_string(&status).unwrap();
        let deserialized: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(status, deserialized);
    }
}
