//! Order line items.

use serde::{Deserialize, Serialize};

use super::{Money, OrderError, ProductId};

/// A line item owned by its order.
///
/// Items are immutable from outside the aggregate; unit counts and
/// discounts change only through aggregate-mediated operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    product_id: ProductId,
    product_name: String,
    unit_price: Money,
    discount: Money,
    units: u32,
}

impl OrderItem {
    /// Creates a new order item.
    ///
    /// Fails if the unit count is zero, or if the discount is negative or
    /// exceeds the total price of the line.
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        unit_price: Money,
        discount: Money,
        units: u32,
    ) -> Result<Self, OrderError> {
        if units == 0 {
            return Err(OrderError::InvalidUnits { units });
        }
        if discount.is_negative() || unit_price.multiply(units) < discount {
            return Err(OrderError::InvalidDiscount {
                discount: discount.cents(),
            });
        }

        Ok(Self {
            product_id,
            product_name: product_name.into(),
            unit_price,
            discount,
            units,
        })
    }

    /// Returns the product identifier.
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Returns the product name.
    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    /// Returns the price per unit.
    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// Returns the current discount.
    pub fn discount(&self) -> Money {
        self.discount
    }

    /// Returns the unit count.
    pub fn units(&self) -> u32 {
        self.units
    }

    /// Returns the total price for this line (units * unit price - discount).
    pub fn total(&self) -> Money {
        self.unit_price.multiply(self.units) - self.discount
    }

    /// Adds units to an existing line.
    pub(super) fn add_units(&mut self, units: u32) -> Result<(), OrderError> {
        if units == 0 {
            return Err(OrderError::InvalidUnits { units });
        }
        self.units += units;
        Ok(())
    }

    /// Replaces the discount with a new value.
    pub(super) fn set_new_discount(&mut self, discount: Money) -> Result<(), OrderError> {
        if discount.is_negative() {
            return Err(OrderError::InvalidDiscount {
                discount: discount.cents(),
            });
        }
        self.discount = discount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(units: u32, discount: i64) -> Result<OrderItem, OrderError> {
        OrderItem::new(
            ProductId::new(1),
            "Widget",
            Money::from_cents(1000),
            Money::from_cents(discount),
            units,
        )
    }

    #[test]
    fn new_item_with_valid_fields() {
        let item = widget(2, 100).unwrap();
        assert_eq!(item.units(), 2);
        assert_eq!(item.total().cents(), 1900);
    }

    #[test]
    fn zero_units_rejected() {
        let result = widget(0, 0);
        assert!(matches!(result, Err(OrderError::InvalidUnits { units: 0 })));
    }

    #[test]
    fn negative_discount_rejected() {
        let result = widget(1, -50);
        assert!(matches!(result, Err(OrderError::InvalidDiscount { .. })));
    }

    #[test]
    fn discount_exceeding_total_rejected() {
        let result = widget(1, 1500);
        assert!(matches!(result, Err(OrderError::InvalidDiscount { .. })));
    }

    #[test]
    fn add_units_accumulates() {
        let mut item = widget(2, 0).unwrap();
        item.add_units(3).unwrap();
        assert_eq!(item.units(), 5);
        assert_eq!(item.total().cents(), 5000);
    }

    #[test]
    fn add_zero_units_rejected() {
        let mut item = widget(2, 0).unwrap();
        assert!(matches!(
            item.add_units(0),
            Err(OrderError::InvalidUnits { units: 0 })
        ));
    }

    #[test]
    fn set_new_discount_replaces_value() {
        let mut item = widget(2, 100).unwrap();
        item.set_new_discount(Money::from_cents(300)).unwrap();
        assert_eq!(item.discount().cents(), 300);
    }

    #[test]
    fn serialization_roundtrip() {
        let item = widget(2, 100).unwrap();
        let json = serde_json::to_string(&item).unwrap();
        let deserialized: OrderItem = serde_json::from_str(&json).unwrap();
        assert_eq!(item, deserialized);
    }
}
