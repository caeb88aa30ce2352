//! Cart types.
//!
//! The cart has no client-visible identity: the backend addresses it through
//! the caller's session. The client never treats its copy as authoritative.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;
use super::timestamp;

/// One product/quantity/price entry in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price snapshot taken when the line was added.
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl CartLine {
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, quantity: u32, price: Price) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            price,
            name: None,
        }
    }

    /// `price * quantity` for this line.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// The caller's cart as returned by `GET /api/cart`.
///
/// Lines are unique by `product_id`; the backend merges re-adds into the
/// existing line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartLine>,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Cart {
    /// An empty cart, used whenever hydration fails open.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of `price * quantity` over every line. Recomputed on every call.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartLine::subtotal).sum()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }

    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.items.iter().find(|line| &line.product_id == product_id)
    }

    /// Drop the line for `product_id`, returning it if it was present.
    pub fn remove_line(&mut self, product_id: &ProductId) -> Option<CartLine> {
        let pos = self
            .items
            .iter()
            .position(|line| &line.product_id == product_id)?;
        Some(self.items.remove(pos))
    }

    /// Set the quantity of an existing line. Returns false if no line matched.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> bool {
        match self
            .items
            .iter_mut()
            .find(|line| &line.product_id == product_id)
        {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_total_of_empty_cart_is_zero() {
        let cart = Cart::empty();
        assert_eq!(cart.total(), Price::ZERO);
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_total_single_line() {
        let cart = Cart {
            items: vec![CartLine::new("p1", 3, Price::from_units(250))],
            updated_at: None,
        };
        assert_eq!(cart.total(), Price::from_units(750));
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_total_many_lines() {
        let cart = Cart {
            items: vec![
                CartLine::new("p1", 2, Price::from_units(100)),
                CartLine::new("p2", 1, Price::new(Decimal::new(1999, 2))),
                CartLine::new("p3", 4, Price::from_units(5)),
            ],
            updated_at: None,
        };
        assert_eq!(cart.total(), Price::new(Decimal::new(23999, 2)));
        assert_eq!(cart.item_count(), 7);
    }

    #[test]
    fn test_remove_line_by_identity() {
        let mut cart = Cart {
            items: vec![
                CartLine::new("p1", 1, Price::from_units(10)),
                CartLine::new("p2", 1, Price::from_units(20)),
            ],
            updated_at: None,
        };
        let removed = cart.remove_line(&ProductId::new("p1")).unwrap();
        assert_eq!(removed.product_id.as_str(), "p1");
        assert_eq!(cart.items.len(), 1);
        assert!(cart.remove_line(&ProductId::new("missing")).is_none());
    }

    #[test]
    fn test_deserializes_backend_shape() {
        let json = r#"{"items":[{"product_id":"abc","quantity":2,"price":1500}],"updated_at":"2024-05-01T10:00:00"}"#;
        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.items[0].subtotal(), Price::from_units(3000));
        assert!(cart.line(&ProductId::new("abc")).is_some());
        assert!(cart.updated_at.is_some());
    }

    #[test]
    fn test_oversized_backend_price_does_not_panic() {
        let json = r#"{"items":[{"product_id":"big","quantity":2,"price":"50000000000000000000000000000"}]}"#;
        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.total(), Price::new(rust_decimal::Decimal::MAX));
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_missing_items_is_empty() {
        let cart: Cart = serde_json::from_str("{}").unwrap();
        assert!(cart.is_empty());
    }
}
