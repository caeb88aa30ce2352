//! Order types.
//!
//! Orders are immutable from the client's point of view. Older documents may
//! lack fields, so everything except the id is defaulted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{OrderId, ProductId, UserId};
use super::price::Price;
use super::status::PaymentStatus;
use super::timestamp;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub total_amount: Price,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub created_at: Option<DateTime<Utc>>,
    /// Set on orders produced by the simulated payment flow.
    #[serde(default)]
    pub simulated: bool,
}

impl Order {
    /// Total number of units in the order.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

/// Response of `GET /api/orders/me` and `GET /api/orders/admin`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderList {
    #[serde(default)]
    pub orders: Vec<Order>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_order_list() {
        let json = r#"{"orders":[{
            "id":"o1","user_id":"u1",
            "items":[{"product_id":"p1","quantity":2,"price":10.5,"name":"Mug"},
                     {"product_id":null,"quantity":1,"price":4,"name":null}],
            "total_amount":25.0,"payment_status":"paid",
            "created_at":"2024-05-01T10:00:00","simulated":true}]}"#;
        let list: OrderList = serde_json::from_str(json).unwrap();
        let order = &list.orders[0];
        assert_eq!(order.item_count(), 3);
        assert!(order.payment_status.is_settled());
        assert!(order.simulated);
        assert!(order.created_at.is_some());
        assert!(order.items[1].product_id.is_none());
        assert_eq!(order.total_amount.to_string(), "25.00");
    }

    #[test]
    fn test_sparse_order_defaults() {
        let order: Order = serde_json::from_str(r#"{"id":"o2"}"#).unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.total_amount, Price::ZERO);
        assert!(!order.simulated);
    }
}
