//! Checkout wire types.
//!
//! Two endpoints complete a cart:
//!
//! - `POST /api/checkout` places the order directly and answers with a
//!   [`CheckoutReceipt`].
//! - `POST /api/payments/create-checkout-session` answers with a
//!   [`CheckoutSession`] whose `url` is either an external payment page or a
//!   local (simulated) success page.

use serde::{Deserialize, Serialize};

use super::cart::{Cart, CartLine};
use super::id::{OrderId, ProductId};
use super::price::Price;

/// One line of a checkout snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl From<&CartLine> for CheckoutItem {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            price: line.price,
            name: line.name.clone(),
        }
    }
}

/// Snapshot the cart's lines for submission.
fn snapshot(cart: &Cart) -> Vec<CheckoutItem> {
    cart.items.iter().map(CheckoutItem::from).collect()
}

/// Body of `POST /api/checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItem>,
}

impl CheckoutRequest {
    #[must_use]
    pub fn from_cart(cart: &Cart) -> Self {
        Self {
            items: snapshot(cart),
        }
    }
}

/// Body of `POST /api/payments/create-checkout-session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSessionRequest {
    pub items: Vec<CheckoutItem>,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutSessionRequest {
    #[must_use]
    pub fn from_cart(
        cart: &Cart,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        Self {
            items: snapshot(cart),
            success_url: success_url.into(),
            cancel_url: cancel_url.into(),
        }
    }
}

/// Response of `create-checkout-session`.
///
/// `local` is an explicit hint from the backend that `url` points back into
/// the application (simulated payment). When absent the client classifies the
/// URL itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    #[serde(default, alias = "simulated", skip_serializing_if = "Option::is_none")]
    pub local: Option<bool>,
}

/// Response of `POST /api/checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    pub order_id: OrderId,
    #[serde(default)]
    pub message: Option<String>,
}
