//! Terminal checkout pages.
//!
//! Neither page calls the backend. The success page sends the shopper back to
//! browsing after a short delay; the cancel page offers the way back to the
//! cart. Cancelling needs no cleanup because no order was created.

use std::time::Duration;

use metadots_core::OrderId;
use serde::Serialize;

pub const SUCCESS_MESSAGE: &str = "Payment successful, thank you! We'll email you the receipt and order details shortly.";
pub const CANCEL_MESSAGE: &str =
    "Your payment was canceled. You can try again or continue shopping.";

/// Model for `/checkout/success`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuccessPage {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    pub redirect_to: &'static str,
    #[serde(rename = "redirect_after_ms", serialize_with = "as_millis")]
    pub redirect_after: Duration,
}

impl SuccessPage {
    #[must_use]
    pub const fn new(order_id: Option<OrderId>, redirect_after: Duration) -> Self {
        Self {
            message: SUCCESS_MESSAGE,
            order_id,
            redirect_to: "/products",
            redirect_after,
        }
    }

    /// Value for a `Refresh` header: whole seconds, rounded up, then the target.
    #[must_use]
    pub fn refresh_header(&self) -> String {
        let millis = self.redirect_after.as_millis();
        let secs = millis.div_ceil(1000);
        format!("{secs};url={}", self.redirect_to)
    }
}

/// Model for `/checkout/cancel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelPage {
    pub message: &'static str,
    pub back_to: &'static str,
}

impl Default for CancelPage {
    fn default() -> Self {
        Self {
            message: CANCEL_MESSAGE,
            back_to: "/cart",
        }
    }
}

fn as_millis<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
}
