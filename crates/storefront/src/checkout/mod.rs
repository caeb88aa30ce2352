//! Checkout state machine.
//!
//! ```text
//! Idle ─▶ Submitting ─┬─▶ ExternalRedirect{url}   (control leaves the app)
//!                     ├─▶ LocalSuccess{order_id} ─▶ Resolved{order_id}
//!                     └─▶ Idle                    (on any error)
//! ExternalRedirect ─▶ Resolved | Canceled        (via the return pages)
//! ```
//!
//! The client never clears the cart itself. A local completion publishes
//! [`StoreEvent::CartChanged`] and every mounted cart view refetches.

mod classify;
mod pages;

pub use classify::{Destination, UrlClassifier};
pub use pages::{CANCEL_MESSAGE, CancelPage, SUCCESS_MESSAGE, SuccessPage};

use std::sync::{Mutex, MutexGuard, PoisonError};

use metadots_core::{Cart, CheckoutRequest, CheckoutSessionRequest, OrderId};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::api::{ApiClient, ApiError, Session};
use crate::events::{EventBus, StoreEvent};

pub const SUCCESS_PATH: &str = "/checkout/success";
pub const CANCEL_PATH: &str = "/checkout/cancel";

/// Errors from a checkout submission. The cart is never modified.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("your cart is empty")]
    EmptyCart,

    #[error("checkout already in progress")]
    InProgress,

    #[error("invalid checkout URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CheckoutError {
    /// Text suitable for a toast.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

/// Where a checkout flow stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CheckoutPhase {
    #[default]
    Idle,
    Submitting,
    /// Navigate to `url`; the payment provider takes over.
    ExternalRedirect { url: Url },
    /// The order exists; the shopper is sent to the success page.
    LocalSuccess { order_id: Option<OrderId> },
    Resolved { order_id: Option<OrderId> },
    Canceled,
}

impl CheckoutPhase {
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting)
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved { .. } | Self::Canceled)
    }
}

/// How the shopper came back from the payment page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutReturn {
    Success { order_id: Option<OrderId> },
    Cancel,
}

/// One shopper's checkout.
///
/// Shared by reference between the "place order" and "simulate payment"
/// actions; a second submission while one is in flight is rejected.
#[derive(Debug)]
pub struct CheckoutFlow {
    api: ApiClient,
    events: EventBus,
    classifier: UrlClassifier,
    session: Session,
    phase: Mutex<CheckoutPhase>,
}

/// Holds the flow in `Submitting`; falls back to `Idle` unless finished.
///
/// Covers both error returns and a dropped (cancelled) submission future.
struct SubmitGuard<'a> {
    phase: &'a Mutex<CheckoutPhase>,
    armed: bool,
}

impl SubmitGuard<'_> {
    fn finish(mut self, next: CheckoutPhase) -> CheckoutPhase {
        self.armed = false;
        *lock(self.phase) = next.clone();
        next
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut phase = lock(self.phase);
            if phase.is_submitting() {
                debug!("Checkout submission abandoned, back to idle");
                *phase = CheckoutPhase::Idle;
            }
        }
    }
}

fn lock(phase: &Mutex<CheckoutPhase>) -> MutexGuard<'_, CheckoutPhase> {
    phase.lock().unwrap_or_else(PoisonError::into_inner)
}

/// `order_id` from a local success URL's query, if present.
fn order_id_from_url(url: &Url) -> Option<OrderId> {
    url.query_pairs()
        .find(|(key, value)| key == "order_id" && !value.is_empty())
        .map(|(_, value)| OrderId::new(value.into_owned()))
}

impl CheckoutFlow {
    #[must_use]
    pub fn new(api: ApiClient, events: EventBus, classifier: UrlClassifier, session: Session) -> Self {
        Self {
            api,
            events,
            classifier,
            session,
            phase: Mutex::new(CheckoutPhase::Idle),
        }
    }

    #[must_use]
    pub fn phase(&self) -> CheckoutPhase {
        lock(&self.phase).clone()
    }

    /// Whether the submit control should be disabled.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        lock(&self.phase).is_submitting()
    }

    #[must_use]
    pub const fn classifier(&self) -> &UrlClassifier {
        &self.classifier
    }

    fn begin(&self, cart: &Cart) -> Result<SubmitGuard<'_>, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        self.claim()
    }

    fn claim(&self) -> Result<SubmitGuard<'_>, CheckoutError> {
        let mut phase = lock(&self.phase);
        if phase.is_submitting() {
            return Err(CheckoutError::InProgress);
        }
        *phase = CheckoutPhase::Submitting;
        Ok(SubmitGuard {
            phase: &self.phase,
            armed: true,
        })
    }

    /// Create a checkout session for `cart` and route on the returned URL.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::EmptyCart`] without any request, [`CheckoutError::InProgress`]
    /// while another submission is running, or the backend/URL error. On error
    /// the flow is back in `Idle` and the cart is untouched.
    #[instrument(skip(self, cart), fields(lines = cart.items.len()))]
    pub async fn place_order(&self, cart: &Cart) -> Result<CheckoutPhase, CheckoutError> {
        let guard = self.begin(cart)?;
        self.open_session(guard, cart).await
    }

    /// [`CheckoutFlow::place_order`] on the cart as the backend holds it now.
    ///
    /// The flow enters `Submitting` before the cart is fetched, so a second
    /// submission racing this one is rejected even while the fetch is slow.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::InProgress`] without any request, the cart fetch
    /// error, [`CheckoutError::EmptyCart`], or the session error.
    #[instrument(skip(self))]
    pub async fn place_current_order(&self) -> Result<CheckoutPhase, CheckoutError> {
        let guard = self.claim()?;
        let cart = self.fetch_cart().await?;
        self.open_session(guard, &cart).await
    }

    async fn fetch_cart(&self) -> Result<Cart, CheckoutError> {
        let cart = self.api.get_cart(&self.session).await?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        Ok(cart)
    }

    async fn open_session(
        &self,
        guard: SubmitGuard<'_>,
        cart: &Cart,
    ) -> Result<CheckoutPhase, CheckoutError> {
        let success_url = self.classifier.app_url(SUCCESS_PATH)?;
        let cancel_url = self.classifier.app_url(CANCEL_PATH)?;
        let request =
            CheckoutSessionRequest::from_cart(cart, success_url.as_str(), cancel_url.as_str());

        let checkout = self
            .api
            .create_checkout_session(&self.session, &request)
            .await
            .inspect_err(|e| warn!(error = %e, "Checkout session creation failed"))?;

        let next = match self.classifier.classify(&checkout.url, checkout.local)? {
            Destination::External(url) => {
                info!(url = %url, "Redirecting to external checkout");
                CheckoutPhase::ExternalRedirect { url }
            }
            Destination::Local(url) => {
                let order_id = checkout.order_id.or_else(|| order_id_from_url(&url));
                info!(order_id = ?order_id, "Checkout completed locally");
                self.events.publish(StoreEvent::CartChanged);
                CheckoutPhase::LocalSuccess { order_id }
            }
        };
        Ok(guard.finish(next))
    }

    /// Place the order directly (simulated payment).
    ///
    /// # Errors
    ///
    /// Same as [`CheckoutFlow::place_order`].
    #[instrument(skip(self, cart), fields(lines = cart.items.len()))]
    pub async fn simulate_payment(&self, cart: &Cart) -> Result<CheckoutPhase, CheckoutError> {
        let guard = self.begin(cart)?;
        self.pay_directly(guard, cart).await
    }

    /// [`CheckoutFlow::simulate_payment`] on the backend's current cart.
    ///
    /// # Errors
    ///
    /// Same as [`CheckoutFlow::place_current_order`].
    #[instrument(skip(self))]
    pub async fn simulate_current_payment(&self) -> Result<CheckoutPhase, CheckoutError> {
        let guard = self.claim()?;
        let cart = self.fetch_cart().await?;
        self.pay_directly(guard, &cart).await
    }

    async fn pay_directly(
        &self,
        guard: SubmitGuard<'_>,
        cart: &Cart,
    ) -> Result<CheckoutPhase, CheckoutError> {
        let receipt = self
            .api
            .checkout(&self.session, &CheckoutRequest::from_cart(cart))
            .await
            .inspect_err(|e| warn!(error = %e, "Simulated checkout failed"))?;

        info!(order_id = %receipt.order_id, "Simulated checkout completed");
        self.events.publish(StoreEvent::CartChanged);
        Ok(guard.finish(CheckoutPhase::LocalSuccess {
            order_id: Some(receipt.order_id),
        }))
    }

    /// Record how the shopper returned. No backend call.
    pub fn resolve(&self, outcome: CheckoutReturn) -> CheckoutPhase {
        let mut phase = lock(&self.phase);
        let next = match outcome {
            CheckoutReturn::Success { order_id } => {
                let order_id = order_id.or_else(|| match &*phase {
                    CheckoutPhase::LocalSuccess { order_id } => order_id.clone(),
                    _ => None,
                });
                CheckoutPhase::Resolved { order_id }
            }
            CheckoutReturn::Cancel => CheckoutPhase::Canceled,
        };
        *phase = next.clone();
        next
    }
}
