//! Cart state and synchronisation.
//!
//! The backend is the source of truth. A [`CartStore`] is one view's copy of
//! the cart: hydrated on mount (failing open to an empty cart), mutated only
//! after the backend confirms, and announced to other views through
//! [`StoreEvent::CartChanged`].
//!
//! [`CartBadge`] is the independently mounted "items in cart" display that
//! listens for those announcements.

mod badge;

pub use badge::CartBadge;

use metadots_core::{Cart, CartLine, Price, ProductId};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::api::{ApiClient, ApiError, Session};
use crate::events::{EventBus, StoreEvent};
use crate::mount::{MountHandle, Mounted};

/// Errors from cart mutations.
#[derive(Debug, thiserror::Error)]
pub enum CartError {
    #[error("only {available} of {product_id} in stock, requested {requested}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: i64,
    },

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CartError {
    /// Text suitable for a toast.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

/// Outcome of loading the cart into a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hydration {
    /// The fetched cart was applied.
    Applied,
    /// The fetch failed and the view shows an empty cart.
    FellBackToEmpty,
    /// The view was unmounted before the fetch finished; nothing changed.
    Discarded,
}

/// Fetch the cart and apply it through `handle`, failing open.
async fn hydrate(api: ApiClient, session: Session, handle: MountHandle<Cart>) -> Hydration {
    let (cart, outcome) = match api.get_cart(&session).await {
        Ok(cart) => (cart, Hydration::Applied),
        Err(e) => {
            warn!(error = %e, "Cart fetch failed, showing empty cart");
            (Cart::empty(), Hydration::FellBackToEmpty)
        }
    };

    if handle.apply(|state| *state = cart) {
        outcome
    } else {
        debug!("Cart fetch finished after unmount, discarding");
        Hydration::Discarded
    }
}

/// One view's copy of the caller's cart.
///
/// Dropping the store unmounts it.
#[derive(Debug)]
pub struct CartStore {
    api: ApiClient,
    events: EventBus,
    session: Session,
    state: Mounted<Cart>,
    stock_check: bool,
}

impl CartStore {
    fn unhydrated(api: ApiClient, events: EventBus, session: Session) -> Self {
        Self {
            api,
            events,
            session,
            state: Mounted::new(Cart::empty()),
            stock_check: true,
        }
    }

    /// Mount and hydrate from the backend before returning.
    pub async fn mount(api: ApiClient, events: EventBus, session: Session) -> Self {
        let store = Self::unhydrated(api, events, session);
        store.refresh().await;
        store
    }

    /// Mount immediately, hydrating in the background.
    ///
    /// The handle resolves to [`Hydration::Discarded`] if the store is
    /// dropped before the fetch completes.
    #[must_use]
    pub fn mount_deferred(
        api: ApiClient,
        events: EventBus,
        session: Session,
    ) -> (Self, JoinHandle<Hydration>) {
        let store = Self::unhydrated(api, events, session);
        let task = tokio::spawn(hydrate(
            store.api.clone(),
            store.session.clone(),
            store.state.handle(),
        ));
        (store, task)
    }

    /// Enable or disable the best-effort stock pre-check on `add`.
    #[must_use]
    pub fn with_stock_check(mut self, enabled: bool) -> Self {
        self.stock_check = enabled;
        self
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// A copy of the current cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.state.snapshot()
    }

    /// `Σ price × quantity`, recomputed on every call.
    #[must_use]
    pub fn total(&self) -> Price {
        self.state.read().total()
    }

    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.state.read().item_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().is_empty()
    }

    /// Refetch the cart, failing open to empty.
    pub async fn refresh(&self) -> Hydration {
        hydrate(self.api.clone(), self.session.clone(), self.state.handle()).await
    }

    /// Add `quantity` of a product at `price`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for zero, [`CartError::InsufficientStock`]
    /// when the pre-check shows too little stock, or the backend's error.
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        product_id: &ProductId,
        quantity: u32,
        price: Price,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        if self.stock_check {
            self.check_stock(product_id, quantity).await?;
        }

        let line = CartLine::new(product_id.clone(), quantity, price);
        self.api.add_to_cart(&self.session, &line).await?;

        self.events.publish(StoreEvent::CartChanged);
        self.refresh().await;
        Ok(())
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns the backend's error; local state is left untouched.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        product_id: &ProductId,
        quantity: u32,
        price: Price,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove(product_id).await;
        }

        let line = CartLine::new(product_id.clone(), quantity, price);
        self.api.update_cart(&self.session, &line).await?;

        self.state.write().set_quantity(product_id, quantity);
        self.events.publish(StoreEvent::CartChanged);
        Ok(())
    }

    /// Remove a product's line.
    ///
    /// The local line is dropped only after the backend confirms.
    ///
    /// # Errors
    ///
    /// Returns the backend's error; local state is left untouched.
    #[instrument(skip(self))]
    pub async fn remove(&self, product_id: &ProductId) -> Result<(), CartError> {
        self.api.remove_from_cart(&self.session, product_id).await?;

        self.state.write().remove_line(product_id);
        self.events.publish(StoreEvent::CartChanged);
        Ok(())
    }

    /// Best-effort stock check. Only an explicit shortage blocks the add.
    async fn check_stock(&self, product_id: &ProductId, quantity: u32) -> Result<(), CartError> {
        match self.api.get_product(&self.session, product_id).await {
            Ok(product) if !product.has_stock_for(quantity) => Err(CartError::InsufficientStock {
                product_id: product_id.clone(),
                requested: quantity,
                available: product.stock,
            }),
            Ok(_) => Ok(()),
            Err(e) => {
                debug!(error = %e, "Stock pre-check failed, deferring to backend");
                Ok(())
            }
        }
    }
}
