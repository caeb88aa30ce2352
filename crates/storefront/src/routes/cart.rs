//! Cart route handlers.
//!
//! Mutations answer with `HX-Trigger: cart:changed` so every cart view in
//! the browser (the count badge included) refetches on its own.

use axum::{
    Form, Json,
    extract::State,
    response::{AppendHeaders, IntoResponse},
};
use metadots_core::{CartLine, Price, ProductId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::cart::CartStore;
use crate::error::Result;
use crate::events::StoreEvent;
use crate::middleware::RequestSession;
use crate::state::AppState;

const HX_TRIGGER: &str = "HX-Trigger";

/// Cart page model.
#[derive(Debug, Serialize)]
pub struct CartPage {
    pub items: Vec<CartLine>,
    pub total: Price,
    pub item_count: u64,
    pub can_checkout: bool,
}

impl From<&CartStore> for CartPage {
    fn from(store: &CartStore) -> Self {
        let cart = store.cart();
        Self {
            total: cart.total(),
            item_count: cart.item_count(),
            can_checkout: !cart.is_empty(),
            items: cart.items,
        }
    }
}

/// Cart count badge model.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u64,
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
    pub price: Price,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Price,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
}

async fn mount(state: &AppState, session: crate::api::Session) -> CartStore {
    CartStore::mount(state.api().clone(), state.events().clone(), session).await
}

fn cart_changed() -> AppendHeaders<[(&'static str, &'static str); 1]> {
    AppendHeaders([(HX_TRIGGER, StoreEvent::CartChanged.name())])
}

/// Display the cart. A failed fetch shows an empty cart.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    RequestSession(session): RequestSession,
) -> Json<CartPage> {
    let store = mount(&state, session).await;
    Json(CartPage::from(&store))
}

/// Add an item and return the new count.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    RequestSession(session): RequestSession,
    Form(form): Form<AddToCartForm>,
) -> Result<impl IntoResponse> {
    let store = mount(&state, session).await;
    store
        .add(&form.product_id, form.quantity.unwrap_or(1), form.price)
        .await?;

    Ok((
        cart_changed(),
        Json(CartCount {
            count: store.item_count(),
        }),
    ))
}

/// Change a line's quantity (zero removes it).
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    RequestSession(session): RequestSession,
    Form(form): Form<UpdateCartForm>,
) -> Result<impl IntoResponse> {
    let store = mount(&state, session).await;
    store
        .update(&form.product_id, form.quantity, form.price)
        .await?;

    Ok((cart_changed(), Json(CartPage::from(&store))))
}

/// Remove a line.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    RequestSession(session): RequestSession,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<impl IntoResponse> {
    let store = mount(&state, session).await;
    store.remove(&form.product_id).await?;

    Ok((cart_changed(), Json(CartPage::from(&store))))
}

/// Cart count badge. A failed fetch shows zero.
#[instrument(skip(state, session))]
pub async fn count(
    State(state): State<AppState>,
    RequestSession(session): RequestSession,
) -> Json<CartCount> {
    let count = match state.api().get_cart(&session).await {
        Ok(cart) => cart.item_count(),
        Err(e) => {
            tracing::warn!(error = %e, "Cart count fetch failed, showing 0");
            0
        }
    };
    Json(CartCount { count })
}
