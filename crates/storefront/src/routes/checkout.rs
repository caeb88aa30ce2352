//! Checkout route handlers.

use axum::{
    Json,
    extract::{Query, State},
    http::header::REFRESH,
    response::{IntoResponse, Redirect, Response},
};
use metadots_core::{CartLine, OrderId, Price};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::form_urlencoded;

use crate::checkout::{CancelPage, CheckoutPhase, CheckoutReturn, SUCCESS_PATH, SuccessPage};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequestSession;
use crate::state::AppState;

/// Checkout page model.
#[derive(Debug, Serialize)]
pub struct CheckoutPage {
    pub items: Vec<CartLine>,
    pub total: Price,
    pub can_place_order: bool,
}

/// Query of the success return URL.
#[derive(Debug, Default, Deserialize)]
pub struct SuccessQuery {
    pub order_id: Option<OrderId>,
}

fn success_location(order_id: Option<&OrderId>) -> String {
    match order_id {
        Some(id) => {
            let query: String = form_urlencoded::Serializer::new(String::new())
                .append_pair("order_id", id.as_ref())
                .finish();
            format!("{SUCCESS_PATH}?{query}")
        }
        None => SUCCESS_PATH.to_string(),
    }
}

/// Turn the flow's outcome into a navigation.
fn navigate(phase: &CheckoutPhase) -> Result<Response> {
    match phase {
        CheckoutPhase::ExternalRedirect { url } => Ok(Redirect::to(url.as_str()).into_response()),
        CheckoutPhase::LocalSuccess { order_id } | CheckoutPhase::Resolved { order_id } => {
            Ok(Redirect::to(&success_location(order_id.as_ref())).into_response())
        }
        other => Err(AppError::Internal(format!(
            "checkout finished in unexpected phase {other:?}"
        ))),
    }
}

/// Show what is about to be ordered. The cart must load to check out.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    RequestSession(session): RequestSession,
) -> Result<Json<CheckoutPage>> {
    let cart = state.api().get_cart(&session).await?;
    Ok(Json(CheckoutPage {
        total: cart.total(),
        can_place_order: !cart.is_empty(),
        items: cart.items,
    }))
}

/// Place the order through a checkout session.
#[instrument(skip(state, session))]
pub async fn place_order(
    State(state): State<AppState>,
    RequestSession(session): RequestSession,
) -> Result<Response> {
    add_breadcrumb("checkout", "Placing order", None);

    let flow = state.checkout_flow(session).await;
    let phase = flow.place_current_order().await?;
    navigate(&phase)
}

/// Complete the order without a payment provider.
#[instrument(skip(state, session))]
pub async fn simulate(
    State(state): State<AppState>,
    RequestSession(session): RequestSession,
) -> Result<Response> {
    add_breadcrumb("checkout", "Simulating payment", None);

    let flow = state.checkout_flow(session).await;
    let phase = flow.simulate_current_payment().await?;
    navigate(&phase)
}

/// Payment succeeded. Sends the shopper back to browsing after a delay.
#[instrument(skip(state, session))]
pub async fn success(
    State(state): State<AppState>,
    RequestSession(session): RequestSession,
    Query(query): Query<SuccessQuery>,
) -> Response {
    let phase = state
        .checkout_flow(session)
        .await
        .resolve(CheckoutReturn::Success {
            order_id: query.order_id,
        });
    let order_id = match phase {
        CheckoutPhase::Resolved { order_id } => order_id,
        _ => None,
    };

    let page = SuccessPage::new(order_id, state.config().checkout.success_redirect);
    ([(REFRESH, page.refresh_header())], Json(page)).into_response()
}

/// Payment canceled. No backend call; nothing to clean up.
pub async fn cancel() -> Json<CancelPage> {
    Json(CancelPage::default())
}
