//! HTTP route handlers for the gateway.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//!
//! # Cart
//! GET  /cart                   - Cart page model
//! POST /cart/add               - Add to cart (HX-Trigger: cart:changed)
//! POST /cart/update            - Update quantity (HX-Trigger: cart:changed)
//! POST /cart/remove            - Remove line (HX-Trigger: cart:changed)
//! GET  /cart/count             - Cart count badge
//!
//! # Checkout
//! GET  /checkout               - Checkout page model
//! POST /checkout               - Place order, 303 to payment or success page
//! POST /checkout/simulate      - Simulated payment, 303 to success page
//! GET  /checkout/success       - Success model, Refresh back to /products
//! GET  /checkout/cancel        - Cancel model
//!
//! # Orders
//! GET  /orders                 - Caller's orders
//!
//! # Admin (admin role required)
//! GET  /admin/orders           - All orders
//! GET  /admin/users            - User list
//! GET  /admin/insights         - Dashboard numbers
//! ```

pub mod admin;
pub mod cart;
pub mod checkout;
pub mod orders;

use axum::{
    Router,
    body::Body,
    http::Request,
    middleware,
    routing::{get, post},
};
use sentry_tower::{NewSentryLayer, SentryHttpLayer};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::place_order))
        .route("/simulate", post(checkout::simulate))
        .route("/success", get(checkout::success))
        .route("/cancel", get(checkout::cancel))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(admin::orders))
        .route("/users", get(admin::users))
        .route("/insights", get(admin::insights))
}

/// Create all page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .route("/orders", get(orders::mine))
        .nest("/admin", admin_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the backend.
pub async fn health() -> &'static str {
    "ok"
}

/// The full gateway: routes, guard, request ids, tracing and Sentry.
pub fn app(state: AppState) -> Router {
    let layers = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .layer(middleware::from_fn(crate::middleware::request_id_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::route_guard,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .layer(layers)
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(NewSentryLayer::new_from_top())
        .layer(SentryHttpLayer::new().enable_transaction())
}
