//! Order history handlers.

use axum::{Json, extract::State};
use metadots_core::OrderList;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequestSession;
use crate::state::AppState;

/// The caller's orders. A 401 from the backend passes through.
#[instrument(skip(state, session))]
pub async fn mine(
    State(state): State<AppState>,
    RequestSession(session): RequestSession,
) -> Result<Json<OrderList>> {
    Ok(Json(state.api().my_orders(&session).await?))
}
