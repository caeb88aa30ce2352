//! Route guard middleware.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::session::cookie_header;
use crate::guard::GuardDecision;
use crate::state::AppState;

/// Run the [`RouteGuard`](crate::guard::RouteGuard) in front of every request.
///
/// Refusals are invisible temporary redirects to the login page, never
/// error pages.
pub async fn route_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let cookie = cookie_header(&parts);

    match state
        .guard()
        .evaluate(parts.uri.path(), cookie.as_deref())
        .await
    {
        GuardDecision::Pass => next.run(Request::from_parts(parts, body)).await,
        GuardDecision::Redirect(location) => Redirect::temporary(&location).into_response(),
    }
}
