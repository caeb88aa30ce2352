//! Admin dashboard handlers. Reached only through the admin guard.

use axum::{
    Json,
    extract::{Query, State},
};
use metadots_core::{Insights, OrderList, UserList};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequestSession;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

/// `?page=&limit=` for listings.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

const fn first_page() -> u32 {
    1
}

const fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Pagination {
    fn validate(&self) -> Result<()> {
        if self.page == 0 {
            return Err(AppError::BadRequest("page starts at 1".to_string()));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.limit) {
            return Err(AppError::BadRequest(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(())
    }
}

#[instrument(skip(state, session))]
pub async fn orders(
    State(state): State<AppState>,
    RequestSession(session): RequestSession,
) -> Result<Json<OrderList>> {
    Ok(Json(state.api().all_orders(&session).await?))
}

#[instrument(skip(state, session))]
pub async fn users(
    State(state): State<AppState>,
    RequestSession(session): RequestSession,
    Query(paging): Query<Pagination>,
) -> Result<Json<UserList>> {
    paging.validate()?;
    let users = state
        .api()
        .list_users(&session, paging.page, paging.limit)
        .await?;
    Ok(Json(users))
}

#[instrument(skip(state, session))]
pub async fn insights(
    State(state): State<AppState>,
    RequestSession(session): RequestSession,
) -> Result<Json<Insights>> {
    Ok(Json(state.api().insights(&session).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_bounds() {
        let ok = Pagination { page: 1, limit: 20 };
        assert!(ok.validate().is_ok());

        let zero_page = Pagination { page: 0, limit: 20 };
        assert!(matches!(zero_page.validate(), Err(AppError::BadRequest(_))));

        let huge = Pagination { page: 1, limit: 500 };
        assert!(matches!(huge.validate(), Err(AppError::BadRequest(_))));
    }
}
