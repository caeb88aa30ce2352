//! Order history endpoints.

use metadots_core::OrderList;
use tracing::instrument;

use super::{ApiClient, ApiError, Session};

impl ApiClient {
    /// `GET /api/orders/me`: the caller's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error (401) if the session is not authenticated.
    #[instrument(skip(self, session))]
    pub async fn my_orders(&self, session: &Session) -> Result<OrderList, ApiError> {
        self.get("/api/orders/me", session).await
    }

    /// `GET /api/orders/admin`: every order (admin).
    ///
    /// # Errors
    ///
    /// Returns an error (401) if the caller is not an admin.
    #[instrument(skip(self, session))]
    pub async fn all_orders(&self, session: &Session) -> Result<OrderList, ApiError> {
        self.get("/api/orders/admin", session).await
    }
}
