//! Back-office endpoints: user management and insights.

use metadots_core::{Insights, NewUser, UserId, UserList, UserPatch, UserRecord};
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use super::{Ack, ApiClient, ApiError, Session};

#[derive(Serialize)]
struct Paging {
    page: u32,
    limit: u32,
}

impl ApiClient {
    /// `GET /api/admin/users?page=&limit=`.
    ///
    /// # Errors
    ///
    /// Returns an error (401) if the caller is not an admin.
    #[instrument(skip(self, session))]
    pub async fn list_users(
        &self,
        session: &Session,
        page: u32,
        limit: u32,
    ) -> Result<UserList, ApiError> {
        self.get_with_query("/api/admin/users", session, &Paging { page, limit })
            .await
    }

    /// `POST /api/admin/users`.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is already registered.
    #[instrument(skip(self, session, user), fields(email = %user.email, role = %user.role))]
    pub async fn create_user(
        &self,
        session: &Session,
        user: &NewUser,
    ) -> Result<UserRecord, ApiError> {
        self.send_json(Method::POST, "/api/admin/users", session, user)
            .await
    }

    /// `PUT /api/admin/users/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is missing or the patch is empty.
    #[instrument(skip(self, session, patch), fields(user_id = %id))]
    pub async fn update_user(
        &self,
        session: &Session,
        id: &UserId,
        patch: &UserPatch,
    ) -> Result<UserRecord, ApiError> {
        self.send_json(Method::PUT, &format!("/api/admin/users/{id}"), session, patch)
            .await
    }

    /// `DELETE /api/admin/users/{id}`. The backend also drops the user's
    /// carts, orders and refresh tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist.
    #[instrument(skip(self, session), fields(user_id = %id))]
    pub async fn delete_user(&self, session: &Session, id: &UserId) -> Result<Ack, ApiError> {
        let response = self
            .execute(self.request(Method::DELETE, &format!("/api/admin/users/{id}"), session))
            .await?;
        response.body.decode()
    }

    /// `GET /api/admin/insights`.
    ///
    /// # Errors
    ///
    /// Returns an error (401) if the caller is not an admin.
    #[instrument(skip(self, session))]
    pub async fn insights(&self, session: &Session) -> Result<Insights, ApiError> {
        self.get("/api/admin/insights", session).await
    }
}
