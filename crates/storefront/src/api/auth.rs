//! Authentication endpoints.

use metadots_core::{Credentials, Principal, Registration};
use reqwest::Method;
use tracing::instrument;

use super::{ApiClient, ApiError, Session};

impl ApiClient {
    /// `POST /api/auth/login`.
    ///
    /// Returns the session established by the response's `Set-Cookie` headers.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError> {
        let response = self
            .send_json_raw(
                Method::POST,
                "/api/auth/login",
                &Session::anonymous(),
                credentials,
            )
            .await?;
        Ok(Session::from_set_cookies(
            response.set_cookies.iter().map(String::as_str),
        ))
    }

    /// `POST /api/auth/register`. Does not log the new user in.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the registration.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<Principal, ApiError> {
        self.send_json(
            Method::POST,
            "/api/auth/register",
            &Session::anonymous(),
            registration,
        )
        .await
    }

    /// `POST /api/auth/logout`.
    ///
    /// Returns `session` with the cookies the backend cleared removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, session))]
    pub async fn logout(&self, session: &Session) -> Result<Session, ApiError> {
        let response = self
            .send_json_raw(Method::POST, "/api/auth/logout", session, &serde_json::json!({}))
            .await?;
        Ok(session
            .clone()
            .merge_set_cookies(response.set_cookies.iter().map(String::as_str)))
    }

    /// `POST /api/auth/refresh`: rotate the access and refresh cookies.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh token is missing, expired or revoked.
    #[instrument(skip(self, session))]
    pub async fn refresh(&self, session: &Session) -> Result<Session, ApiError> {
        let response = self
            .send_json_raw(Method::POST, "/api/auth/refresh", session, &serde_json::json!({}))
            .await?;
        Ok(session
            .clone()
            .merge_set_cookies(response.set_cookies.iter().map(String::as_str)))
    }

    /// `GET /api/auth/me`: resolve the session's principal.
    ///
    /// # Errors
    ///
    /// Returns an error (usually 401) if the session is not authenticated.
    #[instrument(skip(self, session))]
    pub async fn me(&self, session: &Session) -> Result<Principal, ApiError> {
        self.get("/api/auth/me", session).await
    }
}
