//! Typed client for the Metadots REST backend.
//!
//! # Architecture
//!
//! - One [`ApiClient`] per process, cheaply cloneable (`Arc` inner)
//! - Every call takes an explicit [`Session`] and forwards its cookie header
//! - Every failure becomes an [`ApiError`]; nothing is retried
//! - Endpoint methods live in one submodule per backend area
//!
//! # Example
//!
//! ```rust,ignore
//! use metadots_storefront::api::{ApiClient, Session};
//!
//! let client = ApiClient::new(&config.api)?;
//! let session = client.login(&credentials).await?;
//! let cart = client.get_cart(&session).await?;
//! ```

mod admin;
mod auth;
mod cart;
mod catalog;
mod orders;
mod session;

pub use catalog::UploadedImage;
pub use session::Session;

use std::sync::Arc;

use metadots_core::ValidationError;
use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::ApiConfig;

// =============================================================================
// Errors
// =============================================================================

/// A failed backend call, in one shape for every endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No response: connection refused, DNS, TLS or timeout.
    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The backend answered with a non-success status.
    ///
    /// `info` is the response body parsed as JSON, when it was JSON.
    #[error("{message}")]
    Http {
        status: StatusCode,
        message: String,
        info: Option<Value>,
    },

    /// A success body did not have the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(String),

    /// Rejected before reaching the network.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Coarse classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response was received.
    Transport,
    /// HTTP failure carrying a structured JSON body.
    Structured,
    /// HTTP failure with no usable body; only the status is known.
    StatusOnly,
    /// Client-side validation failure.
    Validation,
    /// Success status with an unreadable body.
    Decode,
}

impl ApiError {
    /// Build the error for a non-success response.
    #[must_use]
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        Self::Http {
            status,
            message: format!("Request failed: {}", status.as_u16()),
            info: serde_json::from_str(body).ok(),
        }
    }

    /// HTTP status, when a response was received.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Parsed JSON error body, if any.
    #[must_use]
    pub const fn info(&self) -> Option<&Value> {
        match self {
            Self::Http { info, .. } => info.as_ref(),
            _ => None,
        }
    }

    /// The backend's `detail` explanation.
    ///
    /// A string `detail` is returned as is; a list of validation entries is
    /// reduced to their `msg` fields.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        match self.info()?.get("detail")? {
            Value::String(detail) => Some(detail.clone()),
            Value::Array(entries) => {
                let msgs: Vec<&str> = entries
                    .iter()
                    .filter_map(|entry| entry.get("msg").and_then(Value::as_str))
                    .collect();
                (!msgs.is_empty()).then(|| msgs.join("; "))
            }
            _ => None,
        }
    }

    /// Text suitable for a toast or inline error.
    #[must_use]
    pub fn user_message(&self) -> String {
        self.detail().unwrap_or_else(|| self.to_string())
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Transport,
            Self::Http { info: Some(_), .. } => ErrorKind::Structured,
            Self::Http { info: None, .. } => ErrorKind::StatusOnly,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Decode(_) => ErrorKind::Decode,
        }
    }

    /// Returns true for 401 responses.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

// =============================================================================
// Responses
// =============================================================================

/// A success body: JSON when the backend said so, raw text otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiBody {
    Json(Value),
    Text(String),
}

impl ApiBody {
    /// Decode into `T`. A text body that happens to hold JSON is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] if the body does not match `T`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            Self::Json(value) => serde_json::from_value(value),
            Self::Text(text) => serde_json::from_str(&text),
        }
        .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// A success response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    /// Raw `Set-Cookie` headers, in order.
    pub set_cookies: Vec<String>,
    pub body: ApiBody,
}

/// `{"message": "..."}` acknowledgement returned by mutations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the Metadots REST backend.
///
/// Stateless between calls: the only per-user state is the [`Session`]
/// passed in.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ApiError::Transport)?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
            }),
        })
    }

    /// The backend base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Start a request carrying the session's cookies.
    fn request(&self, method: Method, path: &str, session: &Session) -> RequestBuilder {
        let builder = self
            .inner
            .client
            .request(method, self.url(path))
            .header(ACCEPT, "application/json");
        match session.cookie_header() {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder,
        }
    }

    /// Send a request and normalise the outcome.
    async fn execute(&self, builder: RequestBuilder) -> Result<ApiResponse, ApiError> {
        let response = builder.send().await.map_err(ApiError::Transport)?;
        let status = response.status();

        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(String::from)
            .collect();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));

        let text = response.text().await.map_err(ApiError::Transport)?;

        if !status.is_success() {
            debug!(status = %status, "Backend returned non-success status");
            return Err(ApiError::from_status(status, &text));
        }

        let body = if is_json {
            ApiBody::Json(serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))?)
        } else {
            ApiBody::Text(text)
        };

        Ok(ApiResponse {
            status,
            set_cookies,
            body,
        })
    }

    /// Perform any call and return the raw response.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] for transport failures and non-success statuses.
    #[instrument(skip(self, session, body))]
    pub async fn raw(
        &self,
        method: Method,
        path: &str,
        session: &Session,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ApiError> {
        let builder = self.request(method, path, session);
        let builder = match body {
            Some(json) => builder.json(json),
            None => builder,
        };
        self.execute(builder).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, session: &Session) -> Result<T, ApiError> {
        let response = self.execute(self.request(Method::GET, path, session)).await?;
        response.body.decode()
    }

    async fn get_with_query<T, Q>(
        &self,
        path: &str,
        session: &Session,
        query: &Q,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let builder = self.request(Method::GET, path, session).query(query);
        self.execute(builder).await?.body.decode()
    }

    async fn send_json<T, B>(
        &self,
        method: Method,
        path: &str,
        session: &Session,
        body: &B,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let builder = self.request(method, path, session).json(body);
        self.execute(builder).await?.body.decode()
    }

    /// Like `send_json`, but also returns the raw response for cookie handling.
    async fn send_json_raw<B>(
        &self,
        method: Method,
        path: &str,
        session: &Session,
        body: &B,
    ) -> Result<ApiResponse, ApiError>
    where
        B: serde::Serialize + ?Sized,
    {
        self.execute(self.request(method, path, session).json(body))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_http_error_with_json_detail() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"detail":"Not enough stock"}"#,
        );
        assert_eq!(err.to_string(), "Request failed: 400");
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(err.detail().as_deref(), Some("Not enough stock"));
        assert_eq!(err.user_message(), "Not enough stock");
        assert_eq!(err.kind(), ErrorKind::Structured);
    }

    #[test]
    fn test_http_error_without_json_body() {
        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, "<html>upstream down</html>");
        assert!(err.info().is_none());
        assert!(err.detail().is_none());
        assert_eq!(err.user_message(), "Request failed: 502");
        assert_eq!(err.kind(), ErrorKind::StatusOnly);
    }

    #[test]
    fn test_validation_detail_list() {
        let body = json!({"detail": [
            {"loc": ["body", "password"], "msg": "String should have at least 6 characters"},
            {"loc": ["body", "username"], "msg": "String should have at least 3 characters"}
        ]})
        .to_string();
        let err = ApiError::from_status(StatusCode::UNPROCESSABLE_ENTITY, &body);
        assert_eq!(
            err.detail().as_deref(),
            Some("String should have at least 6 characters; String should have at least 3 characters")
        );
    }

    #[test]
    fn test_unauthorized() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, r#"{"detail":"Not authenticated"}"#);
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_client_side_validation_kind() {
        let err = ApiError::from(ValidationError::EmptyPassword);
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.status().is_none());
        assert_eq!(err.user_message(), "password is required");
    }

    #[test]
    fn test_body_decode_accepts_json_text() {
        let body = ApiBody::Text(r#"{"message":"added"}"#.to_string());
        let ack: Ack = body.decode().unwrap();
        assert_eq!(ack.message.as_deref(), Some("added"));

        let bad = ApiBody::Text("plain words".to_string());
        assert!(matches!(bad.decode::<Ack>(), Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_base_url_is_normalised() {
        let config = ApiConfig::new("http://localhost:8000/", std::time::Duration::from_secs(1));
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/api/cart"), "http://localhost:8000/api/cart");
    }
}
