//! Unified error handling with Sentry integration.
//!
//! Gateway handlers return `Result<T, AppError>`. Upstream 4xx responses pass
//! through with the backend's `detail`; anything that means the backend is
//! unreachable or misbehaving is captured to Sentry and answered with 502.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::ApiError;
use crate::cart::CartError;
use crate::checkout::CheckoutError;

/// Application-level error type for the gateway.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

const UPSTREAM_MESSAGE: &str = "Upstream service error";

/// Status, client-facing message, and whether to report it.
fn api_response(err: &ApiError) -> (StatusCode, String, bool) {
    match err {
        ApiError::Http { status, .. } if status.is_client_error() => {
            (*status, err.user_message(), false)
        }
        ApiError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string(), false),
        ApiError::Http { .. } | ApiError::Transport(_) | ApiError::Decode(_) => {
            (StatusCode::BAD_GATEWAY, UPSTREAM_MESSAGE.to_string(), true)
        }
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, String, bool) {
        match self {
            Self::Api(err) | Self::Cart(CartError::Api(err)) | Self::Checkout(CheckoutError::Api(err)) => {
                api_response(err)
            }
            Self::Cart(err @ CartError::InsufficientStock { .. }) => {
                (StatusCode::CONFLICT, err.to_string(), false)
            }
            Self::Checkout(err @ CheckoutError::InProgress) => {
                (StatusCode::CONFLICT, err.to_string(), false)
            }
            Self::Cart(err @ CartError::InvalidQuantity) => {
                (StatusCode::BAD_REQUEST, err.to_string(), false)
            }
            Self::Checkout(err @ CheckoutError::EmptyCart) => {
                (StatusCode::BAD_REQUEST, err.to_string(), false)
            }
            Self::Checkout(CheckoutError::InvalidUrl(_)) => {
                (StatusCode::BAD_GATEWAY, UPSTREAM_MESSAGE.to_string(), true)
            }
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string(), false),
            Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                true,
            ),
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.parts().0
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, report) = self.parts();

        if report {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for shopper actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metadots_core::{ProductId, ValidationError};
    use serde_json::json;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("missing product_id".to_string());
        assert_eq!(err.to_string(), "Bad request: missing product_id");
    }

    #[test]
    fn test_upstream_client_errors_pass_through() {
        let err = ApiError::from_status(StatusCode::NOT_FOUND, r#"{"detail":"Product not found"}"#);
        let app = AppError::from(err);
        assert_eq!(app.status(), StatusCode::NOT_FOUND);
        assert_eq!(app.parts().1, "Product not found");

        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, "");
        assert_eq!(get_status(err.into()), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_upstream_server_errors_become_bad_gateway() {
        let err = ApiError::Http {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Request failed: 500".to_string(),
            info: Some(json!({"detail": "stack trace"})),
        };
        let app = AppError::from(err);
        assert_eq!(app.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(app.parts().1, UPSTREAM_MESSAGE);

        let app = AppError::from(ApiError::Decode("bad json".to_string()));
        assert_eq!(app.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_local_errors() {
        assert_eq!(
            get_status(ApiError::Validation(ValidationError::EmptyEmail).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(CheckoutError::EmptyCart.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(CheckoutError::InProgress.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(
                CartError::InsufficientStock {
                    product_id: ProductId::new("p1"),
                    requested: 3,
                    available: 1,
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(CartError::Api(ApiError::from_status(StatusCode::BAD_REQUEST, "")).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
