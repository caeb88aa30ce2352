//! CLI error type.

use metadots_storefront::api::ApiError;
use metadots_storefront::cart::CartError;
use metadots_storefront::checkout::CheckoutError;
use metadots_storefront::config::ConfigError;
use thiserror::Error;

use crate::session_file::SessionFileError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),

    #[error("{}", .0.user_message())]
    Cart(#[from] CartError),

    #[error("{}", .0.user_message())]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Session(#[from] SessionFileError),

    #[error("Cannot read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, CliError>;
