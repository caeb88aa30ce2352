//! Subcommand implementations.
//!
//! Every command builds on a [`Context`]: the API client, the event bus the
//! library components publish on, and the session file standing in for the
//! browser's cookie jar.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;

use metadots_storefront::account::Account;
use metadots_storefront::api::{ApiClient, Session};
use metadots_storefront::checkout::UrlClassifier;
use metadots_storefront::config::{ApiConfig, CheckoutConfig};
use metadots_storefront::events::EventBus;

use crate::error::Result;
use crate::session_file::SessionFile;

/// Shared state for one invocation.
pub struct Context {
    pub api: ApiClient,
    pub events: EventBus,
    pub account: Account,
    pub classifier: UrlClassifier,
    pub sessions: SessionFile,
}

impl Context {
    /// Build from the environment, with an optional `--api-base` override.
    pub fn from_env(api_base: Option<String>, sessions: SessionFile) -> Result<Self> {
        let mut api_config = ApiConfig::from_env()?;
        if let Some(base) = api_base {
            api_config = ApiConfig::new(base, api_config.timeout);
        }
        let checkout = CheckoutConfig::from_env()?;
        Self::new(&api_config, &checkout, sessions)
    }

    pub fn new(api: &ApiConfig, checkout: &CheckoutConfig, sessions: SessionFile) -> Result<Self> {
        let api = ApiClient::new(api)?;
        let events = EventBus::new();
        let account = Account::new(api.clone(), events.clone());

        Ok(Self {
            classifier: UrlClassifier::from_config(checkout),
            api,
            events,
            account,
            sessions,
        })
    }

    /// The stored session, anonymous if there is none.
    pub fn session(&self) -> Result<Session> {
        Ok(self.sessions.load()?)
    }
}
