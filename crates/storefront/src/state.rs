//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::account::Account;
use crate::api::{ApiClient, ApiError, Session};
use crate::checkout::{CheckoutFlow, UrlClassifier};
use crate::config::StorefrontConfig;
use crate::events::EventBus;
use crate::guard::{GuardPolicy, RouteGuard};

/// Open checkout flows kept at most.
const CHECKOUT_FLOW_CAPACITY: u64 = 10_000;

/// A shopper's flow is forgotten after this long without a checkout request.
const CHECKOUT_FLOW_IDLE: Duration = Duration::from_secs(30 * 60);

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The only per-shopper state is the checkout
/// flow, keyed by session; everything else works from the session forwarded
/// with the request.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
    events: EventBus,
    account: Account,
    classifier: UrlClassifier,
    guard: RouteGuard,
    checkout_flows: Cache<u64, Arc<CheckoutFlow>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config.api)?;
        let events = EventBus::new();
        let account = Account::with_cache_ttl(api.clone(), events.clone(), config.session_cache_ttl);
        let classifier = UrlClassifier::from_config(&config.checkout);
        let guard = RouteGuard::new(api.clone(), GuardPolicy::from_config(&config.guard));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                events,
                account,
                classifier,
                guard,
                checkout_flows: Cache::builder()
                    .max_capacity(CHECKOUT_FLOW_CAPACITY)
                    .time_to_idle(CHECKOUT_FLOW_IDLE)
                    .build(),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The backend client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// The process-wide event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    #[must_use]
    pub fn account(&self) -> &Account {
        &self.inner.account
    }

    #[must_use]
    pub fn guard(&self) -> &RouteGuard {
        &self.inner.guard
    }

    /// The checkout flow for `session`.
    ///
    /// Requests carrying the same cookies share one flow, so a second
    /// submission while the first is in flight is rejected. Anonymous
    /// requests get a throwaway flow.
    pub async fn checkout_flow(&self, session: Session) -> Arc<CheckoutFlow> {
        if session.is_anonymous() {
            return Arc::new(self.new_flow(session));
        }
        self.inner
            .checkout_flows
            .get_with(session.cache_key(), async { Arc::new(self.new_flow(session)) })
            .await
    }

    fn new_flow(&self, session: Session) -> CheckoutFlow {
        CheckoutFlow::new(
            self.inner.api.clone(),
            self.inner.events.clone(),
            self.inner.classifier.clone(),
            session,
        )
    }
}
