//! Authentication state.
//!
//! Auth is derived, not stored: callers ask "who am I?" whenever they need
//! to know. Login and logout publish [`StoreEvent::AuthChanged`] so other
//! views can re-resolve.
//!
//! An optional principal cache (moka, short TTL) can absorb repeated lookups
//! within one navigation. It is flushed whenever an auth change, or a missed
//! signal, is observed on the bus.

use std::sync::Mutex;
use std::time::Duration;

use metadots_core::{Credentials, Principal, Registration};
use moka::future::Cache;
use tracing::{debug, instrument, warn};

use crate::api::{ApiClient, ApiError, Session};
use crate::events::{EventBus, Signal, StoreEvent, Subscription};

/// Upper bound on cached principals.
const CACHE_CAPACITY: u64 = 10_000;

/// Login, logout, registration and principal lookup.
pub struct Account {
    api: ApiClient,
    events: EventBus,
    cache: Option<Cache<u64, Principal>>,
    invalidations: Mutex<Subscription>,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("api", &self.api)
            .field("cached", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

impl Account {
    /// Create an account service without a principal cache.
    #[must_use]
    pub fn new(api: ApiClient, events: EventBus) -> Self {
        Self::with_cache_ttl(api, events, None)
    }

    /// Create an account service, caching principals for `ttl` when set.
    #[must_use]
    pub fn with_cache_ttl(api: ApiClient, events: EventBus, ttl: Option<Duration>) -> Self {
        let cache = ttl.map(|ttl| {
            Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(ttl)
                .build()
        });
        let invalidations = Mutex::new(events.subscribe());

        Self {
            api,
            events,
            cache,
            invalidations,
        }
    }

    /// Log in and return the new session.
    ///
    /// Empty fields and malformed emails are rejected before any request.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for bad input, or the backend's error.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let credentials = Credentials::new(email.trim(), password);
        credentials.validate()?;

        let session = self.api.login(&credentials).await?;
        self.auth_changed();
        Ok(session)
    }

    /// Create an account. The new user still has to log in.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for bad input, or the backend's error.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<Principal, ApiError> {
        registration.validate()?;
        self.api.register(registration).await
    }

    /// End the session and return what is left of it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails; the caller should still
    /// treat the user as logged out locally.
    #[instrument(skip(self, session))]
    pub async fn logout(&self, session: &Session) -> Result<Session, ApiError> {
        let remaining = self.api.logout(session).await;
        self.auth_changed();
        remaining
    }

    /// Resolve the principal, failing open to `None`.
    #[instrument(skip(self, session))]
    pub async fn current_user(&self, session: &Session) -> Option<Principal> {
        match self.whoami(session).await {
            Ok(principal) => Some(principal),
            Err(e) => {
                if !e.is_unauthorized() {
                    warn!(error = %e, "Principal lookup failed, treating as anonymous");
                }
                None
            }
        }
    }

    /// Resolve the principal, surfacing failures.
    ///
    /// # Errors
    ///
    /// Returns the backend's error (401 when not logged in).
    pub async fn whoami(&self, session: &Session) -> Result<Principal, ApiError> {
        if session.is_anonymous() {
            return self.api.me(session).await;
        }

        self.drain_invalidations();
        let key = session.cache_key();
        if let Some(cache) = &self.cache
            && let Some(principal) = cache.get(&key).await
        {
            debug!("Principal cache hit");
            return Ok(principal);
        }

        let principal = self.api.me(session).await?;
        if let Some(cache) = &self.cache {
            cache.insert(key, principal.clone()).await;
        }
        Ok(principal)
    }

    fn auth_changed(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
        self.events.publish(StoreEvent::AuthChanged);
    }

    /// Flush the cache if anyone reported an auth change since last look.
    fn drain_invalidations(&self) {
        let Some(cache) = &self.cache else {
            return;
        };
        let mut subscription = self
            .invalidations
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        while let Some(signal) = subscription.try_recv() {
            if matches!(
                signal,
                Signal::Event(StoreEvent::AuthChanged) | Signal::Missed(_)
            ) {
                debug!(?signal, "Flushing principal cache");
                cache.invalidate_all();
            }
        }
    }
}
