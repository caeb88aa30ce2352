//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! Every variable is optional.
//!
//! ## Backend
//! - `METADOTS_API_BASE` - REST backend base URL (default: `http://localhost:8000`)
//! - `METADOTS_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 15)
//!
//! ## Application
//! - `STOREFRONT_BASE_URL` - Public origin of the app (default: `http://localhost:3000`)
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_LOCAL_HOSTS` - Hosts treated as local checkout targets
//!   (default: `localhost,127.0.0.1`)
//! - `STOREFRONT_SUCCESS_REDIRECT_MS` - Delay before the success page returns
//!   to browsing (default: 1800)
//! - `STOREFRONT_SESSION_CACHE_SECS` - Principal cache TTL, 0 disables (default: 0)
//!
//! ## Route guard
//! - `STOREFRONT_PROTECTED_PREFIXES` - Comma list (default: `/cart,/checkout,/admin`)
//! - `STOREFRONT_ADMIN_PREFIX` - Admin-only prefix (default: `/admin`)
//! - `STOREFRONT_LOGIN_PATH` - Login destination (default: `/login`)
//!
//! ## Error tracking
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Where the REST backend lives and how long to wait for it.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL without a trailing slash.
    pub base_url: String,
    /// Per-request timeout. Timeouts surface as transport errors.
    pub timeout: Duration,
}

/// Inputs to checkout URL building and classification.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Public origin of the application.
    pub app_base_url: Url,
    /// Hosts recognised as local/simulated checkout targets (exact match).
    pub local_hosts: Vec<String>,
    /// Delay before the success page sends the shopper back to browsing.
    pub success_redirect: Duration,
}

/// Route guard settings.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    pub protected_prefixes: Vec<String>,
    pub admin_prefix: String,
    pub login_path: String,
}

/// Storefront application configuration.
///
/// Implements `Debug` manually to redact the Sentry DSN.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the gateway to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    pub api: ApiConfig,
    pub checkout: CheckoutConfig,
    pub guard: GuardConfig,
    /// Principal cache TTL; `None` disables the cache
    pub session_cache_ttl: Option<Duration>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<SecretString>,
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api", &self.api)
            .field("checkout", &self.checkout)
            .field("guard", &self.guard)
            .field("session_cache_ttl", &self.session_cache_ttl)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(env: &Lookup<'_>) -> Result<Self, ConfigError> {
        let host = parse_or(env, "STOREFRONT_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = parse_or(env, "STOREFRONT_PORT", 3000_u16)?;

        let cache_secs = parse_or(env, "STOREFRONT_SESSION_CACHE_SECS", 0_u64)?;
        let session_cache_ttl = (cache_secs > 0).then(|| Duration::from_secs(cache_secs));

        Ok(Self {
            host,
            port,
            api: ApiConfig::from_lookup(env)?,
            checkout: CheckoutConfig::from_lookup(env)?,
            guard: GuardConfig::from_lookup(env),
            session_cache_ttl,
            sentry_dsn: non_empty(env, "SENTRY_DSN").map(SecretString::from),
            sentry_environment: non_empty(env, "SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ApiConfig {
    /// Load the backend settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the base URL or timeout is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if the base URL or timeout is malformed.
    pub fn from_lookup(env: &Lookup<'_>) -> Result<Self, ConfigError> {
        let raw = get_env_or_default(env, "METADOTS_API_BASE", "http://localhost:8000");
        Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidEnvVar("METADOTS_API_BASE".to_string(), e.to_string()))?;
        let timeout = parse_or(env, "METADOTS_HTTP_TIMEOUT_SECS", 15_u64)?;

        Ok(Self::new(raw, Duration::from_secs(timeout)))
    }

    /// Build an `ApiConfig` for `base_url`, normalising away trailing slashes.
    #[must_use]
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

impl CheckoutConfig {
    /// Load checkout settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the base URL or redirect delay is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if the base URL or redirect delay is malformed.
    pub fn from_lookup(env: &Lookup<'_>) -> Result<Self, ConfigError> {
        let raw = get_env_or_default(env, "STOREFRONT_BASE_URL", "http://localhost:3000");
        let app_base_url = Url::parse(&raw).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;
        let local_hosts = parse_list(&get_env_or_default(
            env,
            "STOREFRONT_LOCAL_HOSTS",
            "localhost,127.0.0.1",
        ));
        let redirect_ms = parse_or(env, "STOREFRONT_SUCCESS_REDIRECT_MS", 1800_u64)?;

        Ok(Self {
            app_base_url,
            local_hosts,
            success_redirect: Duration::from_millis(redirect_ms),
        })
    }
}

impl GuardConfig {
    fn from_lookup(env: &Lookup<'_>) -> Self {
        Self {
            protected_prefixes: parse_list(&get_env_or_default(
                env,
                "STOREFRONT_PROTECTED_PREFIXES",
                "/cart,/checkout,/admin",
            )),
            admin_prefix: get_env_or_default(env, "STOREFRONT_ADMIN_PREFIX", "/admin"),
            login_path: get_env_or_default(env, "STOREFRONT_LOGIN_PATH", "/login"),
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self::from_lookup(&|_| None)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Source of configuration values, keyed by variable name.
pub type Lookup<'a> = dyn Fn(&str) -> Option<String> + 'a;

/// Get a variable, treating empty values as unset.
fn non_empty(env: &Lookup<'_>, key: &str) -> Option<String> {
    env(key).filter(|v| !v.trim().is_empty())
}

/// Get a variable with a default value.
fn get_env_or_default(env: &Lookup<'_>, key: &str, default: &str) -> String {
    non_empty(env, key).unwrap_or_else(|| default.to_string())
}

/// Parse a variable, falling back to `default` when it is unset.
fn parse_or<T>(env: &Lookup<'_>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    non_empty(env, key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Split a comma list, dropping blanks.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::from_lookup(&lookup(&[])).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.timeout, Duration::from_secs(15));
        assert_eq!(config.checkout.app_base_url.as_str(), "http://localhost:3000/");
        assert_eq!(config.checkout.local_hosts, vec!["localhost", "127.0.0.1"]);
        assert_eq!(config.checkout.success_redirect, Duration::from_millis(1800));
        assert_eq!(config.guard.protected_prefixes, vec!["/cart", "/checkout", "/admin"]);
        assert_eq!(config.guard.admin_prefix, "/admin");
        assert_eq!(config.guard.login_path, "/login");
        assert!(config.session_cache_ttl.is_none());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let env = lookup(&[
            ("METADOTS_API_BASE", "https://api.metadots.co/"),
            ("STOREFRONT_PORT", "8080"),
            ("STOREFRONT_LOCAL_HOSTS", " shop.test , ,localhost"),
            ("STOREFRONT_SESSION_CACHE_SECS", "5"),
            ("SENTRY_DSN", "https://key@sentry.example/1"),
        ]);
        let config = StorefrontConfig::from_lookup(&env).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.api.base_url, "https://api.metadots.co");
        assert_eq!(config.checkout.local_hosts, vec!["shop.test", "localhost"]);
        assert_eq!(config.session_cache_ttl, Some(Duration::from_secs(5)));
        assert!(!format!("{config:?}").contains("key@sentry"));
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let err = StorefrontConfig::from_lookup(&lookup(&[("STOREFRONT_PORT", "http")]))
            .unwrap_err();
        assert!(err.to_string().contains("STOREFRONT_PORT"));

        let err = StorefrontConfig::from_lookup(&lookup(&[("STOREFRONT_BASE_URL", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "STOREFRONT_BASE_URL"));
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("a, b,,c "), vec!["a", "b", "c"]);
        assert!(parse_list("").is_empty());
    }
}
