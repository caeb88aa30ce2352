//! Deciding whether a checkout URL leaves the application.

use url::{Origin, Url};

use super::CheckoutError;
use crate::config::CheckoutConfig;

/// Where a checkout session URL points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Back into this application (simulated payment).
    Local(Url),
    /// A payment page elsewhere. Control leaves the application.
    External(Url),
}

impl Destination {
    #[must_use]
    pub const fn url(&self) -> &Url {
        match self {
            Self::Local(url) | Self::External(url) => url,
        }
    }

    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }
}

/// Classifies checkout URLs as local or external.
///
/// Rules, in order:
///
/// 1. An explicit hint from the backend wins.
/// 2. The URL is resolved against the app origin, so relative URLs are local.
/// 3. It is local iff its origin equals the app origin or its host is one of
///    the configured local hosts (exact, case-insensitive; never a substring).
#[derive(Debug, Clone)]
pub struct UrlClassifier {
    app_base: Url,
    app_origin: Origin,
    local_hosts: Vec<String>,
}

fn normalize_host(host: &str) -> String {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .to_ascii_lowercase()
}

impl UrlClassifier {
    #[must_use]
    pub fn new<I, S>(app_base: Url, local_hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let app_origin = app_base.origin();
        let local_hosts = local_hosts
            .into_iter()
            .map(|host| normalize_host(host.as_ref()))
            .filter(|host| !host.is_empty())
            .collect();

        Self {
            app_base,
            app_origin,
            local_hosts,
        }
    }

    #[must_use]
    pub fn from_config(config: &CheckoutConfig) -> Self {
        Self::new(config.app_base_url.clone(), &config.local_hosts)
    }

    #[must_use]
    pub const fn app_base(&self) -> &Url {
        &self.app_base
    }

    /// An absolute URL for `path` under the app origin.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidUrl`] if `path` cannot be joined.
    pub fn app_url(&self, path: &str) -> Result<Url, CheckoutError> {
        self.app_base
            .join(path)
            .map_err(|_| CheckoutError::InvalidUrl(path.to_string()))
    }

    /// Classify `raw`, honouring an explicit backend `hint` when present.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidUrl`] when `raw` does not parse or is
    /// not http(s).
    pub fn classify(&self, raw: &str, hint: Option<bool>) -> Result<Destination, CheckoutError> {
        let url = self
            .app_base
            .join(raw.trim())
            .map_err(|_| CheckoutError::InvalidUrl(raw.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CheckoutError::InvalidUrl(raw.to_string()));
        }

        let local = hint.unwrap_or_else(|| self.is_local(&url));
        Ok(if local {
            Destination::Local(url)
        } else {
            Destination::External(url)
        })
    }

    fn is_local(&self, url: &Url) -> bool {
        if url.origin() == self.app_origin {
            return true;
        }
        url.host_str().is_some_and(|host| {
            let host = normalize_host(host);
            self.local_hosts.iter().any(|local| *local == host)
        })
    }
}
