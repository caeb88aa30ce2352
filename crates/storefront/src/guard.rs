//! Route guard.
//!
//! Evaluated before any page under a protected prefix is rendered. The
//! incoming `Cookie` header is forwarded verbatim to `GET /api/auth/me`;
//! nothing is cached between evaluations.

use tracing::{debug, instrument};
use url::form_urlencoded;

use crate::api::{ApiClient, Session};
use crate::config::GuardConfig;

/// Outcome of a guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Pass,
    /// Send the browser to this location.
    Redirect(String),
}

/// Which paths need a principal, which need an admin, and where to send
/// everyone else.
#[derive(Debug, Clone)]
pub struct GuardPolicy {
    protected: Vec<String>,
    admin_prefix: String,
    login_path: String,
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// `/cart` matches `/cart` and `/cart/...`, never `/cartography`.
fn under(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

impl GuardPolicy {
    #[must_use]
    pub fn new<I, S>(protected: I, admin_prefix: &str, login_path: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            protected: protected
                .into_iter()
                .map(|p| normalize_prefix(p.as_ref()))
                .collect(),
            admin_prefix: normalize_prefix(admin_prefix),
            login_path: login_path.to_string(),
        }
    }

    #[must_use]
    pub fn from_config(config: &GuardConfig) -> Self {
        Self::new(
            &config.protected_prefixes,
            &config.admin_prefix,
            &config.login_path,
        )
    }

    /// Admin paths always need a principal, listed or not. The login page
    /// never does, even under a catch-all `/` prefix.
    #[must_use]
    pub fn requires_auth(&self, path: &str) -> bool {
        if under(path, &normalize_prefix(&self.login_path)) {
            return false;
        }
        self.requires_admin(path) || self.protected.iter().any(|p| under(path, p))
    }

    #[must_use]
    pub fn requires_admin(&self, path: &str) -> bool {
        under(path, &self.admin_prefix)
    }

    /// `<login>?next=<path>`, with the path form-encoded.
    #[must_use]
    pub fn login_redirect(&self, path: &str) -> String {
        let next: String = form_urlencoded::byte_serialize(path.as_bytes()).collect();
        format!("{}?next={next}", self.login_path)
    }
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self::from_config(&GuardConfig::default())
    }
}

/// The guard itself: a policy plus the backend to ask.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    api: ApiClient,
    policy: GuardPolicy,
}

impl RouteGuard {
    #[must_use]
    pub const fn new(api: ApiClient, policy: GuardPolicy) -> Self {
        Self { api, policy }
    }

    #[must_use]
    pub const fn policy(&self) -> &GuardPolicy {
        &self.policy
    }

    /// Decide whether a request for `path` may proceed.
    ///
    /// Unprotected paths pass without an upstream call. Protected paths cost
    /// exactly one `me` call. Any failure, and a non-admin on an admin path,
    /// yields the same login redirect.
    #[instrument(skip(self, cookie_header))]
    pub async fn evaluate(&self, path: &str, cookie_header: Option<&str>) -> GuardDecision {
        if !self.policy.requires_auth(path) {
            return GuardDecision::Pass;
        }

        let session = cookie_header.map_or_else(Session::anonymous, Session::forwarded);
        let allowed = match self.api.me(&session).await {
            Ok(principal) => !self.policy.requires_admin(path) || principal.is_admin(),
            Err(e) => {
                debug!(error = %e, "Principal check failed");
                false
            }
        };

        if allowed {
            GuardDecision::Pass
        } else {
            debug!("Redirecting to login");
            GuardDecision::Redirect(self.policy.login_redirect(path))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_aware_prefixes() {
        let policy = GuardPolicy::default();
        assert!(policy.requires_auth("/cart"));
        assert!(policy.requires_auth("/cart/add"));
        assert!(policy.requires_auth("/checkout/success"));
        assert!(!policy.requires_auth("/cartography"));
        assert!(!policy.requires_auth("/products"));
        assert!(!policy.requires_auth("/"));
    }

    #[test]
    fn test_admin_prefix() {
        let policy = GuardPolicy::default();
        assert!(policy.requires_admin("/admin"));
        assert!(policy.requires_admin("/admin/users"));
        assert!(!policy.requires_admin("/administrivia"));
        assert!(!policy.requires_admin("/cart"));
    }

    #[test]
    fn test_admin_prefix_is_protected_even_if_unlisted() {
        let policy = GuardPolicy::new(["/cart"], "/admin", "/login");
        assert!(policy.requires_auth("/admin/insights"));
    }

    #[test]
    fn test_catch_all_prefix_spares_login_page() {
        let policy = GuardPolicy::new(["/"], "/admin", "/login");
        assert!(policy.requires_auth("/products"));
        assert!(policy.requires_auth("/"));
        assert!(!policy.requires_auth("/login"));
        assert!(!policy.requires_auth("/login/reset"));
        assert!(policy.requires_auth("/loginx"));
    }

    #[tokio::test]
    async fn test_login_page_passes_without_lookup() {
        let api = ApiClient::new(&crate::config::ApiConfig::new(
            "http://127.0.0.1:9",
            std::time::Duration::from_secs(1),
        ))
        .unwrap();
        let guard = RouteGuard::new(api, GuardPolicy::new(["/"], "/admin", "/login"));
        assert_eq!(guard.evaluate("/login", None).await, GuardDecision::Pass);
    }

    #[test]
    fn test_prefix_normalization() {
        let policy = GuardPolicy::new(["cart/", " /orders "], "admin/", "/login");
        assert!(policy.requires_auth("/cart/x"));
        assert!(policy.requires_auth("/orders"));
        assert!(policy.requires_admin("/admin"));
    }

    #[test]
    fn test_login_redirect_encodes_path() {
        let policy = GuardPolicy::default();
        assert_eq!(policy.login_redirect("/cart"), "/login?next=%2Fcart");
        assert_eq!(
            policy.login_redirect("/admin/users"),
            "/login?next=%2Fadmin%2Fusers"
        );
    }
}
