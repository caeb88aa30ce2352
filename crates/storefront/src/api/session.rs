//! Explicit session context.
//!
//! The backend keeps authentication in HTTP-only cookies. Outside a browser
//! nothing attaches them for us, so the cookie header is carried as a value
//! and handed to every [`ApiClient`](super::ApiClient) call.

use std::hash::{DefaultHasher, Hash, Hasher};

use secrecy::{ExposeSecret, SecretString};

/// The caller's session: the `Cookie` header to send upstream, if any.
///
/// `Debug` never prints cookie values.
#[derive(Clone, Default)]
pub struct Session {
    cookie: Option<SecretString>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("cookie", &self.cookie.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Session {
    /// A session with no cookies.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Forward an incoming `Cookie` header verbatim.
    ///
    /// Blank headers produce an anonymous session.
    #[must_use]
    pub fn forwarded(cookie_header: &str) -> Self {
        if cookie_header.trim().is_empty() {
            return Self::anonymous();
        }
        Self {
            cookie: Some(SecretString::from(cookie_header.to_string())),
        }
    }

    /// Build a session from the `Set-Cookie` headers of a response.
    #[must_use]
    pub fn from_set_cookies<'a>(set_cookies: impl IntoIterator<Item = &'a str>) -> Self {
        Self::anonymous().merge_set_cookies(set_cookies)
    }

    /// Apply `Set-Cookie` headers on top of this session.
    ///
    /// Cookies are replaced by name. A cookie set to an empty value, or with
    /// `Max-Age=0`, is removed. Attributes (`Path`, `HttpOnly`, ...) are not
    /// sent back and are dropped.
    #[must_use]
    pub fn merge_set_cookies<'a>(self, set_cookies: impl IntoIterator<Item = &'a str>) -> Self {
        let mut jar = self.pairs();
        for header in set_cookies {
            let Some((name, value, expired)) = parse_set_cookie(header) else {
                continue;
            };
            jar.retain(|(existing, _)| existing != name);
            if !value.is_empty() && !expired {
                jar.push((name.to_string(), value.to_string()));
            }
        }

        if jar.is_empty() {
            return Self::anonymous();
        }
        let header = jar
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        Self {
            cookie: Some(SecretString::from(header)),
        }
    }

    /// Returns true if there is no cookie to send.
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.cookie.is_none()
    }

    /// The `Cookie` header value to send upstream.
    #[must_use]
    pub fn cookie_header(&self) -> Option<&str> {
        self.cookie.as_ref().map(|cookie| cookie.expose_secret())
    }

    /// Returns true if a cookie called `name` is present.
    #[must_use]
    pub fn has_cookie(&self, name: &str) -> bool {
        self.pairs().iter().any(|(n, _)| n == name)
    }

    /// A stable, non-reversible key for caches keyed by session.
    #[must_use]
    pub fn cache_key(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.cookie_header().unwrap_or_default().hash(&mut hasher);
        hasher.finish()
    }

    fn pairs(&self) -> Vec<(String, String)> {
        self.cookie_header()
            .map(|header| {
                header
                    .split(';')
                    .filter_map(|pair| {
                        let (name, value) = pair.trim().split_once('=')?;
                        let name = name.trim();
                        (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Split a `Set-Cookie` header into name, value and whether it expires now.
fn parse_set_cookie(header: &str) -> Option<(&str, &str, bool)> {
    let mut parts = header.split(';');
    let (name, value) = parts.next()?.trim().split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let value = value.trim().trim_matches('"');
    let expired = parts.any(|attr| {
        attr.split_once('=').is_some_and(|(key, val)| {
            key.trim().eq_ignore_ascii_case("max-age") && val.trim().starts_with(['0', '-'])
        })
    });
    Some((name, value, expired))
}
