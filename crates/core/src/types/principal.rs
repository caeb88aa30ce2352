//! The authenticated principal returned by `GET /api/auth/me`.

use serde::{Deserialize, Serialize};

use super::id::UserId;
use super::status::Role;

/// Who the current session belongs to.
///
/// Held by the backend and re-resolved on every navigation; the client never
/// treats a copy as authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "role_or_user")]
    pub role: Role,
}

/// A missing, null or unknown role is a plain user.
fn role_or_user<'de, D>(deserializer: D) -> Result<Role, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|r| r.parse().ok()).unwrap_or_default())
}

impl Principal {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Best human-readable label: username, then email, then id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or_else(|| self.id.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_principal() {
        let p: Principal = serde_json::from_str(
            r#"{"id":"u1","username":"root","email":"root@metadots.co","role":"admin"}"#,
        )
        .unwrap();
        assert!(p.is_admin());
        assert_eq!(p.display_name(), "root");
    }

    #[test]
    fn test_role_defaults_to_user() {
        let missing: Principal = serde_json::from_str(r#"{"id":"u2"}"#).unwrap();
        let null: Principal = serde_json::from_str(r#"{"id":"u3","role":null}"#).unwrap();
        let odd: Principal = serde_json::from_str(r#"{"id":"u4","role":"owner"}"#).unwrap();
        assert!(!missing.is_admin());
        assert!(!null.is_admin());
        assert!(!odd.is_admin());
        assert_eq!(missing.display_name(), "u2");
    }
}
