//! Back-office types: user management and store insights.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ProductId, UserId};
use super::order::Order;
use super::price::Price;
use super::status::Role;
use super::timestamp;

/// A user as listed by `GET /api/admin/users`. Never carries a password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub created_at: Option<DateTime<Utc>>,
}

/// One page of users.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserList {
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
}

/// Body of `POST /api/admin/users`.
#[derive(Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

/// Body of `PUT /api/admin/users/{id}`. Only set fields are sent.
#[derive(Clone, Default, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl std::fmt::Debug for UserPatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserPatch")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("role", &self.role)
            .finish()
    }
}

impl UserPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.role.is_none()
    }
}

/// Per-product sales line in [`Insights`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSales {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: u64,
    #[serde(default)]
    pub revenue: Price,
}

/// Response of `GET /api/admin/insights`. Every field is optional upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insights {
    #[serde(default)]
    pub users_count: u64,
    #[serde(default)]
    pub products_count: u64,
    #[serde(default)]
    pub orders_count: u64,
    #[serde(default)]
    pub carts_count: u64,
    #[serde(default)]
    pub visitors_count: u64,
    #[serde(default)]
    pub total_revenue: Price,
    #[serde(default)]
    pub recent_orders: Vec<Order>,
    #[serde(default)]
    pub product_sales: Vec<ProductSales>,
}

impl Insights {
    /// Best seller by quantity, if any sales are recorded.
    #[must_use]
    pub fn top_seller(&self) -> Option<&ProductSales> {
        self.product_sales.iter().max_by_key(|sales| sales.quantity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_insights_tolerates_missing_fields() {
        let insights: Insights = serde_json::from_str(r#"{"users_count":4}"#).unwrap();
        assert_eq!(insights.users_count, 4);
        assert_eq!(insights.total_revenue, Price::ZERO);
        assert!(insights.top_seller().is_none());
    }

    #[test]
    fn test_top_seller() {
        let json = r#"{"product_sales":[
            {"product_id":"a","name":"Mug","quantity":3,"revenue":30},
            {"product_id":"b","name":"Tee","quantity":7,"revenue":140}]}"#;
        let insights: Insights = serde_json::from_str(json).unwrap();
        assert_eq!(insights.top_seller().unwrap().name.as_deref(), Some("Tee"));
    }

    #[test]
    fn test_user_patch_sends_only_set_fields() {
        let patch = UserPatch {
            role: Some(Role::Admin),
            ..UserPatch::default()
        };
        assert!(!patch.is_empty());
        assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"role":"admin"}"#);
    }

    #[test]
    fn test_new_user_debug_redacts_password() {
        let user = NewUser {
            username: "ann".to_string(),
            email: "ann@metadots.co".to_string(),
            password: "p4ssw0rd".to_string(),
            role: Role::User,
        };
        assert!(!format!("{user:?}").contains("p4ssw0rd"));
    }
}
