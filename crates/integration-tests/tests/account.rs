//! Account service: validation, auth announcements and the principal cache.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use metadots_core::Registration;
use metadots_integration_tests::{ADMIN_EMAIL, ADMIN_PASSWORD, MockBackend, SHOPPER_EMAIL, SHOPPER_PASSWORD};
use metadots_storefront::account::Account;
use metadots_storefront::api::{ApiError, Session};
use metadots_storefront::events::{EventBus, Signal, StoreEvent};

#[tokio::test]
async fn test_invalid_login_makes_no_call() {
    let backend = MockBackend::start().await;
    let account = Account::new(backend.api_client(), EventBus::new());

    let err = account.login("not-an-email", "whatever").await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    let err = account.login(SHOPPER_EMAIL, "").await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(backend.calls("login"), 0);
}

#[tokio::test]
async fn test_invalid_registration_makes_no_call() {
    let backend = MockBackend::start().await;
    let account = Account::new(backend.api_client(), EventBus::new());

    let registration = Registration {
        username: "ab".to_string(),
        email: "ab@example.com".to_string(),
        password: "longenough".to_string(),
    };
    assert!(account.register(&registration).await.is_err());
    assert_eq!(backend.calls("register"), 0);
}

#[tokio::test]
async fn test_register_then_login() {
    let backend = MockBackend::start().await;
    let account = Account::new(backend.api_client(), EventBus::new());

    let registration = Registration {
        username: "newbie".to_string(),
        email: "newbie@example.com".to_string(),
        password: "hunter22".to_string(),
    };
    let principal = account.register(&registration).await.unwrap();
    assert_eq!(principal.email.as_deref(), Some("newbie@example.com"));

    let session = account.login("newbie@example.com", "hunter22").await.unwrap();
    assert_eq!(account.whoami(&session).await.unwrap().id, principal.id);
}

#[tokio::test]
async fn test_login_and_logout_publish_auth_changed() {
    let backend = MockBackend::start().await;
    let events = EventBus::new();
    let account = Account::new(backend.api_client(), events.clone());
    let mut subscription = events.subscribe();

    let session = account.login(SHOPPER_EMAIL, SHOPPER_PASSWORD).await.unwrap();
    assert_eq!(
        subscription.try_recv(),
        Some(Signal::Event(StoreEvent::AuthChanged))
    );

    let remaining = account.logout(&session).await.unwrap();
    assert!(remaining.is_anonymous());
    assert_eq!(
        subscription.try_recv(),
        Some(Signal::Event(StoreEvent::AuthChanged))
    );
}

#[tokio::test]
async fn test_current_user_fails_open() {
    let backend = MockBackend::start().await;
    let account = Account::new(backend.api_client(), EventBus::new());

    assert!(account.current_user(&Session::anonymous()).await.is_none());
    assert!(
        account
            .current_user(&Session::forwarded("access_token=stale"))
            .await
            .is_none()
    );
}

#[tokio::test]
async fn test_cache_absorbs_repeat_lookups() {
    let backend = MockBackend::start().await;
    let account = Account::with_cache_ttl(
        backend.api_client(),
        EventBus::new(),
        Some(Duration::from_secs(30)),
    );
    let session = account.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();

    for _ in 0..3 {
        assert!(account.whoami(&session).await.unwrap().is_admin());
    }
    assert_eq!(backend.calls("me"), 1);
}

#[tokio::test]
async fn test_auth_change_elsewhere_flushes_cache() {
    let backend = MockBackend::start().await;
    let events = EventBus::new();
    let account = Account::with_cache_ttl(
        backend.api_client(),
        events.clone(),
        Some(Duration::from_secs(30)),
    );
    let session = account.login(SHOPPER_EMAIL, SHOPPER_PASSWORD).await.unwrap();

    account.whoami(&session).await.unwrap();
    events.publish(StoreEvent::AuthChanged);
    account.whoami(&session).await.unwrap();

    assert_eq!(backend.calls("me"), 2);
}

#[tokio::test]
async fn test_no_cache_by_default() {
    let backend = MockBackend::start().await;
    let account = Account::new(backend.api_client(), EventBus::new());
    let session = account.login(SHOPPER_EMAIL, SHOPPER_PASSWORD).await.unwrap();

    account.whoami(&session).await.unwrap();
    account.whoami(&session).await.unwrap();
    assert_eq!(backend.calls("me"), 2);
}
