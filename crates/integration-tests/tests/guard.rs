//! Route guard decisions against real principal lookups.

#![allow(clippy::unwrap_used)]

use metadots_integration_tests::{
    ADMIN_EMAIL, ADMIN_PASSWORD, MockBackend, SHOPPER_EMAIL, SHOPPER_PASSWORD, login,
};
use metadots_storefront::guard::{GuardDecision, GuardPolicy, RouteGuard};

fn guard(backend: &MockBackend) -> RouteGuard {
    RouteGuard::new(backend.api_client(), GuardPolicy::default())
}

fn login_redirect(path: &str) -> GuardDecision {
    GuardDecision::Redirect(GuardPolicy::default().login_redirect(path))
}

#[tokio::test]
async fn test_anonymous_on_protected_path_redirects() {
    let backend = MockBackend::start().await;
    let guard = guard(&backend);

    let decision = guard.evaluate("/cart", None).await;
    assert_eq!(decision, GuardDecision::Redirect("/login?next=%2Fcart".to_string()));
    assert_eq!(backend.calls("me"), 1);
}

#[tokio::test]
async fn test_stale_cookie_redirects() {
    let backend = MockBackend::start().await;
    let guard = guard(&backend);

    let decision = guard
        .evaluate("/checkout", Some("access_token=revoked"))
        .await;
    assert_eq!(decision, login_redirect("/checkout"));
}

#[tokio::test]
async fn test_backend_down_redirects() {
    let backend = MockBackend::start().await;
    let guard = guard(&backend);
    drop(backend);

    let decision = guard.evaluate("/cart", Some("access_token=x")).await;
    assert_eq!(decision, login_redirect("/cart"));
}

#[tokio::test]
async fn test_shopper_passes_shop_paths() {
    let backend = MockBackend::start().await;
    let session = login(&backend.api_client(), SHOPPER_EMAIL, SHOPPER_PASSWORD).await;
    let guard = guard(&backend);

    let decision = guard.evaluate("/checkout/success", session.cookie_header()).await;
    assert_eq!(decision, GuardDecision::Pass);
}

#[tokio::test]
async fn test_shopper_on_admin_path_redirects_like_anonymous() {
    let backend = MockBackend::start().await;
    let session = login(&backend.api_client(), SHOPPER_EMAIL, SHOPPER_PASSWORD).await;
    let guard = guard(&backend);

    let as_shopper = guard.evaluate("/admin/users", session.cookie_header()).await;
    let as_anonymous = guard.evaluate("/admin/users", None).await;
    assert_eq!(as_shopper, as_anonymous);
    assert_eq!(as_shopper, login_redirect("/admin/users"));
}

#[tokio::test]
async fn test_admin_passes_admin_paths() {
    let backend = MockBackend::start().await;
    let session = login(&backend.api_client(), ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let guard = guard(&backend);

    let decision = guard.evaluate("/admin/insights", session.cookie_header()).await;
    assert_eq!(decision, GuardDecision::Pass);
    assert_eq!(backend.calls("me"), 1);
}

#[tokio::test]
async fn test_unprotected_paths_make_no_call() {
    let backend = MockBackend::start().await;
    let guard = guard(&backend);

    for path in ["/", "/products", "/cartography", "/login", "/health"] {
        assert_eq!(guard.evaluate(path, None).await, GuardDecision::Pass);
    }
    assert_eq!(backend.calls("me"), 0);
}
