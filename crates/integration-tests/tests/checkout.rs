//! Checkout state machine against the mock backend.

#![allow(clippy::unwrap_used)]

use metadots_core::{Cart, CartLine, Price};
use metadots_integration_tests::{MUG, MockBackend, SHOPPER_EMAIL, SHOPPER_PASSWORD, login};
use metadots_storefront::api::Session;
use metadots_storefront::checkout::{
    CheckoutError, CheckoutFlow, CheckoutPhase, CheckoutReturn, UrlClassifier,
};
use metadots_storefront::events::{EventBus, Signal, StoreEvent};
use url::Url;

const APP: &str = "http://localhost:3000";

struct Fixture {
    backend: MockBackend,
    session: Session,
    cart: Cart,
}

async fn fixture() -> Fixture {
    let backend = MockBackend::start().await;
    let api = backend.api_client();
    let session = login(&api, SHOPPER_EMAIL, SHOPPER_PASSWORD).await;
    api.add_to_cart(&session, &CartLine::new(MUG, 2, Price::from_units(250)))
        .await
        .unwrap();
    let cart = api.get_cart(&session).await.unwrap();
    Fixture {
        backend,
        session,
        cart,
    }
}

fn flow(fixture: &Fixture, events: &EventBus) -> CheckoutFlow {
    let classifier = UrlClassifier::new(Url::parse(APP).unwrap(), ["localhost", "127.0.0.1"]);
    CheckoutFlow::new(
        fixture.backend.api_client(),
        events.clone(),
        classifier,
        fixture.session.clone(),
    )
}

#[tokio::test]
async fn test_empty_cart_never_reaches_backend() {
    let fixture = fixture().await;
    let flow = flow(&fixture, &EventBus::new());

    let err = flow.place_order(&Cart::empty()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));
    let err = flow.simulate_payment(&Cart::empty()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));

    assert_eq!(fixture.backend.calls("checkout_session"), 0);
    assert_eq!(fixture.backend.calls("checkout"), 0);
    assert_eq!(flow.phase(), CheckoutPhase::Idle);
}

#[tokio::test]
async fn test_same_origin_url_is_local_success() {
    let fixture = fixture().await;
    let events = EventBus::new();
    let mut subscription = events.subscribe();
    let flow = flow(&fixture, &events);

    let phase = flow.place_order(&fixture.cart).await.unwrap();
    let CheckoutPhase::LocalSuccess { order_id } = phase else {
        panic!("expected local success, got {phase:?}");
    };
    assert!(order_id.is_some());
    assert_eq!(
        subscription.try_recv(),
        Some(Signal::Event(StoreEvent::CartChanged))
    );
    assert!(fixture.backend.cart_of(SHOPPER_EMAIL).is_empty());
}

#[tokio::test]
async fn test_local_host_on_other_port_is_local_success() {
    let fixture = fixture().await;
    fixture
        .backend
        .set_checkout_url(Some("http://127.0.0.1:8000/checkout/success"));
    let flow = flow(&fixture, &EventBus::new());

    let phase = flow.place_order(&fixture.cart).await.unwrap();
    assert!(matches!(phase, CheckoutPhase::LocalSuccess { .. }));
}

#[tokio::test]
async fn test_foreign_origin_is_external_redirect() {
    let fixture = fixture().await;
    fixture
        .backend
        .set_checkout_url(Some("https://pay.example.com/session/cs_123"));
    let events = EventBus::new();
    let mut subscription = events.subscribe();
    let flow = flow(&fixture, &events);

    let phase = flow.place_order(&fixture.cart).await.unwrap();
    let CheckoutPhase::ExternalRedirect { url } = phase else {
        panic!("expected external redirect, got {phase:?}");
    };
    assert_eq!(url.as_str(), "https://pay.example.com/session/cs_123");
    assert!(subscription.try_recv().is_none());
}

#[tokio::test]
async fn test_lookalike_host_is_external() {
    let fixture = fixture().await;
    fixture
        .backend
        .set_checkout_url(Some("https://localhost.pay.example.com/cs_1"));
    let flow = flow(&fixture, &EventBus::new());

    let phase = flow.place_order(&fixture.cart).await.unwrap();
    assert!(matches!(phase, CheckoutPhase::ExternalRedirect { .. }));
}

#[tokio::test]
async fn test_explicit_flag_overrides_url() {
    let fixture = fixture().await;
    fixture
        .backend
        .set_checkout_url(Some("https://pay.example.com/simulated"));
    fixture.backend.set_checkout_local_flag(Some(true));
    let flow = flow(&fixture, &EventBus::new());

    let phase = flow.place_order(&fixture.cart).await.unwrap();
    assert!(matches!(phase, CheckoutPhase::LocalSuccess { .. }));
}

#[tokio::test]
async fn test_simulated_payment() {
    let fixture = fixture().await;
    let flow = flow(&fixture, &EventBus::new());

    let phase = flow.simulate_payment(&fixture.cart).await.unwrap();
    assert!(matches!(
        phase,
        CheckoutPhase::LocalSuccess { order_id: Some(_) }
    ));
    assert_eq!(fixture.backend.order_count(), 1);

    let resolved = flow.resolve(CheckoutReturn::Success { order_id: None });
    assert!(matches!(resolved, CheckoutPhase::Resolved { order_id: Some(_) }));
    assert!(resolved.is_terminal());
}

#[tokio::test]
async fn test_failure_returns_to_idle_with_cart_intact() {
    let fixture = fixture().await;
    fixture.backend.set_fail_checkout(true);
    let flow = flow(&fixture, &EventBus::new());

    let err = flow.place_order(&fixture.cart).await.unwrap_err();
    assert_eq!(err.user_message(), "Payment declined");
    assert_eq!(flow.phase(), CheckoutPhase::Idle);
    assert_eq!(fixture.backend.cart_of(SHOPPER_EMAIL).items, fixture.cart.items);

    // Retry after the backend recovers.
    fixture.backend.set_fail_checkout(false);
    assert!(flow.place_order(&fixture.cart).await.is_ok());
}

#[tokio::test]
async fn test_cancel_return() {
    let fixture = fixture().await;
    let flow = flow(&fixture, &EventBus::new());

    assert_eq!(flow.resolve(CheckoutReturn::Cancel), CheckoutPhase::Canceled);
    assert_eq!(fixture.backend.calls("checkout_session"), 0);
}
