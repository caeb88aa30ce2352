//! API client against the mock backend: endpoint coverage and error shapes.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use metadots_core::{
    NewUser, ProductId, ProductInput, ProductPatch, ProductQuery, ProductSort, Price, Role,
    UserPatch,
};
use metadots_integration_tests::{
    ADMIN_EMAIL, ADMIN_PASSWORD, MUG, MockBackend, SHOPPER_EMAIL, SHOPPER_PASSWORD, login,
};
use metadots_storefront::api::{ApiBody, ApiClient, ErrorKind, Session};
use metadots_storefront::config::ApiConfig;
use reqwest::{Method, StatusCode};

#[tokio::test]
async fn test_list_products_with_filters() {
    let backend = MockBackend::start().await;
    let api = backend.api_client();

    let all = api
        .list_products(&Session::anonymous(), &ProductQuery::default())
        .await
        .unwrap();
    assert_eq!(all.total, 3);

    let query = ProductQuery {
        max_price: Some(300),
        sort: Some(ProductSort::PriceDesc),
        ..ProductQuery::default()
    };
    let cheap = api.list_products(&Session::anonymous(), &query).await.unwrap();
    let names: Vec<&str> = cheap.items.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Mug", "Poster"]);
}

#[tokio::test]
async fn test_categories_and_single_product() {
    let backend = MockBackend::start().await;
    let api = backend.api_client();
    let session = Session::anonymous();

    let categories = api.categories(&session).await.unwrap();
    assert_eq!(categories.names(), ["apparel", "decor", "kitchen"]);

    let mug = api.get_product(&session, &ProductId::new(MUG)).await.unwrap();
    assert_eq!(mug.price, Price::from_units(250));
    assert_eq!(mug.stock, 10);
}

#[tokio::test]
async fn test_structured_error_carries_detail() {
    let backend = MockBackend::start().await;
    let api = backend.api_client();

    let err = api
        .get_product(&Session::anonymous(), &ProductId::new("nope"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structured);
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(err.detail().as_deref(), Some("Product not found"));
    assert_eq!(err.user_message(), "Product not found");
}

#[tokio::test]
async fn test_status_only_error() {
    let backend = MockBackend::start().await;
    backend.set_fail_cart(true);
    let api = backend.api_client();

    let err = api.get_cart(&Session::anonymous()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StatusOnly);
    assert_eq!(err.to_string(), "Request failed: 500");
    assert!(err.detail().is_none());
}

#[tokio::test]
async fn test_unauthorized_without_session() {
    let backend = MockBackend::start().await;
    let api = backend.api_client();

    let err = api.me(&Session::anonymous()).await.unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_transport_error_when_backend_is_down() {
    let config = ApiConfig::new("http://127.0.0.1:9", Duration::from_secs(2));
    let api = ApiClient::new(&config).unwrap();

    let err = api.me(&Session::anonymous()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(err.status().is_none());
}

#[tokio::test]
async fn test_raw_call_returns_json_body() {
    let backend = MockBackend::start().await;
    let api = backend.api_client();

    let response = api
        .raw(Method::GET, "/api/products/categories", &Session::anonymous(), None)
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert!(matches!(response.body, ApiBody::Json(_)));
}

#[tokio::test]
async fn test_login_refresh_logout_cookies() {
    let backend = MockBackend::start().await;
    let api = backend.api_client();

    let session = login(&api, SHOPPER_EMAIL, SHOPPER_PASSWORD).await;
    assert!(session.has_cookie("access_token"));
    assert!(session.has_cookie("refresh_token"));

    let refreshed = api.refresh(&session).await.unwrap();
    assert_ne!(refreshed.cookie_header(), session.cookie_header());
    assert_eq!(
        api.me(&refreshed).await.unwrap().email.as_deref(),
        Some(SHOPPER_EMAIL)
    );

    let remaining = api.logout(&refreshed).await.unwrap();
    assert!(remaining.is_anonymous());
    assert!(api.me(&refreshed).await.unwrap_err().is_unauthorized());
}

#[tokio::test]
async fn test_wrong_password() {
    let backend = MockBackend::start().await;
    let api = backend.api_client();

    let err = api
        .login(&metadots_core::Credentials::new(SHOPPER_EMAIL, "wrong-one"))
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.user_message(), "Invalid credentials");
}

#[tokio::test]
async fn test_admin_product_lifecycle() {
    let backend = MockBackend::start().await;
    let api = backend.api_client();
    let admin = login(&api, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let created = api
        .create_product(
            &admin,
            &ProductInput {
                name: "Lamp".to_string(),
                description: None,
                price: Price::from_units(4500),
                stock: 3,
                category: Some("decor".to_string()),
                images: Vec::new(),
            },
        )
        .await
        .unwrap();

    let patch = ProductPatch {
        stock: Some(7),
        ..ProductPatch::default()
    };
    let updated = api.update_product(&admin, &created.id, &patch).await.unwrap();
    assert_eq!(updated.stock, 7);
    assert_eq!(updated.name, "Lamp");

    api.delete_product(&admin, &created.id).await.unwrap();
    let err = api.get_product(&admin, &created.id).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn test_shopper_cannot_create_products() {
    let backend = MockBackend::start().await;
    let api = backend.api_client();
    let shopper = login(&api, SHOPPER_EMAIL, SHOPPER_PASSWORD).await;

    let err = api
        .create_product(
            &shopper,
            &ProductInput {
                name: "Lamp".to_string(),
                description: None,
                price: Price::from_units(1),
                stock: 1,
                category: None,
                images: Vec::new(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
}

#[tokio::test]
async fn test_upload_image() {
    let backend = MockBackend::start().await;
    let api = backend.api_client();
    let admin = login(&api, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let uploaded = api
        .upload_image(&admin, "mug.png", "image/png", vec![0x89, b'P', b'N', b'G'])
        .await
        .unwrap();
    assert_eq!(uploaded.url, "/static/uploads/mug.png");
}

#[tokio::test]
async fn test_admin_user_management() {
    let backend = MockBackend::start().await;
    let api = backend.api_client();
    let admin = login(&api, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let created = api
        .create_user(
            &admin,
            &NewUser {
                username: "newbie".to_string(),
                email: "newbie@example.com".to_string(),
                password: "hunter22".to_string(),
                role: Role::User,
            },
        )
        .await
        .unwrap();

    let list = api.list_users(&admin, 1, 20).await.unwrap();
    assert_eq!(list.total, 3);

    let promoted = api
        .update_user(
            &admin,
            &created.id,
            &UserPatch {
                role: Some(Role::Admin),
                ..UserPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(promoted.role, Role::Admin);

    api.delete_user(&admin, &created.id).await.unwrap();
    assert_eq!(api.list_users(&admin, 1, 20).await.unwrap().total, 2);
}

#[tokio::test]
async fn test_insights_after_an_order() {
    let backend = MockBackend::start().await;
    let api = backend.api_client();
    let shopper = login(&api, SHOPPER_EMAIL, SHOPPER_PASSWORD).await;
    let admin = login(&api, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let cart = metadots_core::Cart {
        items: vec![metadots_core::CartLine::new(MUG, 2, Price::from_units(250))],
        updated_at: None,
    };
    api.checkout(&shopper, &metadots_core::CheckoutRequest::from_cart(&cart))
        .await
        .unwrap();

    let insights = api.insights(&admin).await.unwrap();
    assert_eq!(insights.orders_count, 1);
    assert_eq!(insights.total_revenue, Price::from_units(500));
    assert_eq!(insights.top_seller().unwrap().quantity, 2);

    assert_eq!(api.my_orders(&shopper).await.unwrap().orders.len(), 1);
    assert_eq!(api.all_orders(&admin).await.unwrap().orders.len(), 1);
    assert_eq!(
        api.all_orders(&shopper).await.unwrap_err().status(),
        Some(StatusCode::FORBIDDEN)
    );
}
