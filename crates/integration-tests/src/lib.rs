//! Integration tests for the Metadots storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p metadots-integration-tests
//! ```
//!
//! No external services are needed. [`MockBackend`] serves the REST surface
//! the storefront consumes from an in-process axum server on an ephemeral
//! port, and the tests drive the real `reqwest`-based client and the real
//! gateway router against it.
//!
//! # Test Categories
//!
//! - `api_client` - Endpoint coverage and the error taxonomy
//! - `account` - Login, logout and the principal cache
//! - `cart_sync` - Cart store, badge and the mount scope
//! - `checkout` - The checkout state machine
//! - `guard` - Route guard decisions
//! - `gateway` - The gateway router end to end

#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{AppendHeaders, IntoResponse, Response},
    routing::{delete, get, post, put},
};
use chrono::Utc;
use metadots_core::{
    Cart, CartLine, Insights, Order, OrderId, OrderItem, PaymentStatus, Price, Principal, Product,
    ProductId, ProductPage, ProductSales, Role, UserId, UserList, UserRecord,
};
use metadots_storefront::api::{ApiClient, Session};
use metadots_storefront::config::{ApiConfig, StorefrontConfig};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use uuid::Uuid;

pub const SHOPPER_EMAIL: &str = "shopper@example.com";
pub const SHOPPER_PASSWORD: &str = "secret1";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin123";

/// Seeded product ids.
pub const MUG: &str = "p-mug";
pub const TEE: &str = "p-tee";
pub const POSTER: &str = "p-poster";

const TOKEN_COOKIE: &str = "access_token";

// =============================================================================
// Store
// =============================================================================

#[derive(Debug, Clone)]
struct MockUser {
    id: UserId,
    username: String,
    email: String,
    password: String,
    role: Role,
}

impl MockUser {
    fn principal(&self) -> Principal {
        Principal {
            id: self.id.clone(),
            username: Some(self.username.clone()),
            email: Some(self.email.clone()),
            role: self.role,
        }
    }

    fn record(&self) -> UserRecord {
        UserRecord {
            id: self.id.clone(),
            username: Some(self.username.clone()),
            email: Some(self.email.clone()),
            role: self.role,
            created_at: None,
        }
    }
}

#[derive(Debug, Default)]
struct Store {
    products: Vec<Product>,
    users: Vec<MockUser>,
    tokens: HashMap<String, UserId>,
    carts: HashMap<UserId, Cart>,
    orders: Vec<Order>,
    calls: HashMap<&'static str, usize>,
    checkout_url: Option<String>,
    checkout_local_flag: Option<bool>,
    fail_cart: bool,
    fail_checkout: bool,
    cart_delay: Option<Duration>,
}

fn product(id: &str, name: &str, price: i64, stock: i64, category: &str) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        description: Some(format!("A fine {}", name.to_lowercase())),
        price: Price::from_units(price),
        stock,
        category: Some(category.to_string()),
        images: vec![format!("/static/{id}.png")],
    }
}

impl Store {
    fn seeded() -> Self {
        Self {
            products: vec![
                product(MUG, "Mug", 250, 10, "kitchen"),
                product(TEE, "Tee", 800, 1, "apparel"),
                product(POSTER, "Poster", 100, 0, "decor"),
            ],
            users: vec![
                MockUser {
                    id: UserId::new("u-shopper"),
                    username: "shopper".to_string(),
                    email: SHOPPER_EMAIL.to_string(),
                    password: SHOPPER_PASSWORD.to_string(),
                    role: Role::User,
                },
                MockUser {
                    id: UserId::new("u-admin"),
                    username: "admin".to_string(),
                    email: ADMIN_EMAIL.to_string(),
                    password: ADMIN_PASSWORD.to_string(),
                    role: Role::Admin,
                },
            ],
            ..Self::default()
        }
    }

    fn user_for(&self, headers: &HeaderMap) -> Option<MockUser> {
        let token = token_from(headers)?;
        let id = self.tokens.get(&token)?;
        self.users.iter().find(|user| &user.id == id).cloned()
    }

    fn place_order(&mut self, user: &MockUser, items: Vec<CheckoutItemIn>) -> OrderId {
        let items: Vec<OrderItem> = items
            .into_iter()
            .map(|item| OrderItem {
                product_id: Some(ProductId::new(item.product_id)),
                quantity: item.quantity,
                price: item.price,
                name: item.name,
            })
            .collect();
        let total_amount = items.iter().map(|item| item.price.times(item.quantity)).sum();
        let id = OrderId::new(Uuid::new_v4().to_string());

        self.orders.push(Order {
            id: id.clone(),
            user_id: Some(user.id.clone()),
            items,
            total_amount,
            payment_status: PaymentStatus::Paid,
            created_at: Some(Utc::now()),
            simulated: true,
        });
        self.carts.remove(&user.id);
        id
    }
}

fn token_from(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value.to_string())
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn unauthorized() -> Response {
    detail(StatusCode::UNAUTHORIZED, "Not authenticated")
}

#[derive(Clone)]
struct Shared(Arc<Mutex<Store>>);

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Store> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn hit(&self, route: &'static str) {
        *self.lock().calls.entry(route).or_default() += 1;
    }

    fn user(&self, headers: &HeaderMap) -> Result<MockUser, Response> {
        self.lock().user_for(headers).ok_or_else(unauthorized)
    }

    fn admin(&self, headers: &HeaderMap) -> Result<MockUser, Response> {
        let user = self.user(headers)?;
        if user.role.is_admin() {
            Ok(user)
        } else {
            Err(detail(StatusCode::FORBIDDEN, "Admin access required"))
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Deserialize)]
struct LoginIn {
    email: String,
    password: String,
}

async fn login_route(State(shared): State<Shared>, Json(body): Json<LoginIn>) -> Response {
    shared.hit("login");
    let mut store = shared.lock();
    let Some(user) = store
        .users
        .iter()
        .find(|u| u.email == body.email && u.password == body.password)
        .cloned()
    else {
        return detail(StatusCode::UNAUTHORIZED, "Invalid credentials");
    };

    let token = Uuid::new_v4().to_string();
    store.tokens.insert(token.clone(), user.id);
    (
        AppendHeaders([
            (
                header::SET_COOKIE,
                format!("{TOKEN_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax"),
            ),
            (
                header::SET_COOKIE,
                format!("refresh_token=r-{token}; HttpOnly; Path=/api/auth"),
            ),
        ]),
        Json(json!({ "message": "Logged in" })),
    )
        .into_response()
}

#[derive(Deserialize)]
struct RegisterIn {
    username: String,
    email: String,
    password: String,
}

async fn register(State(shared): State<Shared>, Json(body): Json<RegisterIn>) -> Response {
    shared.hit("register");
    let mut store = shared.lock();
    if store.users.iter().any(|u| u.email == body.email) {
        return detail(StatusCode::BAD_REQUEST, "Email already registered");
    }
    let user = MockUser {
        id: UserId::new(Uuid::new_v4().to_string()),
        username: body.username,
        email: body.email,
        password: body.password,
        role: Role::User,
    };
    store.users.push(user.clone());
    Json(user.principal()).into_response()
}

async fn logout(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    shared.hit("logout");
    if let Some(token) = token_from(&headers) {
        shared.lock().tokens.remove(&token);
    }
    (
        AppendHeaders([
            (header::SET_COOKIE, format!("{TOKEN_COOKIE}=; Max-Age=0; Path=/")),
            (
                header::SET_COOKIE,
                "refresh_token=; Max-Age=0; Path=/api/auth".to_string(),
            ),
        ]),
        Json(json!({ "message": "Logged out" })),
    )
        .into_response()
}

async fn refresh(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    shared.hit("refresh");
    let user = match shared.user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let token = Uuid::new_v4().to_string();
    let mut store = shared.lock();
    if let Some(old) = token_from(&headers) {
        store.tokens.remove(&old);
    }
    store.tokens.insert(token.clone(), user.id);
    (
        AppendHeaders([(
            header::SET_COOKIE,
            format!("{TOKEN_COOKIE}={token}; HttpOnly; Path=/"),
        )]),
        Json(json!({ "message": "Refreshed" })),
    )
        .into_response()
}

async fn me(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    shared.hit("me");
    match shared.user(&headers) {
        Ok(user) => Json(user.principal()).into_response(),
        Err(response) => response,
    }
}

#[derive(Deserialize)]
struct ListQuery {
    q: Option<String>,
    category: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
    min_price: Option<i64>,
    max_price: Option<i64>,
    sort: Option<String>,
}

async fn list_products(State(shared): State<Shared>, Query(query): Query<ListQuery>) -> Response {
    shared.hit("products.list");
    let store = shared.lock();
    let mut items: Vec<Product> = store
        .products
        .iter()
        .filter(|p| {
            query
                .q
                .as_ref()
                .is_none_or(|q| p.name.to_lowercase().contains(&q.to_lowercase()))
        })
        .filter(|p| {
            query
                .category
                .as_ref()
                .is_none_or(|c| p.category.as_ref() == Some(c))
        })
        .filter(|p| {
            query
                .min_price
                .is_none_or(|min| p.price >= Price::from_units(min))
        })
        .filter(|p| {
            query
                .max_price
                .is_none_or(|max| p.price <= Price::from_units(max))
        })
        .cloned()
        .collect();

    match query.sort.as_deref() {
        Some("price_asc") => items.sort_by_key(|p| p.price),
        Some("price_desc") => items.sort_by_key(|p| std::cmp::Reverse(p.price)),
        Some("newest") => items.reverse(),
        _ => {}
    }

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(12).max(1);
    let total = items.len() as u64;
    let start = ((page - 1) * limit) as usize;
    let items = items.into_iter().skip(start).take(limit as usize).collect();

    Json(ProductPage {
        items,
        total,
        page,
        limit,
    })
    .into_response()
}

async fn categories(State(shared): State<Shared>) -> Response {
    shared.hit("products.categories");
    let store = shared.lock();
    let mut names: Vec<String> = store
        .products
        .iter()
        .filter_map(|p| p.category.clone())
        .collect();
    names.sort();
    names.dedup();
    Json(json!({ "categories": names })).into_response()
}

async fn get_product(State(shared): State<Shared>, Path(id): Path<String>) -> Response {
    shared.hit("products.get");
    let store = shared.lock();
    store.products.iter().find(|p| p.id.as_str() == id).map_or_else(
        || detail(StatusCode::NOT_FOUND, "Product not found"),
        |p| Json(p.clone()).into_response(),
    )
}

#[derive(Deserialize)]
struct ProductIn {
    name: String,
    description: Option<String>,
    price: Price,
    stock: i64,
    category: Option<String>,
    #[serde(default)]
    images: Vec<String>,
}

async fn create_product(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<ProductIn>,
) -> Response {
    shared.hit("products.create");
    if let Err(response) = shared.admin(&headers) {
        return response;
    }
    let created = Product {
        id: ProductId::new(Uuid::new_v4().to_string()),
        name: body.name,
        description: body.description,
        price: body.price,
        stock: body.stock,
        category: body.category,
        images: body.images,
    };
    shared.lock().products.push(created.clone());
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn update_product(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<Value>,
) -> Response {
    shared.hit("products.update");
    if let Err(response) = shared.admin(&headers) {
        return response;
    }
    let mut store = shared.lock();
    let Some(existing) = store.products.iter_mut().find(|p| p.id.as_str() == id) else {
        return detail(StatusCode::NOT_FOUND, "Product not found");
    };

    let Ok(mut merged) = serde_json::to_value(&*existing) else {
        return detail(StatusCode::INTERNAL_SERVER_ERROR, "encode failed");
    };
    if let (Some(target), Some(fields)) = (merged.as_object_mut(), patch.as_object()) {
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
    }
    match serde_json::from_value::<Product>(merged) {
        Ok(updated) => {
            *existing = updated.clone();
            Json(updated).into_response()
        }
        Err(e) => detail(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string()),
    }
}

async fn delete_product(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    shared.hit("products.delete");
    if let Err(response) = shared.admin(&headers) {
        return response;
    }
    let mut store = shared.lock();
    let before = store.products.len();
    store.products.retain(|p| p.id.as_str() != id);
    if store.products.len() == before {
        return detail(StatusCode::NOT_FOUND, "Product not found");
    }
    Json(json!({ "message": "Product deleted" })).into_response()
}

async fn upload_image(
    State(shared): State<Shared>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    shared.hit("products.upload");
    if let Err(response) = shared.admin(&headers) {
        return response;
    }
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("upload").to_string();
        return match field.bytes().await {
            Ok(bytes) if !bytes.is_empty() => {
                Json(json!({ "url": format!("/static/uploads/{name}") })).into_response()
            }
            _ => detail(StatusCode::BAD_REQUEST, "Empty file"),
        };
    }
    detail(StatusCode::BAD_REQUEST, "No file uploaded")
}

async fn get_cart(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    shared.hit("cart.get");
    let (delay, fail) = {
        let store = shared.lock();
        (store.cart_delay, store.fail_cart)
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    if fail {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let user = match shared.user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let cart = shared.lock().carts.get(&user.id).cloned().unwrap_or_default();
    Json(cart).into_response()
}

#[derive(Deserialize)]
struct LineIn {
    product_id: String,
    quantity: u32,
    price: Price,
}

async fn add_to_cart(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<LineIn>,
) -> Response {
    shared.hit("cart.add");
    let user = match shared.user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let mut store = shared.lock();
    let Some(product) = store
        .products
        .iter()
        .find(|p| p.id.as_str() == body.product_id)
        .cloned()
    else {
        return detail(StatusCode::NOT_FOUND, "Product not found");
    };

    let cart = store.carts.entry(user.id).or_default();
    let existing = cart
        .line(&product.id)
        .map_or(0, |line| line.quantity);
    if !product.has_stock_for(existing + body.quantity) {
        return detail(StatusCode::BAD_REQUEST, "Insufficient stock");
    }
    if existing > 0 {
        cart.set_quantity(&product.id, existing + body.quantity);
    } else {
        let mut line = CartLine::new(product.id.clone(), body.quantity, body.price);
        line.name = Some(product.name.clone());
        cart.items.push(line);
    }
    cart.updated_at = Some(Utc::now());
    Json(json!({ "message": "Added to cart" })).into_response()
}

async fn update_cart(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<LineIn>,
) -> Response {
    shared.hit("cart.update");
    let user = match shared.user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let mut store = shared.lock();
    let cart = store.carts.entry(user.id).or_default();
    if !cart.set_quantity(&ProductId::new(body.product_id), body.quantity) {
        return detail(StatusCode::NOT_FOUND, "Item not in cart");
    }
    cart.updated_at = Some(Utc::now());
    Json(json!({ "message": "Cart updated" })).into_response()
}

#[derive(Deserialize)]
struct RemoveQuery {
    product_id: String,
}

async fn remove_from_cart(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<RemoveQuery>,
) -> Response {
    shared.hit("cart.remove");
    let user = match shared.user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let mut store = shared.lock();
    let cart = store.carts.entry(user.id).or_default();
    cart.remove_line(&ProductId::new(query.product_id));
    cart.updated_at = Some(Utc::now());
    Json(json!({ "message": "Removed from cart" })).into_response()
}

#[derive(Deserialize)]
struct CheckoutItemIn {
    product_id: String,
    quantity: u32,
    price: Price,
    name: Option<String>,
}

#[derive(Deserialize)]
struct CheckoutIn {
    items: Vec<CheckoutItemIn>,
}

async fn checkout(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CheckoutIn>,
) -> Response {
    shared.hit("checkout");
    let user = match shared.user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if body.items.is_empty() {
        return detail(StatusCode::BAD_REQUEST, "No items provided");
    }
    let mut store = shared.lock();
    if store.fail_checkout {
        return detail(StatusCode::BAD_REQUEST, "Payment declined");
    }
    let order_id = store.place_order(&user, body.items);
    Json(json!({ "order_id": order_id, "message": "Order placed" })).into_response()
}

#[derive(Deserialize)]
struct SessionIn {
    items: Vec<CheckoutItemIn>,
    success_url: String,
    #[allow(dead_code)]
    cancel_url: String,
}

async fn create_checkout_session(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<SessionIn>,
) -> Response {
    shared.hit("checkout_session");
    let user = match shared.user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if body.items.is_empty() {
        return detail(StatusCode::BAD_REQUEST, "No items provided");
    }
    let mut store = shared.lock();
    if store.fail_checkout {
        return detail(StatusCode::BAD_REQUEST, "Payment declined");
    }
    let url = store
        .checkout_url
        .clone()
        .unwrap_or_else(|| body.success_url.clone());
    let local = store.checkout_local_flag;
    let order_id = store.place_order(&user, body.items);

    let mut response = json!({ "url": url, "order_id": order_id });
    if let Some(local) = local {
        response["simulated"] = json!(local);
    }
    Json(response).into_response()
}

async fn my_orders(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    shared.hit("orders.me");
    let user = match shared.user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let store = shared.lock();
    let orders: Vec<&Order> = store
        .orders
        .iter()
        .filter(|o| o.user_id.as_ref() == Some(&user.id))
        .collect();
    Json(json!({ "orders": orders })).into_response()
}

async fn all_orders(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    shared.hit("orders.admin");
    if let Err(response) = shared.admin(&headers) {
        return response;
    }
    Json(json!({ "orders": shared.lock().orders })).into_response()
}

#[derive(Deserialize)]
struct Paging {
    page: Option<u32>,
    limit: Option<u32>,
}

async fn list_users(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Query(paging): Query<Paging>,
) -> Response {
    shared.hit("admin.users.list");
    if let Err(response) = shared.admin(&headers) {
        return response;
    }
    let store = shared.lock();
    let page = paging.page.unwrap_or(1).max(1);
    let limit = paging.limit.unwrap_or(20).max(1);
    let users = store
        .users
        .iter()
        .skip(((page - 1) * limit) as usize)
        .take(limit as usize)
        .map(MockUser::record)
        .collect();
    Json(UserList {
        users,
        total: store.users.len() as u64,
        page,
        limit,
    })
    .into_response()
}

#[derive(Deserialize)]
struct NewUserIn {
    username: String,
    email: String,
    password: String,
    #[serde(default)]
    role: Role,
}

async fn create_user(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<NewUserIn>,
) -> Response {
    shared.hit("admin.users.create");
    if let Err(response) = shared.admin(&headers) {
        return response;
    }
    let mut store = shared.lock();
    if store.users.iter().any(|u| u.email == body.email) {
        return detail(StatusCode::BAD_REQUEST, "Email already registered");
    }
    let user = MockUser {
        id: UserId::new(Uuid::new_v4().to_string()),
        username: body.username,
        email: body.email,
        password: body.password,
        role: body.role,
    };
    store.users.push(user.clone());
    Json(user.record()).into_response()
}

#[derive(Deserialize)]
struct UserPatchIn {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
    role: Option<Role>,
}

async fn update_user(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<UserPatchIn>,
) -> Response {
    shared.hit("admin.users.update");
    if let Err(response) = shared.admin(&headers) {
        return response;
    }
    let mut store = shared.lock();
    let Some(user) = store.users.iter_mut().find(|u| u.id.as_str() == id) else {
        return detail(StatusCode::NOT_FOUND, "User not found");
    };
    if let Some(username) = patch.username {
        user.username = username;
    }
    if let Some(email) = patch.email {
        user.email = email;
    }
    if let Some(password) = patch.password {
        user.password = password;
    }
    if let Some(role) = patch.role {
        user.role = role;
    }
    Json(user.record()).into_response()
}

async fn delete_user(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    shared.hit("admin.users.delete");
    if let Err(response) = shared.admin(&headers) {
        return response;
    }
    let mut store = shared.lock();
    let before = store.users.len();
    store.users.retain(|u| u.id.as_str() != id);
    if store.users.len() == before {
        return detail(StatusCode::NOT_FOUND, "User not found");
    }
    Json(json!({ "message": "User deleted" })).into_response()
}

async fn insights(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    shared.hit("admin.insights");
    if let Err(response) = shared.admin(&headers) {
        return response;
    }
    let store = shared.lock();

    let mut sales: HashMap<ProductId, ProductSales> = HashMap::new();
    for item in store.orders.iter().flat_map(|o| &o.items) {
        let Some(id) = item.product_id.clone() else {
            continue;
        };
        let entry = sales.entry(id.clone()).or_insert_with(|| ProductSales {
            product_id: Some(id),
            name: item.name.clone(),
            quantity: 0,
            revenue: Price::ZERO,
        });
        entry.quantity += u64::from(item.quantity);
        entry.revenue = entry.revenue + item.price.times(item.quantity);
    }

    Json(Insights {
        users_count: store.users.len() as u64,
        products_count: store.products.len() as u64,
        orders_count: store.orders.len() as u64,
        carts_count: store.carts.len() as u64,
        visitors_count: 0,
        total_revenue: store.orders.iter().map(|o| o.total_amount).sum(),
        recent_orders: store.orders.iter().rev().take(5).cloned().collect(),
        product_sales: sales.into_values().collect(),
    })
    .into_response()
}

fn router(shared: Shared) -> Router {
    Router::new()
        .route("/api/auth/login", post(login_route))
        .route("/api/auth/register", post(register))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/me", get(me))
        .route("/api/products", get(list_products).post(create_product))
        .route("/api/products/categories", get(categories))
        .route("/api/products/upload-image", post(upload_image))
        .route(
            "/api/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/cart", get(get_cart))
        .route("/api/cart/add", post(add_to_cart))
        .route("/api/cart/update", put(update_cart))
        .route("/api/cart/remove", delete(remove_from_cart))
        .route("/api/checkout", post(checkout))
        .route(
            "/api/payments/create-checkout-session",
            post(create_checkout_session),
        )
        .route("/api/orders/me", get(my_orders))
        .route("/api/orders/admin", get(all_orders))
        .route("/api/admin/users", get(list_users).post(create_user))
        .route(
            "/api/admin/users/{id}",
            put(update_user).delete(delete_user),
        )
        .route("/api/admin/insights", get(insights))
        .with_state(shared)
}

// =============================================================================
// MockBackend
// =============================================================================

/// An in-process stand-in for the Metadots REST backend.
///
/// Seeded with a shopper, an admin and three products (one out of stock).
/// Every route counts its calls. The server stops when the value is dropped.
pub struct MockBackend {
    addr: SocketAddr,
    shared: Shared,
    server: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let shared = Shared(Arc::new(Mutex::new(Store::seeded())));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Mock backend has no address");

        let app = router(shared.clone());
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            shared,
            server,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new(self.base_url(), Duration::from_secs(5))
    }

    #[must_use]
    pub fn api_client(&self) -> ApiClient {
        ApiClient::new(&self.api_config()).expect("Failed to build API client")
    }

    /// Gateway configuration pointing at this backend, with the app itself
    /// at `app_base_url`.
    #[must_use]
    pub fn storefront_config(&self, app_base_url: &str) -> StorefrontConfig {
        let api_base = self.base_url();
        let app_base = app_base_url.to_string();
        StorefrontConfig::from_lookup(&move |key| match key {
            "METADOTS_API_BASE" => Some(api_base.clone()),
            "STOREFRONT_BASE_URL" => Some(app_base.clone()),
            "STOREFRONT_SUCCESS_REDIRECT_MS" => Some("1800".to_string()),
            _ => None,
        })
        .expect("Invalid storefront config")
    }

    /// How many times `route` was hit (e.g. `"me"`, `"cart.get"`).
    #[must_use]
    pub fn calls(&self, route: &str) -> usize {
        self.shared.lock().calls.get(route).copied().unwrap_or(0)
    }

    pub fn reset_calls(&self) {
        self.shared.lock().calls.clear();
    }

    /// URL returned by `create-checkout-session`. Defaults to the request's
    /// `success_url`.
    pub fn set_checkout_url(&self, url: Option<&str>) {
        self.shared.lock().checkout_url = url.map(String::from);
    }

    /// Explicit `simulated` flag on checkout session responses.
    pub fn set_checkout_local_flag(&self, local: Option<bool>) {
        self.shared.lock().checkout_local_flag = local;
    }

    /// Make `GET /api/cart` answer 500.
    pub fn set_fail_cart(&self, fail: bool) {
        self.shared.lock().fail_cart = fail;
    }

    /// Make both checkout endpoints reject with 400.
    pub fn set_fail_checkout(&self, fail: bool) {
        self.shared.lock().fail_checkout = fail;
    }

    /// Delay every `GET /api/cart` response.
    pub fn set_cart_delay(&self, delay: Option<Duration>) {
        self.shared.lock().cart_delay = delay;
    }

    #[must_use]
    pub fn order_count(&self) -> usize {
        self.shared.lock().orders.len()
    }

    /// Server-side cart of the user with `email`.
    #[must_use]
    pub fn cart_of(&self, email: &str) -> Cart {
        let store = self.shared.lock();
        store
            .users
            .iter()
            .find(|u| u.email == email)
            .and_then(|u| store.carts.get(&u.id).cloned())
            .unwrap_or_default()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Log in through the real client.
pub async fn login(api: &ApiClient, email: &str, password: &str) -> Session {
    api.login(&metadots_core::Credentials::new(email, password))
        .await
        .expect("Login failed")
}

/// Serve the real gateway router on an ephemeral port.
///
/// Returns its base URL and the server task.
pub async fn spawn_gateway(backend: &MockBackend) -> (String, JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind gateway");
    let addr = listener.local_addr().expect("Gateway has no address");
    let base = format!("http://{addr}");

    let state = metadots_storefront::state::AppState::new(backend.storefront_config(&base))
        .expect("Failed to build gateway state");
    let app = metadots_storefront::app(state);
    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (base, server)
}
