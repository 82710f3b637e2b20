//! Test harness for the Aba Market client.
//!
//! Spins up an in-process mock of the storefront backend on an ephemeral
//! port and wires a [`StoreClient`] at it, so the full request path (headers,
//! status triage, session reactions) is exercised without a real server.
//!
//! The mock implements the same contract the client targets: camelCase JSON,
//! `{"message": ...}` error bodies, bearer tokens, the `X-Guest-ID` header
//! and the guest-to-user cart merge at login. Every request is recorded so
//! tests can assert on what actually went over the wire.

// Test support code; unwraps abort the test run, which is the point.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::Router;
use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post, put};
use serde_json::{Value, json};
use url::Url;

use aba_market_client::{ClientConfig, IdentityStore, MemoryStorage, StoreClient};

/// The seeded account's email.
pub const TEST_EMAIL: &str = "ada@example.com";
/// The seeded account's password.
pub const TEST_PASSWORD: &str = "secret";
/// The seeded account's user id.
pub const TEST_USER_ID: i64 = 7;

/// A variant the catalog fixture sells for ₦2,500.
pub const TOTE_VARIANT: i64 = 11;
/// A variant the catalog fixture sells for ₦4,500.
pub const SANDALS_VARIANT: i64 = 21;

/// One request as the mock backend saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub guest_id: Option<String>,
    pub bearer: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct CartRecord {
    // (variant id, quantity)
    lines: Vec<(i64, u32)>,
}

impl CartRecord {
    fn add(&mut self, variant: i64, quantity: u32) {
        if let Some(line) = self.lines.iter_mut().find(|(v, _)| *v == variant) {
            line.1 += quantity;
        } else {
            self.lines.push((variant, quantity));
        }
    }

    fn merge(&mut self, other: &Self) {
        for (variant, quantity) in &other.lines {
            self.add(*variant, *quantity);
        }
    }
}

#[derive(Debug, Clone)]
struct UserRecord {
    id: i64,
    first_name: String,
    last_name: String,
    email: String,
    password: String,
    address: Option<Value>,
}

/// Shared state of the mock backend.
pub struct MockBackend {
    users: Mutex<Vec<UserRecord>>,
    tokens: Mutex<HashMap<String, i64>>,
    guest_carts: Mutex<HashMap<String, CartRecord>>,
    user_carts: Mutex<HashMap<i64, CartRecord>>,
    orders: Mutex<HashMap<i64, Vec<Value>>>,
    next_order: AtomicU64,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            users: Mutex::new(vec![UserRecord {
                id: TEST_USER_ID,
                first_name: "Ada".to_string(),
                last_name: "Obi".to_string(),
                email: TEST_EMAIL.to_string(),
                password: TEST_PASSWORD.to_string(),
                address: None,
            }]),
            tokens: Mutex::new(HashMap::new()),
            guest_carts: Mutex::new(HashMap::new()),
            user_carts: Mutex::new(HashMap::new()),
            orders: Mutex::new(HashMap::new()),
            next_order: AtomicU64::new(1000),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl MockBackend {
    /// All requests seen so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests for one path.
    pub fn requests_for(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    /// Invalidate every issued token, simulating server-side expiry.
    pub fn revoke_all_tokens(&self) {
        self.tokens.lock().unwrap().clear();
    }

    fn user_for_token(&self, headers: &HeaderMap) -> Option<i64> {
        let bearer = bearer_token(headers)?;
        self.tokens.lock().unwrap().get(&bearer).copied()
    }
}

/// A running mock backend plus a client pointed at it.
pub struct TestContext {
    pub client: StoreClient,
    pub backend: Arc<MockBackend>,
    pub base_url: String,
}

impl TestContext {
    /// Start the mock backend on an ephemeral port and build a client with
    /// in-memory identity storage.
    pub async fn start() -> Self {
        let backend = Arc::new(MockBackend::default());
        let router = app(backend.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve mock backend");
        });

        let base_url = format!("http://{addr}/api");
        let config = ClientConfig::new(Url::parse(&base_url).unwrap());
        let identity = IdentityStore::open(MemoryStorage::default());
        let client = StoreClient::with_identity(&config, identity).expect("build client");

        Self {
            client,
            backend,
            base_url,
        }
    }

    /// A second client sharing this context's identity store, as a restarted
    /// process would after reading the persisted identity.
    pub fn reopened_client(&self) -> StoreClient {
        let config = ClientConfig::new(Url::parse(&self.base_url).unwrap());
        StoreClient::with_identity(&config, self.client.identity().clone())
            .expect("build client")
    }
}

// =============================================================================
// Router
// =============================================================================

fn app(backend: Arc<MockBackend>) -> Router {
    Router::new()
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/users/me", get(current_user))
        .route("/api/v1/users/me/address", put(update_address))
        .route("/api/v1/cart", get(get_cart))
        .route("/api/v1/cart/add", post(add_to_cart))
        .route("/api/v1/cart/remove/{variant}", delete(remove_from_cart))
        .route("/api/v1/cart/clear", delete(clear_cart))
        .route("/api/v1/orders", post(place_order))
        .route("/api/v1/orders/my-orders", get(order_history))
        .route("/api/products", get(list_products))
        .route("/api/products/search", get(search_products))
        .route("/api/products/{id}", get(get_product))
        .route("/api/categories/tree", get(category_tree))
        .layer(middleware::from_fn_with_state(
            backend.clone(),
            record_request,
        ))
        .with_state(backend)
}

async fn record_request(
    State(backend): State<Arc<MockBackend>>,
    request: Request,
    next: Next,
) -> Response {
    let recorded = RecordedRequest {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        guest_id: header_value(request.headers(), "x-guest-id"),
        bearer: bearer_token(request.headers()),
    };
    backend.requests.lock().unwrap().push(recorded);
    next.run(request).await
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    header_value(headers, header::AUTHORIZATION.as_str())
        .and_then(|v| v.strip_prefix("Bearer ").map(ToString::to_string))
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

// =============================================================================
// Catalog fixture
// =============================================================================

// (variant id, product id, product name, unit price in naira)
const VARIANTS: &[(i64, i64, &str, i64)] = &[
    (TOTE_VARIANT, 1, "Ankara Tote Bag", 2500),
    (SANDALS_VARIANT, 2, "Aba Leather Sandals", 4500),
];

fn variant(id: i64) -> Option<(i64, i64, &'static str, i64)> {
    VARIANTS.iter().copied().find(|(v, ..)| *v == id)
}

fn product_json(product_id: i64) -> Value {
    let variants: Vec<Value> = VARIANTS
        .iter()
        .filter(|(_, p, ..)| *p == product_id)
        .map(|(v, _, name, price)| {
            json!({ "id": v, "name": name, "price": price, "inStock": true })
        })
        .collect();
    let (_, _, name, price) = VARIANTS
        .iter()
        .copied()
        .find(|(_, p, ..)| *p == product_id)
        .unwrap();
    json!({
        "id": product_id,
        "name": name,
        "price": price,
        "category": "Fashion",
        "variants": variants,
    })
}

fn cart_json(record: &CartRecord) -> Value {
    let mut total: i64 = 0;
    let items: Vec<Value> = record
        .lines
        .iter()
        .filter_map(|(variant_id, quantity)| {
            let (_, _, name, price) = variant(*variant_id)?;
            let sub_total = price * i64::from(*quantity);
            total += sub_total;
            Some(json!({
                "variantId": variant_id,
                "productName": name,
                "quantity": quantity,
                "unitPrice": price,
                "subTotal": sub_total,
            }))
        })
        .collect();
    json!({ "items": items, "totalAmount": total })
}

fn profile_json(user: &UserRecord) -> Value {
    json!({
        "id": user.id,
        "firstName": user.first_name,
        "lastName": user.last_name,
        "email": user.email,
        "defaultAddress": user.address,
    })
}

// =============================================================================
// Auth & profile handlers
// =============================================================================

async fn login(State(backend): State<Arc<MockBackend>>, Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();
    let guest_id = body["guestId"].as_str().map(ToString::to_string);

    let user_id = {
        let users = backend.users.lock().unwrap();
        users
            .iter()
            .find(|u| u.email == username && u.password == password)
            .map(|u| u.id)
    };

    // A field-specific message on purpose; the client must not leak it.
    let Some(user_id) = user_id else {
        return error_body(StatusCode::UNAUTHORIZED, "Password incorrect for this account");
    };

    // Merge the guest cart into the account cart before the token goes out.
    if let Some(guest_id) = guest_id
        && let Some(guest_cart) = backend.guest_carts.lock().unwrap().remove(&guest_id)
    {
        backend
            .user_carts
            .lock()
            .unwrap()
            .entry(user_id)
            .or_default()
            .merge(&guest_cart);
    }

    let token = uuid::Uuid::new_v4().to_string();
    backend.tokens.lock().unwrap().insert(token.clone(), user_id);

    Json(json!({ "accessToken": token })).into_response()
}

async fn register(State(backend): State<Arc<MockBackend>>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let mut users = backend.users.lock().unwrap();

    if users.iter().any(|u| u.email == email) {
        return error_body(StatusCode::CONFLICT, "Email already in use");
    }

    let id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
    users.push(UserRecord {
        id,
        first_name: body["firstName"].as_str().unwrap_or_default().to_string(),
        last_name: body["lastName"].as_str().unwrap_or_default().to_string(),
        email,
        password: body["password"].as_str().unwrap_or_default().to_string(),
        address: None,
    });

    (StatusCode::CREATED, Json(json!({}))).into_response()
}

async fn current_user(State(backend): State<Arc<MockBackend>>, headers: HeaderMap) -> Response {
    let Some(user_id) = backend.user_for_token(&headers) else {
        return error_body(StatusCode::UNAUTHORIZED, "Invalid or expired token");
    };
    let users = backend.users.lock().unwrap();
    match users.iter().find(|u| u.id == user_id) {
        Some(user) => Json(profile_json(user)).into_response(),
        None => error_body(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn update_address(
    State(backend): State<Arc<MockBackend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some(user_id) = backend.user_for_token(&headers) else {
        return error_body(StatusCode::UNAUTHORIZED, "Invalid or expired token");
    };
    let mut users = backend.users.lock().unwrap();
    match users.iter_mut().find(|u| u.id == user_id) {
        Some(user) => {
            user.address = Some(body["address"].clone());
            Json(profile_json(user)).into_response()
        }
        None => error_body(StatusCode::NOT_FOUND, "User not found"),
    }
}

// =============================================================================
// Cart handlers
// =============================================================================

enum CartOwner {
    User(i64),
    Guest(String),
}

fn cart_owner(backend: &MockBackend, headers: &HeaderMap) -> Option<CartOwner> {
    if let Some(user_id) = backend.user_for_token(headers) {
        return Some(CartOwner::User(user_id));
    }
    if bearer_token(headers).is_some() {
        // Token present but unknown
        return None;
    }
    header_value(headers, "x-guest-id").map(CartOwner::Guest)
}

async fn get_cart(State(backend): State<Arc<MockBackend>>, headers: HeaderMap) -> Response {
    if bearer_token(&headers).is_some() && backend.user_for_token(&headers).is_none() {
        return error_body(StatusCode::UNAUTHORIZED, "Invalid or expired token");
    }
    let record = match cart_owner(&backend, &headers) {
        Some(CartOwner::User(user_id)) => backend.user_carts.lock().unwrap().get(&user_id).cloned(),
        Some(CartOwner::Guest(guest_id)) => {
            backend.guest_carts.lock().unwrap().get(&guest_id).cloned()
        }
        None => None,
    };
    match record {
        Some(record) => Json(cart_json(&record)).into_response(),
        None => error_body(StatusCode::NOT_FOUND, "Cart not found"),
    }
}

async fn add_to_cart(
    State(backend): State<Arc<MockBackend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if bearer_token(&headers).is_some() && backend.user_for_token(&headers).is_none() {
        return error_body(StatusCode::UNAUTHORIZED, "Invalid or expired token");
    }
    let variant_id = body["variantId"].as_i64().unwrap_or_default();
    let quantity = u32::try_from(body["quantity"].as_u64().unwrap_or_default()).unwrap_or(0);

    if variant(variant_id).is_none() {
        return error_body(StatusCode::BAD_REQUEST, "Unknown product variant");
    }
    if quantity == 0 {
        return error_body(StatusCode::BAD_REQUEST, "Quantity must be positive");
    }

    match cart_owner(&backend, &headers) {
        Some(CartOwner::User(user_id)) => {
            let mut carts = backend.user_carts.lock().unwrap();
            let record = carts.entry(user_id).or_default();
            record.add(variant_id, quantity);
            Json(cart_json(record)).into_response()
        }
        Some(CartOwner::Guest(guest_id)) => {
            let mut carts = backend.guest_carts.lock().unwrap();
            let record = carts.entry(guest_id).or_default();
            record.add(variant_id, quantity);
            Json(cart_json(record)).into_response()
        }
        None => error_body(StatusCode::BAD_REQUEST, "No cart identity"),
    }
}

async fn remove_from_cart(
    State(backend): State<Arc<MockBackend>>,
    Path(variant_id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    if bearer_token(&headers).is_some() && backend.user_for_token(&headers).is_none() {
        return error_body(StatusCode::UNAUTHORIZED, "Invalid or expired token");
    }
    let remove = |record: &mut CartRecord| record.lines.retain(|(v, _)| *v != variant_id);
    match cart_owner(&backend, &headers) {
        Some(CartOwner::User(user_id)) => {
            let mut carts = backend.user_carts.lock().unwrap();
            let record = carts.entry(user_id).or_default();
            remove(record);
            Json(cart_json(record)).into_response()
        }
        Some(CartOwner::Guest(guest_id)) => {
            let mut carts = backend.guest_carts.lock().unwrap();
            let record = carts.entry(guest_id).or_default();
            remove(record);
            Json(cart_json(record)).into_response()
        }
        None => error_body(StatusCode::NOT_FOUND, "Cart not found"),
    }
}

async fn clear_cart(State(backend): State<Arc<MockBackend>>, headers: HeaderMap) -> Response {
    if bearer_token(&headers).is_some() && backend.user_for_token(&headers).is_none() {
        return error_body(StatusCode::UNAUTHORIZED, "Invalid or expired token");
    }
    match cart_owner(&backend, &headers) {
        Some(CartOwner::User(user_id)) => {
            backend.user_carts.lock().unwrap().remove(&user_id);
        }
        Some(CartOwner::Guest(guest_id)) => {
            backend.guest_carts.lock().unwrap().remove(&guest_id);
        }
        None => {}
    }
    Json(cart_json(&CartRecord::default())).into_response()
}

// =============================================================================
// Order handlers
// =============================================================================

async fn place_order(
    State(backend): State<Arc<MockBackend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some(user_id) = backend.user_for_token(&headers) else {
        return error_body(StatusCode::UNAUTHORIZED, "Invalid or expired token");
    };

    let items = body["items"].as_array().cloned().unwrap_or_default();
    if items.is_empty() {
        return error_body(StatusCode::BAD_REQUEST, "Order has no items");
    }

    let mut total: i64 = 0;
    for item in &items {
        let variant_id = item["variantId"].as_i64().unwrap_or_default();
        let quantity = item["quantity"].as_i64().unwrap_or_default();
        let Some((_, _, _, price)) = variant(variant_id) else {
            return error_body(StatusCode::BAD_REQUEST, "Unknown product variant");
        };
        total += price * quantity;
    }

    let number = backend.next_order.fetch_add(1, Ordering::SeqCst);
    let confirmation = json!({
        "orderNumber": format!("AB-{number}"),
        "totalAmount": total,
        "status": "PENDING",
        "createdAt": "2026-02-14T10:00:00Z",
    });

    backend
        .orders
        .lock()
        .unwrap()
        .entry(user_id)
        .or_default()
        .push(confirmation.clone());
    backend.user_carts.lock().unwrap().remove(&user_id);

    (StatusCode::CREATED, Json(confirmation)).into_response()
}

async fn order_history(
    State(backend): State<Arc<MockBackend>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(user_id) = backend.user_for_token(&headers) else {
        return error_body(StatusCode::UNAUTHORIZED, "Invalid or expired token");
    };

    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(0);
    let size: usize = params.get("size").and_then(|s| s.parse().ok()).unwrap_or(10);

    let orders = backend.orders.lock().unwrap();
    let all = orders.get(&user_id).cloned().unwrap_or_default();
    let content: Vec<Value> = all.iter().rev().skip(page * size).take(size).cloned().collect();
    let total_pages = all.len().div_ceil(size.max(1));

    Json(json!({
        "content": content,
        "number": page,
        "totalPages": total_pages,
        "totalElements": all.len(),
    }))
    .into_response()
}

// =============================================================================
// Catalog handlers
// =============================================================================

async fn list_products() -> Response {
    let ids: Vec<i64> = {
        let mut seen = Vec::new();
        for (_, product_id, ..) in VARIANTS {
            if !seen.contains(product_id) {
                seen.push(*product_id);
            }
        }
        seen
    };
    let products: Vec<Value> = ids.into_iter().map(product_json).collect();
    Json(Value::Array(products)).into_response()
}

async fn get_product(Path(id): Path<i64>) -> Response {
    if VARIANTS.iter().any(|(_, p, ..)| *p == id) {
        Json(product_json(id)).into_response()
    } else {
        error_body(StatusCode::NOT_FOUND, "Product not found")
    }
}

async fn search_products(Query(params): Query<HashMap<String, String>>) -> Response {
    let query = params.get("q").cloned().unwrap_or_default().to_lowercase();
    let mut ids = Vec::new();
    for (_, product_id, name, _) in VARIANTS {
        if name.to_lowercase().contains(&query) && !ids.contains(product_id) {
            ids.push(*product_id);
        }
    }
    let products: Vec<Value> = ids.into_iter().map(product_json).collect();
    Json(Value::Array(products)).into_response()
}

async fn category_tree() -> Response {
    Json(json!([
        {
            "id": 1,
            "name": "Fashion",
            "slug": "fashion",
            "children": [
                { "id": 2, "name": "Bags", "slug": "bags", "children": [] },
                { "id": 3, "name": "Footwear", "slug": "footwear", "children": [] },
            ],
        },
        { "id": 4, "name": "Home", "slug": "home", "children": [] },
    ]))
    .into_response()
}
