//! In-process stand-in for the ResumeIt backend, used by HTTP-level tests.
//! Collections are kept as raw JSON objects so the wire format under test is
//! exactly what the real API sends.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};

use crate::api::ApiClient;
use crate::session::{
    CredentialStore, LoginRedirect, MemoryCredentialStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY,
};

const PAGE_SIZE: usize = 10;
pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "secret";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
}

#[derive(Default)]
struct Db {
    collections: HashMap<&'static str, BTreeMap<i64, Value>>,
    next_id: i64,
    access_tokens: HashSet<String>,
    refresh_tokens: HashSet<String>,
    issued: u64,
    requests: Vec<RecordedRequest>,
}

impl Db {
    fn insert(&mut self, collection: &'static str, mut item: Value) -> Value {
        self.next_id += 1;
        item["id"] = json!(self.next_id);
        self.collections
            .entry(collection)
            .or_default()
            .insert(self.next_id, item.clone());
        item
    }

    fn issue(&mut self, prefix: &str) -> String {
        self.issued += 1;
        format!("{prefix}-{}", self.issued)
    }
}

#[derive(Clone)]
pub struct MockBackend {
    db: Arc<Mutex<Db>>,
    latency: Duration,
}

impl Default for MockBackend {
    fn default() -> Self {
        let backend = Self {
            db: Arc::new(Mutex::new(Db::default())),
            latency: Duration::ZERO,
        };
        backend.db.lock().insert(
            "users",
            json!({
                "username": ADMIN_USERNAME, "email": "admin@resumeit.app",
                "first_name": "Ada", "last_name": "Admin", "is_active": true,
                "is_staff": true, "is_superuser": true,
                "date_joined": "2024-01-02T09:00:00Z", "last_login": null, "profile": null
            }),
        );
        backend
    }
}

impl MockBackend {
    /// Backend pre-populated with a small but varied dataset.
    pub fn seeded() -> Self {
        let backend = Self::default();
        {
            let mut db = backend.db.lock();
            for (username, active, tier, joined) in [
                ("jane", true, "premium", "2024-06-10T12:00:00Z"),
                ("omar", true, "free", "2024-06-12T12:00:00Z"),
                ("li", false, "free", "2024-06-01T12:00:00Z"),
            ] {
                db.insert(
                    "users",
                    json!({
                        "username": username, "email": format!("{username}@example.com"),
                        "first_name": "", "last_name": "", "is_active": active,
                        "is_staff": false, "is_superuser": false, "date_joined": joined,
                        "last_login": null,
                        "profile": {
                            "subscription_tier": tier, "resume_count": 2, "avg_ats_score": 70.5
                        }
                    }),
                );
            }
            for (name, category, premium, usage, score) in [
                ("Modern", "Professional", false, 120, 82.0),
                ("Canvas", "Creative", true, 45, 74.5),
                ("Studio", "Creative", false, 30, 68.0),
            ] {
                db.insert(
                    "templates",
                    json!({
                        "name": name, "description": format!("{name} layout"),
                        "category": category, "thumbnail": null,
                        "html_structure": format!("<h1>{name}</h1>"),
                        "css_styles": "h1 { color: #123; }",
                        "is_premium": premium, "is_featured": false,
                        "usage_count": usage, "avg_ats_score": score, "tags": ["clean"],
                        "created_at": "2024-05-01T00:00:00Z"
                    }),
                );
            }
            for (name, description, count) in [
                ("Professional", "Conservative layouts", 1),
                ("Creative", "Bold layouts for design roles", 2),
            ] {
                db.insert(
                    "categories",
                    json!({"name": name, "description": description, "template_count": count}),
                );
            }
            let plan = db.insert(
                "plans",
                json!({
                    "name": "Pro", "price": "12.00", "duration_months": 1,
                    "features": ["Unlimited resumes", "ATS scan"], "is_active": true,
                    "subscriber_count": 1
                }),
            );
            let sub = db.insert(
                "subscriptions",
                json!({
                    "user": 2, "plan": plan["id"], "status": "active",
                    "start_date": "2024-06-10T12:00:00Z", "end_date": "2024-07-10T12:00:00Z",
                    "auto_renew": true
                }),
            );
            for (amount, status) in [
                ("12.00", "completed"),
                ("12.00", "completed"),
                ("12.00", "failed"),
                ("12.00", "pending"),
                ("12.00", "refunded"),
            ] {
                db.insert(
                    "transactions",
                    json!({
                        "subscription": sub["id"], "amount": amount, "status": status,
                        "payment_method": "card", "transaction_id": null,
                        "created_at": "2024-06-10T12:00:00Z"
                    }),
                );
            }
            for (score, title) in [
                (92.0, "Data Engineer"),
                (81.0, "Data Engineer"),
                (64.0, "Designer"),
                (45.0, "Product Manager"),
            ] {
                db.insert(
                    "ats_scores",
                    json!({
                        "resume": 1, "user": 2, "score": score, "job_title": title,
                        "suggestions": ["Quantify impact"], "keyword_matches": 7,
                        "created_at": "2024-06-11T12:00:00Z"
                    }),
                );
            }
            db.insert(
                "activities",
                json!({
                    "user": 2, "activity_type": "resume_created",
                    "description": "Created a resume", "timestamp": "2024-06-11T12:00:00Z"
                }),
            );
            db.insert(
                "synonyms",
                json!({"job_title": "Software Engineer", "synonyms": ["Developer", "Programmer"]}),
            );
        }
        backend
    }

    /// Every response is delayed by `latency`, to make concurrent requests overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.db.lock().requests.clone()
    }

    pub fn hits(&self, method: Method, path: &str) -> usize {
        self.db
            .lock()
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/token/", post(token))
            .route("/token/refresh/", post(token_refresh))
            .route("/users/me/", get(me))
            .route("/users/:id/activities/", get(activities))
            .route("/subscriptions/:id/cancel/", post(cancel))
            .route("/subscriptions/:id/renew/", post(renew))
            .route(
                "/subscriptions/transactions/:id/process_payment/",
                post(process_payment),
            )
            .route("/ats/scores/:id/optimization_suggestions/", get(suggestions))
            .route("/ats/scores/:id/keyword_matches/", get(keyword_matches))
            .merge(collection("/users", "users"))
            .merge(collection("/templates/categories", "categories"))
            .merge(collection("/templates", "templates"))
            .merge(collection("/subscriptions/plans", "plans"))
            .merge(collection("/subscriptions/transactions", "transactions"))
            .merge(collection("/subscriptions", "subscriptions"))
            .merge(collection("/ats/scores", "ats_scores"))
            .merge(collection("/ats/job-title-synonyms", "synonyms"))
            .with_state(self)
    }

    async fn enter(&self, method: &Method, uri: &Uri) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.db.lock().requests.push(RecordedRequest {
            method: method.clone(),
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
        });
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), Response> {
        let token = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        match token {
            Some(t) if self.db.lock().access_tokens.contains(t) => Ok(()),
            _ => Err(error(
                StatusCode::UNAUTHORIZED,
                json!({"detail": "Given token not valid for any token type"}),
            )),
        }
    }
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn_router(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock backend");
    });
    format!("http://{addr}")
}

pub async fn spawn_backend(backend: MockBackend) -> String {
    spawn_router(backend.router()).await
}

struct NoRedirect;

impl LoginRedirect for NoRedirect {
    fn redirect_to_login(&self) {}
}

/// Client already holding a valid admin session.
pub async fn signed_in_client(base: String) -> ApiClient {
    let store = Arc::new(MemoryCredentialStore::new());
    let client = ApiClient::with_base_url(
        base,
        Duration::from_secs(5),
        store.clone(),
        Arc::new(NoRedirect),
    )
    .expect("client");
    let tokens = client
        .obtain_token(ADMIN_USERNAME, ADMIN_PASSWORD)
        .await
        .expect("login");
    store.set(ACCESS_TOKEN_KEY, &tokens.access).expect("store");
    store.set(REFRESH_TOKEN_KEY, &tokens.refresh).expect("store");
    client
}

fn error(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn not_found() -> Response {
    error(StatusCode::NOT_FOUND, json!({"detail": "Not found."}))
}

async fn token(
    State(backend): State<MockBackend>,
    method: Method,
    uri: Uri,
    Json(body): Json<Value>,
) -> Response {
    backend.enter(&method, &uri).await;
    if body["username"] != ADMIN_USERNAME || body["password"] != ADMIN_PASSWORD {
        return error(
            StatusCode::UNAUTHORIZED,
            json!({"detail": "No active account found with the given credentials"}),
        );
    }
    let mut db = backend.db.lock();
    let access = db.issue("access");
    let refresh = db.issue("refresh");
    db.access_tokens.insert(access.clone());
    db.refresh_tokens.insert(refresh.clone());
    Json(json!({"access": access, "refresh": refresh})).into_response()
}

async fn token_refresh(
    State(backend): State<MockBackend>,
    method: Method,
    uri: Uri,
    Json(body): Json<Value>,
) -> Response {
    backend.enter(&method, &uri).await;
    let mut db = backend.db.lock();
    let known = body["refresh"]
        .as_str()
        .is_some_and(|r| db.refresh_tokens.contains(r));
    if !known {
        return error(
            StatusCode::UNAUTHORIZED,
            json!({"detail": "Token is invalid or expired"}),
        );
    }
    let access = db.issue("access");
    db.access_tokens.insert(access.clone());
    Json(json!({"access": access})).into_response()
}

async fn me(
    State(backend): State<MockBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    backend.enter(&method, &uri).await;
    if let Err(resp) = backend.authorize(&headers) {
        return resp;
    }
    let db = backend.db.lock();
    db.collections
        .get("users")
        .and_then(|users| users.values().find(|u| u["username"] == ADMIN_USERNAME))
        .map(|u| Json(u.clone()).into_response())
        .unwrap_or_else(not_found)
}

fn collection(prefix: &str, name: &'static str) -> Router<MockBackend> {
    Router::new()
        .route(
            &format!("{prefix}/"),
            get(
                move |State(b): State<MockBackend>,
                      method: Method,
                      uri: Uri,
                      headers: HeaderMap,
                      Query(pairs): Query<Vec<(String, String)>>| async move {
                    b.enter(&method, &uri).await;
                    if let Err(resp) = b.authorize(&headers) {
                        return resp;
                    }
                    list(&b, name, &pairs)
                },
            )
            .post(
                move |State(b): State<MockBackend>,
                      method: Method,
                      uri: Uri,
                      headers: HeaderMap,
                      Json(body): Json<Value>| async move {
                    b.enter(&method, &uri).await;
                    if let Err(resp) = b.authorize(&headers) {
                        return resp;
                    }
                    create(&b, name, body)
                },
            ),
        )
        .route(
            &format!("{prefix}/:id/"),
            get(
                move |State(b): State<MockBackend>,
                      method: Method,
                      uri: Uri,
                      headers: HeaderMap,
                      Path(id): Path<i64>| async move {
                    b.enter(&method, &uri).await;
                    if let Err(resp) = b.authorize(&headers) {
                        return resp;
                    }
                    let db = b.db.lock();
                    db.collections
                        .get(name)
                        .and_then(|c| c.get(&id))
                        .map(|v| Json(v.clone()).into_response())
                        .unwrap_or_else(not_found)
                },
            )
            .patch(
                move |State(b): State<MockBackend>,
                      method: Method,
                      uri: Uri,
                      headers: HeaderMap,
                      Path(id): Path<i64>,
                      Json(body): Json<Value>| async move {
                    b.enter(&method, &uri).await;
                    if let Err(resp) = b.authorize(&headers) {
                        return resp;
                    }
                    merge(&b, name, id, body)
                },
            )
            .put(
                move |State(b): State<MockBackend>,
                      method: Method,
                      uri: Uri,
                      headers: HeaderMap,
                      Path(id): Path<i64>,
                      Json(body): Json<Value>| async move {
                    b.enter(&method, &uri).await;
                    if let Err(resp) = b.authorize(&headers) {
                        return resp;
                    }
                    merge(&b, name, id, body)
                },
            )
            .delete(
                move |State(b): State<MockBackend>,
                      method: Method,
                      uri: Uri,
                      headers: HeaderMap,
                      Path(id): Path<i64>| async move {
                    b.enter(&method, &uri).await;
                    if let Err(resp) = b.authorize(&headers) {
                        return resp;
                    }
                    let mut db = b.db.lock();
                    match db.collections.get_mut(name).and_then(|c| c.remove(&id)) {
                        Some(_) => StatusCode::NO_CONTENT.into_response(),
                        None => not_found(),
                    }
                },
            ),
        )
}

fn matches_filter(item: &Value, key: &str, value: &str) -> bool {
    let field = match key {
        "subscription_tier" => &item["profile"]["subscription_tier"],
        _ => &item[key],
    };
    match field {
        Value::Null => true,
        Value::String(s) => s.eq_ignore_ascii_case(value),
        Value::Bool(b) => b.to_string() == value,
        Value::Number(n) => match (n.as_f64(), value.parse::<f64>()) {
            (Some(a), Ok(b)) => a == b,
            _ => false,
        },
        _ => true,
    }
}

fn matches_search(item: &Value, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    item.as_object().is_some_and(|fields| {
        fields
            .values()
            .filter_map(Value::as_str)
            .any(|s| s.to_lowercase().contains(&needle))
    })
}

fn list(backend: &MockBackend, name: &str, pairs: &[(String, String)]) -> Response {
    let db = backend.db.lock();
    let mut page = 1usize;
    let items: Vec<Value> = db
        .collections
        .get(name)
        .map(|c| c.values().cloned().collect())
        .unwrap_or_default();
    let mut filtered = Vec::new();
    'items: for item in items {
        for (key, value) in pairs {
            let keep = match key.as_str() {
                "page" => {
                    page = value.parse().unwrap_or(1);
                    true
                }
                "search" => matches_search(&item, value),
                "min_score" => {
                    item["score"].as_f64().unwrap_or(0.0) >= value.parse().unwrap_or(0.0)
                }
                _ => matches_filter(&item, key, value),
            };
            if !keep {
                continue 'items;
            }
        }
        filtered.push(item);
    }
    let count = filtered.len();
    let results: Vec<Value> = filtered
        .into_iter()
        .skip((page.max(1) - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .collect();
    Json(json!({"count": count, "next": null, "previous": null, "results": results}))
        .into_response()
}

fn create(backend: &MockBackend, name: &'static str, body: Value) -> Response {
    let Value::Object(fields) = body else {
        return error(StatusCode::BAD_REQUEST, json!({"message": "Expected an object"}));
    };
    let mut db = backend.db.lock();
    if let Some(new_name) = fields.get("name").and_then(Value::as_str) {
        let taken = db
            .collections
            .get(name)
            .is_some_and(|c| c.values().any(|v| v["name"] == new_name));
        if taken {
            return error(
                StatusCode::BAD_REQUEST,
                json!({"message": format!("'{new_name}' already exists")}),
            );
        }
    }
    let mut item = Value::Object(defaults(name));
    if let Value::Object(target) = &mut item {
        target.extend(fields);
    }
    (StatusCode::CREATED, Json(db.insert(name, item))).into_response()
}

fn defaults(name: &str) -> Map<String, Value> {
    let extra = match name {
        "templates" => json!({
            "usage_count": 0, "avg_ats_score": 0.0, "is_featured": false,
            "created_at": "2024-07-01T00:00:00Z"
        }),
        "plans" => json!({"subscriber_count": 0}),
        "categories" => json!({"template_count": 0}),
        "users" => json!({"date_joined": "2024-07-01T00:00:00Z", "profile": null}),
        _ => json!({}),
    };
    match extra {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn merge(backend: &MockBackend, name: &str, id: i64, body: Value) -> Response {
    let mut db = backend.db.lock();
    let Some(item) = db.collections.get_mut(name).and_then(|c| c.get_mut(&id)) else {
        return not_found();
    };
    if let (Value::Object(target), Value::Object(fields)) = (&mut *item, body) {
        target.extend(fields);
    }
    Json(item.clone()).into_response()
}

fn set_status(backend: &MockBackend, id: i64, status: &str, auto_renew: bool) -> Response {
    let mut db = backend.db.lock();
    let Some(sub) = db
        .collections
        .get_mut("subscriptions")
        .and_then(|c| c.get_mut(&id))
    else {
        return not_found();
    };
    sub["status"] = json!(status);
    sub["auto_renew"] = json!(auto_renew);
    Json(sub.clone()).into_response()
}

async fn cancel(
    State(backend): State<MockBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    backend.enter(&method, &uri).await;
    if let Err(resp) = backend.authorize(&headers) {
        return resp;
    }
    set_status(&backend, id, "cancelled", false)
}

async fn renew(
    State(backend): State<MockBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    backend.enter(&method, &uri).await;
    if let Err(resp) = backend.authorize(&headers) {
        return resp;
    }
    set_status(&backend, id, "active", true)
}

async fn process_payment(
    State(backend): State<MockBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    backend.enter(&method, &uri).await;
    if let Err(resp) = backend.authorize(&headers) {
        return resp;
    }
    let mut db = backend.db.lock();
    let Some(tx) = db
        .collections
        .get_mut("transactions")
        .and_then(|c| c.get_mut(&id))
    else {
        return not_found();
    };
    if tx["status"] != "pending" {
        return error(
            StatusCode::BAD_REQUEST,
            json!({"message": "Only pending transactions can be processed"}),
        );
    }
    tx["status"] = json!("completed");
    Json(json!({"status": "completed", "message": "Payment processed"})).into_response()
}

async fn activities(
    State(backend): State<MockBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    backend.enter(&method, &uri).await;
    if let Err(resp) = backend.authorize(&headers) {
        return resp;
    }
    let db = backend.db.lock();
    let results: Vec<Value> = db
        .collections
        .get("activities")
        .map(|c| c.values().filter(|a| a["user"] == id).cloned().collect())
        .unwrap_or_default();
    Json(json!({"count": results.len(), "results": results})).into_response()
}

async fn suggestions(
    State(backend): State<MockBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    backend.enter(&method, &uri).await;
    if let Err(resp) = backend.authorize(&headers) {
        return resp;
    }
    let db = backend.db.lock();
    db.collections
        .get("ats_scores")
        .and_then(|c| c.get(&id))
        .map(|s| Json(json!({"suggestions": s["suggestions"]})).into_response())
        .unwrap_or_else(not_found)
}

async fn keyword_matches(
    State(backend): State<MockBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    backend.enter(&method, &uri).await;
    if let Err(resp) = backend.authorize(&headers) {
        return resp;
    }
    let db = backend.db.lock();
    match db.collections.get("ats_scores").and_then(|c| c.get(&id)) {
        Some(_) => Json(json!({"matched": ["SQL", "Python"], "missing": ["Airflow"]}))
            .into_response(),
        None => not_found(),
    }
}
