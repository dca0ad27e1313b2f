//! In-process mock of the CRM REST API for integration tests.
//!
//! The server runs on its own actix system thread and binds an ephemeral
//! port. Handlers count hits per route so tests can assert how many requests
//! the client actually sent.

#![allow(dead_code)]

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crmdesk_client::helpers::session::{LoginRedirect, MemorySessionStore, SessionKey, SessionStore};
use crmdesk_client::hooks::CrmHooks;
use crmdesk_client::query::{QueryClient, QueryOptions, RetryPolicy};
use crmdesk_client::ApiClient;

pub const EXPIRED_TOKEN: &str = "expired";
pub const SUSPENDED_TENANT: &str = "suspended";
pub const SLOW_RESPONSE: Duration = Duration::from_millis(400);

#[derive(Default)]
pub struct MockState {
    hits: Mutex<HashMap<&'static str, usize>>,
    last_headers: Mutex<HashMap<String, String>>,
    /// Number of upcoming summary requests that answer 503
    pub summary_failures: AtomicUsize,
    /// Log stats answer only after `SLOW_RESPONSE`
    pub slow_log_stats: AtomicBool,
}

impl MockState {
    pub fn hits(&self, route: &str) -> usize {
        self.hits
            .lock()
            .unwrap()
            .get(route)
            .copied()
            .unwrap_or(0)
    }

    pub fn last_header(&self, name: &str) -> Option<String> {
        self.last_headers.lock().unwrap().get(name).cloned()
    }

    fn record(&self, route: &'static str, req: &HttpRequest) {
        *self.hits.lock().unwrap().entry(route).or_insert(0) += 1;

        let mut headers = self.last_headers.lock().unwrap();
        headers.clear();
        for (name, value) in req.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_string(), value.to_string());
            }
        }
    }
}

type State = web::Data<Arc<MockState>>;

fn ok(data: Value) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true, "data": data }))
}

/// Rejects expired tokens and suspended tenants the way the real API does
fn guard(req: &HttpRequest) -> Option<HttpResponse> {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let expired = format!("Bearer {}", EXPIRED_TOKEN);
    if header("authorization").as_deref() == Some(expired.as_str()) {
        return Some(HttpResponse::Unauthorized().json(json!({ "detail": "Token expired" })));
    }
    if header("x-tenant-id").as_deref() == Some(SUSPENDED_TENANT) {
        return Some(HttpResponse::Ok().json(json!({ "success": false, "error": "Tenant suspended" })));
    }
    None
}

pub fn contact_json(id: i64, name: &str, active: bool, customer: bool, email: &str) -> Value {
    json!({
        "id": id,
        "prefix": if customer { Value::from("Mr") } else { Value::Null },
        "name": name,
        "is_active": active,
        "is_customer": customer,
        "channels": [
            { "id": id * 10 + 1, "channel_type": "email", "value": email, "is_primary": true },
            { "id": id * 10 + 2, "channel_type": "mobile", "value": format!("98765{:05}", id), "is_primary": true }
        ],
        "created_at": "2024-01-10T09:00:00Z",
        "updated_at": "2024-06-01T09:00:00Z"
    })
}

fn contacts() -> Vec<Value> {
    vec![
        contact_json(1, "Rajesh Kumar", true, true, "rajesh@example.com"),
        contact_json(2, "Priya Sharma", true, false, "priya@example.com"),
        contact_json(3, "Anil Mehta", false, true, "anil@example.com"),
    ]
}

fn transaction_json(id: i64, is_duplicate: bool) -> Value {
    json!({
        "id": id,
        "customer_id": 1,
        "customer_name": "Rajesh Kumar",
        "scheme_name": "Axis Bluechip Fund",
        "folio_number": "91011",
        "transaction_type": "purchase",
        "transaction_date": "2024-05-02",
        "amount": 10000.0,
        "units": 212.5,
        "nav": 47.06,
        "is_duplicate": is_duplicate,
        "include_in_portfolio": !is_duplicate,
        "created_at": "2024-05-02T10:00:00Z",
        "updated_at": "2024-05-02T10:00:00Z"
    })
}

async fn list_contacts(state: State, req: HttpRequest) -> HttpResponse {
    state.record("contacts.list", &req);
    if let Some(rejection) = guard(&req) {
        return rejection;
    }
    // slow enough for concurrent callers to overlap
    tokio::time::sleep(Duration::from_millis(50)).await;
    ok(json!({ "contacts": contacts(), "total": 3, "has_more": false }))
}

async fn contact_stats(state: State, req: HttpRequest) -> HttpResponse {
    state.record("contacts.stats", &req);
    if let Some(rejection) = guard(&req) {
        return rejection;
    }
    ok(json!({
        "total_contacts": 3,
        "active_contacts": 2,
        "customers": 2,
        "prospects": 1,
        "contacts_with_email": 3,
        "contacts_with_mobile": 3
    }))
}

async fn search_contacts(state: State, req: HttpRequest, query: web::Path<String>) -> HttpResponse {
    state.record("contacts.search", &req);
    let query = query.into_inner().to_lowercase();
    if query == "boom" {
        return HttpResponse::InternalServerError().json(json!({ "detail": "Search index offline" }));
    }

    let matches: Vec<Value> = contacts()
        .into_iter()
        .filter(|c| {
            c["name"]
                .as_str()
                .is_some_and(|name| name.to_lowercase().contains(&query))
        })
        .collect();
    ok(json!(matches))
}

async fn get_contact(state: State, req: HttpRequest, id: web::Path<i64>) -> HttpResponse {
    state.record("contacts.detail", &req);
    let id = id.into_inner();
    contacts()
        .into_iter()
        .find(|c| c["id"] == id)
        .map(ok)
        .unwrap_or_else(|| HttpResponse::NotFound().json(json!({ "detail": "Contact not found" })))
}

async fn create_contact(state: State, req: HttpRequest, body: web::Json<Value>) -> HttpResponse {
    state.record("contacts.create", &req);
    let name = body["name"].as_str().unwrap_or("New Contact").to_string();
    HttpResponse::Created().json(json!({
        "success": true,
        "data": contact_json(4, &name, true, false, "new@example.com")
    }))
}

async fn list_logs(state: State, req: HttpRequest) -> HttpResponse {
    state.record("logs.list", &req);
    ok(json!({
        "logs": [{
            "id": 1,
            "level": "error",
            "source": "import",
            "message": "Row 12: invalid PAN",
            "metadata": { "row": 12 },
            "timestamp": "2024-06-01T09:00:00Z"
        }],
        "total": 1,
        "page": 1,
        "page_size": 50,
        "total_pages": 1
    }))
}

async fn log_stats(state: State, req: HttpRequest) -> HttpResponse {
    state.record("logs.stats", &req);
    if let Some(rejection) = guard(&req) {
        return rejection;
    }
    if state.slow_log_stats.load(Ordering::SeqCst) {
        tokio::time::sleep(SLOW_RESPONSE).await;
    }
    ok(json!({
        "last_hour": { "errors": 1, "warnings": 0 },
        "last_24_hours": { "errors": 4, "warnings": 7 },
        "last_7_days": { "errors": 20, "warnings": 31 },
        "top_sources": [{ "source": "import", "count": 12 }]
    }))
}

async fn cleanup_logs(state: State, req: HttpRequest, query: web::Query<HashMap<String, String>>) -> HttpResponse {
    state.record("logs.cleanup", &req);
    let days: u64 = query.get("days").and_then(|d| d.parse().ok()).unwrap_or(0);
    ok(json!({ "deleted_count": days * 2 }))
}

async fn import_sessions(state: State, req: HttpRequest) -> HttpResponse {
    state.record("import.sessions", &req);
    if let Some(rejection) = guard(&req) {
        return rejection;
    }
    ok(json!({
        "sessions": [
            {
                "id": "imp-1",
                "import_type": "transactions",
                "status": "completed_with_errors",
                "file_name": "cams.xlsx",
                "total_records": 200,
                "successful_records": 150,
                "failed_records": 40,
                "duplicate_records": 10,
                "error_message": null,
                "created_at": "2024-06-01T09:00:00Z",
                "completed_at": "2024-06-01T09:05:00Z"
            },
            {
                "id": "imp-2",
                "import_type": "contacts",
                "status": "processing",
                "file_name": null,
                "total_records": 0,
                "successful_records": 0,
                "failed_records": 0,
                "duplicate_records": 0,
                "error_message": null,
                "created_at": "2024-06-02T09:00:00Z",
                "completed_at": null
            }
        ],
        "total": 2
    }))
}

async fn staging_records(
    state: State,
    req: HttpRequest,
    session_id: web::Path<String>,
    query: web::Query<HashMap<String, String>>,
) -> HttpResponse {
    state.record("import.staging", &req);
    let status = query.get("status").cloned().unwrap_or_else(|| "invalid".to_string());
    ok(json!({
        "records": [{
            "id": 1,
            "session_id": session_id.into_inner(),
            "row_number": 12,
            "raw_data": { "PAN": "ABCDE" },
            "mapped_data": null,
            "status": status,
            "errors": ["invalid PAN"],
            "warnings": null
        }],
        "total": 1
    }))
}

async fn transaction_summary(state: State, req: HttpRequest) -> HttpResponse {
    state.record("transactions.summary", &req);
    let remaining = state.summary_failures.load(Ordering::SeqCst);
    if remaining > 0 {
        state.summary_failures.store(remaining - 1, Ordering::SeqCst);
        return HttpResponse::ServiceUnavailable().body("upstream unavailable");
    }
    ok(json!({
        "total_transactions": 2,
        "total_amount": 20000.0,
        "purchase_amount": 20000.0,
        "redemption_amount": 0.0,
        "duplicate_count": 1,
        "customer_count": 1
    }))
}

async fn list_transactions(state: State, req: HttpRequest) -> HttpResponse {
    state.record("transactions.list", &req);
    ok(json!({
        "transactions": [transaction_json(1, false), transaction_json(2, true)],
        "total": 2,
        "page": 1,
        "page_size": 50
    }))
}

async fn get_transaction(state: State, req: HttpRequest, id: web::Path<i64>) -> HttpResponse {
    state.record("transactions.detail", &req);
    ok(transaction_json(id.into_inner(), false))
}

async fn patch_transaction(
    state: State,
    req: HttpRequest,
    id: web::Path<i64>,
    body: web::Json<Value>,
) -> HttpResponse {
    state.record("transactions.patch", &req);
    let is_duplicate = body["is_duplicate"].as_bool().unwrap_or(false);
    ok(transaction_json(id.into_inner(), is_duplicate))
}

async fn delete_transaction(state: State, req: HttpRequest) -> HttpResponse {
    state.record("transactions.delete", &req);
    HttpResponse::Ok().json(json!({ "success": true }))
}

/// Starts the mock API and returns its state and base URL (ending in `/api`)
pub fn spawn_backend() -> (Arc<MockState>, String) {
    let state = Arc::new(MockState::default());
    let server_state = Arc::clone(&state);
    let (tx, rx) = std::sync::mpsc::channel();

    std::thread::spawn(move || {
        actix_web::rt::System::new().block_on(async move {
            let server = HttpServer::new(move || {
                App::new()
                    .app_data(web::Data::new(Arc::clone(&server_state)))
                    .route("/api/contacts", web::get().to(list_contacts))
                    .route("/api/contacts", web::post().to(create_contact))
                    .route("/api/contacts/stats", web::get().to(contact_stats))
                    .route("/api/contacts/search/{query}", web::get().to(search_contacts))
                    .route("/api/contacts/{id}", web::get().to(get_contact))
                    .route("/api/logs", web::get().to(list_logs))
                    .route("/api/logs/stats", web::get().to(log_stats))
                    .route("/api/logs/cleanup", web::delete().to(cleanup_logs))
                    .route("/api/import/sessions", web::get().to(import_sessions))
                    .route(
                        "/api/import/staging/{session_id}/records",
                        web::get().to(staging_records),
                    )
                    .route("/api/transactions", web::get().to(list_transactions))
                    .route("/api/transactions/summary", web::get().to(transaction_summary))
                    .route("/api/transactions/{id}", web::get().to(get_transaction))
                    .route("/api/transactions/{id}", web::patch().to(patch_transaction))
                    .route("/api/transactions/{id}", web::delete().to(delete_transaction))
            })
            .workers(1)
            .disable_signals()
            .bind(("127.0.0.1", 0))
            .expect("bind mock backend");

            tx.send(server.addrs()[0]).expect("report mock address");
            server.run().await
        })
    });

    let addr = rx.recv().expect("mock backend started");
    (state, format!("http://{}/api", addr))
}

/// Counts redirects instead of navigating
#[derive(Default)]
pub struct RecordingRedirect {
    pub count: AtomicUsize,
    pub last_path: Mutex<Option<String>>,
}

impl LoginRedirect for RecordingRedirect {
    fn redirect_to_login(&self, login_path: &str) {
        self.count.fetch_add(1, Ordering::SeqCst);
        *self.last_path.lock().unwrap() = Some(login_path.to_string());
    }
}

/// Retry quickly so transient-failure tests stay fast
pub fn fast_options() -> QueryOptions {
    QueryOptions::default().with_retry(RetryPolicy::new(
        2,
        Duration::from_millis(10),
        Duration::from_millis(50),
    ))
}

pub struct TestClient {
    pub api: ApiClient,
    pub hooks: CrmHooks,
    pub session: Arc<MemorySessionStore>,
    pub redirect: Arc<RecordingRedirect>,
}

pub fn test_client(base_url: &str, token: &str) -> TestClient {
    test_client_with_timeout(base_url, token, Duration::from_secs(5))
}

pub fn test_client_with_timeout(base_url: &str, token: &str, timeout: Duration) -> TestClient {
    let session = Arc::new(MemorySessionStore::with_token(token));
    session.set(SessionKey::TenantId, "tenant-1".to_string());
    session.set(SessionKey::Environment, "staging".to_string());
    session.set(SessionKey::User, r#"{"id":7,"name":"Asha"}"#.to_string());

    let redirect = Arc::new(RecordingRedirect::default());
    let api = ApiClient::builder(base_url, session.clone())
        .redirect(redirect.clone())
        .timeout(timeout)
        .build()
        .expect("build api client");
    let hooks = CrmHooks::new(api.clone(), QueryClient::new(fast_options()));

    TestClient {
        api,
        hooks,
        session,
        redirect,
    }
}
