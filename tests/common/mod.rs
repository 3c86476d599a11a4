#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::extract::{Path, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};

use school_portal::gateway::Gateway;
use school_portal::notify::NotificationSink;
use school_portal::session::{MemorySessionStore, SessionStore};

pub const PASSWORD: &str = "correct-horse";

/// One request as seen by the mock API
#[derive(Debug, Clone)]
pub struct Hit {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

#[derive(Clone, Default)]
struct MockState {
    hits: Arc<Mutex<Vec<Hit>>>,
}

pub struct MockApi {
    pub port: u16,
    pub base_url: String,
    hits: Arc<Mutex<Vec<Hit>>>,
}

impl MockApi {
    pub fn hits(&self) -> Vec<Hit> {
        self.hits.lock().map(|h| h.clone()).unwrap_or_default()
    }

    pub fn hits_to(&self, path: &str) -> usize {
        self.hits().iter().filter(|h| h.path == path).count()
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if tokio::net::TcpStream::connect(("127.0.0.1", self.port)).await.is_ok() {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        anyhow::bail!("mock API did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

/// Mint an HS256 token with the given claims
pub fn mint_token(claims: Value) -> String {
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test-secret"))
        .expect("token encoding")
}

/// Start a fresh mock API on an unused port, bound to the current runtime
pub async fn spawn_mock_api() -> Result<MockApi> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);
    let state = MockState::default();

    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/change-password", post(change_password))
        .route("/api/school/profile", post(submit_profile))
        .route("/api/superadmin/schools", get(list_schools))
        .route("/api/superadmin/schools/:id/:action", patch(school_action))
        .route("/api/echo", get(echo).post(echo))
        .route("/api/forbidden", get(forbidden))
        .route("/api/broken", get(broken))
        .route("/api/not-json", get(not_json))
        .route("/api/slow/:millis", get(slow))
        .route("/api/slow-forbidden/:millis", get(slow_forbidden))
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind mock API")?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let api = MockApi {
        port,
        base_url,
        hits: state.hits,
    };
    api.wait_ready(Duration::from_secs(5)).await?;
    Ok(api)
}

pub fn gateway_for(
    api: &MockApi,
    store: Arc<dyn SessionStore>,
    sink: Option<Arc<dyn NotificationSink>>,
) -> Gateway {
    Gateway::new(&api.base_url, Duration::from_secs(5), store, sink).expect("gateway")
}

pub fn memory_store() -> Arc<MemorySessionStore> {
    Arc::new(MemorySessionStore::new())
}

async fn record(State(state): State<MockState>, request: Request, next: Next) -> Response {
    let hit = Hit {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        authorization: request
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    if let Ok(mut hits) = state.hits.lock() {
        hits.push(hit);
    }
    next.run(request).await
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let email = body["email"].as_str().unwrap_or_default();
    if body["password"] != PASSWORD {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid credentials" })));
    }

    let (id, role, status) = match email.split('@').next().unwrap_or_default() {
        "admin" => (11, "ADMIN", Some("PROFILE_INCOMPLETE")),
        "suspended" => (12, "ADMIN", Some("SUSPENDED")),
        "super" => (1, "SUPER_ADMIN", None),
        "teacher" => (21, "TEACHER", None),
        "student" => (31, "STUDENT", None),
        _ => return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid credentials" }))),
    };

    let token = mint_token(json!({
        "id": id,
        "schoolId": 5,
        "role": role,
        "exp": 4_102_444_800i64,
    }));

    (StatusCode::OK, Json(json!({ "token": token, "role": role, "status": status })))
}

async fn change_password(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if bearer(&headers).is_none() || body["newPassword"].as_str().is_none() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "Missing fields" })));
    }
    (
        StatusCode::OK,
        Json(json!({ "message": "Password updated successfully", "forceLogout": true })),
    )
}

async fn submit_profile(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if bearer(&headers).is_none() {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" })));
    }
    (StatusCode::OK, Json(json!({ "status": "PROFILE_SUBMITTED" })))
}

async fn list_schools(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if bearer(&headers).is_none() {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" })));
    }
    (
        StatusCode::OK,
        Json(json!({
            "count": 3,
            "data": [
                { "id": 1, "name": "Green Valley", "status": "PROFILE_SUBMITTED" },
                { "id": 2, "name": "Hill Top", "status": "ACTIVE" },
                { "id": "3", "name": "River Side", "status": "REJECTED" }
            ]
        })),
    )
}

async fn school_action(
    headers: HeaderMap,
    Path((id, action)): Path<(String, String)>,
    body: Option<Json<Value>>,
) -> (StatusCode, Json<Value>) {
    if bearer(&headers).is_none() {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" })));
    }
    let reason = body.and_then(|Json(b)| b.get("reason").cloned());
    (
        StatusCode::OK,
        Json(json!({ "message": format!("School {} {}", id, action), "reason": reason })),
    )
}

async fn echo(headers: HeaderMap, body: Option<Json<Value>>) -> Json<Value> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    Json(json!({
        "authorization": header("authorization"),
        "authorization_count": headers.get_all("authorization").iter().count(),
        "content_type": header("content-type"),
        "content_type_count": headers.get_all("content-type").iter().count(),
        "x_trace": header("x-trace"),
        "body": body.map(|Json(b)| b),
    }))
}

async fn forbidden() -> (StatusCode, Json<Value>) {
    (StatusCode::FORBIDDEN, Json(json!({ "message": "Forbidden" })))
}

async fn broken() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn not_json() -> &'static str {
    "<html>oops</html>"
}

async fn slow(Path(millis): Path<u64>) -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(millis)).await;
    Json(json!({ "millis": millis }))
}

async fn slow_forbidden(Path(millis): Path<u64>) -> (StatusCode, Json<Value>) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
    (StatusCode::FORBIDDEN, Json(json!({ "message": "Forbidden" })))
}
