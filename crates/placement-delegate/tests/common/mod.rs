//! In-process mock of the placement engine's REST API.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Form, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use serde::Deserialize;
use serde_json::{Value, json};

use placement_delegate::EngineConfig;

pub const TARGET: &str = "10.0.0.10";
pub const USERNAME: &str = "administrator";
pub const PASSWORD: &str = "s3cret";
pub const SESSION_TOKEN: &str = "session-7f3a";

/// What the mock engine answers.
#[derive(Debug, Clone)]
pub struct EngineScript {
    pub login_status: StatusCode,
    pub issue_cookie: bool,
    pub login_delay: Duration,
    pub datacenters: Value,
    pub search_delay: Duration,
    pub templates: Value,
    pub templates_delay: Duration,
    pub reservation_status: StatusCode,
    pub reservation: Value,
    pub reservation_delay: Duration,
}

impl Default for EngineScript {
    fn default() -> Self {
        Self {
            login_status: StatusCode::OK,
            issue_cookie: true,
            login_delay: Duration::ZERO,
            datacenters: json!([
                {"uuid": "OSS:10.0.0.10:RegionOne:DC:other", "displayName": "other"},
                {"uuid": "OSS:10.0.0.10:RegionOne:DC:nova", "displayName": "nova"},
            ]),
            search_delay: Duration::ZERO,
            templates: json!([
                {"displayName": "10.0.0.10:RegionOne::TMP-m1.large", "uuid": "tmpl-large"},
                {"displayName": "10.0.0.10:RegionOne::TMP-m1.small", "uuid": "tmpl-small"},
            ]),
            templates_delay: Duration::ZERO,
            reservation_status: StatusCode::OK,
            reservation: succeeded_with(&["host-a", "host-b"]),
            reservation_delay: Duration::ZERO,
        }
    }
}

/// A successful reservation answer placing one workload per host.
pub fn succeeded_with(hosts: &[&str]) -> Value {
    let resources: Vec<Value> = hosts
        .iter()
        .map(|h| json!({"provider": {"className": "PhysicalMachine", "displayName": h}}))
        .collect();
    json!({
        "status": "PLACEMENT_SUCCEEDED",
        "demandEntities": [{"placements": {"computeResources": resources}}],
    })
}

/// Number of requests each endpoint received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitCounts {
    pub login: usize,
    pub search: usize,
    pub templates: usize,
    pub reservations: usize,
}

#[derive(Default)]
struct Hits {
    login: AtomicUsize,
    search: AtomicUsize,
    templates: AtomicUsize,
    reservations: AtomicUsize,
}

struct EngineState {
    script: EngineScript,
    hits: Hits,
    reservations: Mutex<Vec<Value>>,
}

/// A running mock engine bound to a local port.
pub struct MockEngine {
    pub addr: SocketAddr,
    state: Arc<EngineState>,
}

impl MockEngine {
    pub async fn start(script: EngineScript) -> Self {
        let state = Arc::new(EngineState {
            script,
            hits: Hits::default(),
            reservations: Mutex::new(Vec::new()),
        });

        let api = Router::new()
            .route("/login", post(login))
            .route("/search", get(search))
            .route("/templates", get(templates))
            .route("/reservations", post(reservations))
            .with_state(state.clone());
        let app = Router::new().nest("/vmturbo/rest", api);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    /// Delegate config pointing at this engine.
    pub fn config(&self) -> EngineConfig {
        let mut config = EngineConfig::new(self.addr.to_string(), TARGET, PASSWORD);
        config.protocol = "http".to_string();
        config.username = USERNAME.to_string();
        config.timeout_secs = 5;
        config
    }

    pub fn hits(&self) -> HitCounts {
        let hits = &self.state.hits;
        HitCounts {
            login: hits.login.load(Ordering::SeqCst),
            search: hits.search.load(Ordering::SeqCst),
            templates: hits.templates.load(Ordering::SeqCst),
            reservations: hits.reservations.load(Ordering::SeqCst),
        }
    }

    /// Reservation bodies received so far.
    pub fn reservations(&self) -> Vec<Value> {
        self.state.reservations.lock().unwrap().clone()
    }
}

#[derive(Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

fn authorized(headers: &HeaderMap) -> bool {
    let expected = format!("JSESSIONID={SESSION_TOKEN}");
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|cookie| cookie.contains(&expected))
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"message": "no session"}))).into_response()
}

async fn login(State(state): State<Arc<EngineState>>, Form(creds): Form<Credentials>) -> Response {
    state.hits.login.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(state.script.login_delay).await;

    let script = &state.script;
    if script.login_status != StatusCode::OK {
        return (script.login_status, Json(json!({"message": "login disabled"}))).into_response();
    }
    if creds.username != USERNAME || creds.password != PASSWORD {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "bad credentials"}))).into_response();
    }

    if script.issue_cookie {
        let cookie = format!("JSESSIONID={SESSION_TOKEN}; Path=/; HttpOnly");
        ([(header::SET_COOKIE, cookie)], "logged in").into_response()
    } else {
        "logged in".into_response()
    }
}

async fn search(
    State(state): State<Arc<EngineState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.hits.search.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return unauthorized();
    }
    if params.get("types").map(String::as_str) != Some("DataCenter") {
        return StatusCode::BAD_REQUEST.into_response();
    }
    tokio::time::sleep(state.script.search_delay).await;
    Json(state.script.datacenters.clone()).into_response()
}

async fn templates(State(state): State<Arc<EngineState>>, headers: HeaderMap) -> Response {
    state.hits.templates.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return unauthorized();
    }
    tokio::time::sleep(state.script.templates_delay).await;
    Json(state.script.templates.clone()).into_response()
}

async fn reservations(
    State(state): State<Arc<EngineState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.hits.reservations.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return unauthorized();
    }
    state.reservations.lock().unwrap().push(body);
    tokio::time::sleep(state.script.reservation_delay).await;

    (state.script.reservation_status, Json(state.script.reservation.clone())).into_response()
}
