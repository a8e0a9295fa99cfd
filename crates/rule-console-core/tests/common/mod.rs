// crates/rule-console-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Fake rule API and an in-process stub control plane.
// Purpose: Drive controllers and resource clients without a real dashboard.
// Dependencies: bytes, http-body-util, hyper, hyper-util, tokio
// ============================================================================

//! ## Overview
//! [`FakeRuleApi`] is an in-memory [`RuleApi`] that records every call.
//! [`StubControlPlane`] serves the `/v2/{kind}` endpoints over HTTP from
//! in-memory JSON rows so the real [`RuleResource`] can be exercised.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::BodyExt;
use http_body_util::Full;
use hyper::Request;
use hyper::Response;
use hyper::StatusCode;
use hyper::body::Incoming;
use hyper::header::CONTENT_TYPE;
use hyper::header::HeaderValue;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use rule_console_client::ApiClient;
use rule_console_client::ApiClientConfig;
use rule_console_client::ApiError;
use rule_console_client::NoopUnauthorizedHandler;
use rule_console_client::UnauthorizedHandler;
use rule_console_core::Identified;
use rule_console_core::RuleApi;
use rule_console_core::RuleId;
use rule_console_core::RuleSpec;
use serde_json::Value;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

// ============================================================================
// SECTION: Fake Rule API
// ============================================================================

struct FakeState<R> {
    rules: Vec<Identified<R>>,
    next_id: i64,
    calls: Vec<String>,
    fail_next: Option<ApiError>,
}

/// In-memory rule API recording every call.
pub struct FakeRuleApi<R> {
    state: Arc<Mutex<FakeState<R>>>,
}

impl<R> Clone for FakeRuleApi<R> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<R: RuleSpec> FakeRuleApi<R> {
    /// Creates an API holding `rules` with ids 1, 2, 3, ...
    pub fn with_rules(rules: Vec<R>) -> Self {
        let count = i64::try_from(rules.len()).unwrap();
        let rules = rules
            .into_iter()
            .zip(1_i64 ..)
            .map(|(rule, id)| Identified::new(RuleId::new(id), rule))
            .collect();
        Self {
            state: Arc::new(Mutex::new(FakeState {
                rules,
                next_id: count + 1,
                calls: Vec::new(),
                fail_next: None,
            })),
        }
    }

    /// Creates an empty API.
    pub fn empty() -> Self {
        Self::with_rules(Vec::new())
    }

    /// Makes the next call fail with `err`.
    pub fn fail_next(&self, err: ApiError) {
        self.state.lock().unwrap().fail_next = Some(err);
    }

    /// Returns the recorded calls, e.g. `get_rules(demo)`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Returns the stored rules.
    pub fn rules(&self) -> Vec<Identified<R>> {
        self.state.lock().unwrap().rules.clone()
    }

    fn begin(&self, call: String) -> Result<std::sync::MutexGuard<'_, FakeState<R>>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match state.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }
}

#[async_trait]
impl<R: RuleSpec> RuleApi<R> for FakeRuleApi<R> {
    async fn get_rules(&self, app: &str) -> Result<Vec<Identified<R>>, ApiError> {
        let state = self.begin(format!("get_rules({app})"))?;
        Ok(state.rules.iter().filter(|rule| rule.rule().app() == app).cloned().collect())
    }

    async fn create_rule(&self, rule: &R) -> Result<Identified<R>, ApiError> {
        let mut state = self.begin("create_rule".to_string())?;
        let created = Identified::new(RuleId::new(state.next_id), rule.clone());
        state.next_id += 1;
        state.rules.push(created.clone());
        Ok(created)
    }

    async fn update_rule(&self, rule: &Identified<R>) -> Result<Identified<R>, ApiError> {
        let mut state = self.begin(format!("update_rule({})", rule.id()))?;
        let Some(slot) = state.rules.iter_mut().find(|stored| stored.id() == rule.id()) else {
            return Err(ApiError::Business {
                code: -1,
                message: "rule not found".to_string(),
                data: None,
            });
        };
        *slot = rule.clone();
        Ok(rule.clone())
    }

    async fn delete_rule(&self, id: RuleId) -> Result<(), ApiError> {
        let mut state = self.begin(format!("delete_rule({id})"))?;
        state.rules.retain(|stored| stored.id() != id);
        Ok(())
    }
}

// ============================================================================
// SECTION: Held Mutations
// ============================================================================

/// Wraps a rule API so create and update calls wait for [`HeldRuleApi::release`].
pub struct HeldRuleApi<R> {
    inner: FakeRuleApi<R>,
    entered: Arc<Notify>,
    released: Arc<Notify>,
}

impl<R> Clone for HeldRuleApi<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            entered: Arc::clone(&self.entered),
            released: Arc::clone(&self.released),
        }
    }
}

impl<R: RuleSpec> HeldRuleApi<R> {
    /// Wraps `inner`.
    pub fn new(inner: FakeRuleApi<R>) -> Self {
        Self {
            inner,
            entered: Arc::new(Notify::new()),
            released: Arc::new(Notify::new()),
        }
    }

    /// Waits until a mutation is being held.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Lets the held mutation finish.
    pub fn release(&self) {
        self.released.notify_one();
    }

    async fn hold(&self) {
        self.entered.notify_one();
        self.released.notified().await;
    }
}

#[async_trait]
impl<R: RuleSpec> RuleApi<R> for HeldRuleApi<R> {
    async fn get_rules(&self, app: &str) -> Result<Vec<Identified<R>>, ApiError> {
        self.inner.get_rules(app).await
    }

    async fn create_rule(&self, rule: &R) -> Result<Identified<R>, ApiError> {
        self.hold().await;
        self.inner.create_rule(rule).await
    }

    async fn update_rule(&self, rule: &Identified<R>) -> Result<Identified<R>, ApiError> {
        self.hold().await;
        self.inner.update_rule(rule).await
    }

    async fn delete_rule(&self, id: RuleId) -> Result<(), ApiError> {
        self.inner.delete_rule(id).await
    }
}

// ============================================================================
// SECTION: Stub Control Plane
// ============================================================================

/// Captured HTTP request data for assertions.
#[derive(Clone, Debug)]
pub struct CapturedRequest {
    /// Request method.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Decoded query pairs.
    pub query: Vec<(String, String)>,
    /// Raw request body bytes.
    pub body: Bytes,
}

#[derive(Default)]
struct PlaneState {
    rejects_sessions: bool,
    rows: HashMap<String, Vec<Value>>,
    next_id: i64,
    requests: Vec<CapturedRequest>,
}

/// In-process HTTP server implementing the rule endpoints.
pub struct StubControlPlane {
    addr: SocketAddr,
    state: Arc<Mutex<PlaneState>>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl StubControlPlane {
    /// Starts the stub.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let state = Arc::new(Mutex::new(PlaneState::default()));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let state_task = Arc::clone(&state);

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        break;
                    }
                    accept = listener.accept() => {
                        let Ok((stream, _)) = accept else { continue };
                        let state = Arc::clone(&state_task);
                        tokio::spawn(async move {
                            let io = TokioIo::new(stream);
                            let service = service_fn(move |req: Request<Incoming>| {
                                let state = Arc::clone(&state);
                                async move {
                                    let (parts, body) = req.into_parts();
                                    let bytes = body.collect().await?.to_bytes();
                                    let captured = CapturedRequest {
                                        method: parts.method.to_string(),
                                        path: parts.uri.path().to_string(),
                                        query: parts
                                            .uri
                                            .query()
                                            .map(|query| {
                                                url::form_urlencoded::parse(query.as_bytes())
                                                    .into_owned()
                                                    .collect()
                                            })
                                            .unwrap_or_default(),
                                        body: bytes,
                                    };
                                    let response = {
                                        let mut state = state.lock().unwrap();
                                        let response = route(&mut state, &captured);
                                        state.requests.push(captured);
                                        response
                                    };
                                    Ok::<_, hyper::Error>(response)
                                }
                            });
                            let _ = http1::Builder::new().serve_connection(io, service).await;
                        });
                    }
                }
            }
        });

        Self {
            addr,
            state,
            shutdown: Some(shutdown_tx),
            handle,
        }
    }

    /// Returns the base URL for the stub.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Returns a client pointed at the stub.
    pub fn client(&self) -> ApiClient {
        ApiClient::new(ApiClientConfig::new(self.url()), Arc::new(NoopUnauthorizedHandler))
            .expect("client")
    }

    /// Returns a client that runs `handler` on every 401.
    pub fn client_with(&self, handler: Arc<dyn UnauthorizedHandler>) -> ApiClient {
        ApiClient::new(ApiClientConfig::new(self.url()), handler).expect("client")
    }

    /// Answers every later request with 401.
    pub fn reject_sessions(&self) {
        self.state.lock().unwrap().rejects_sessions = true;
    }

    /// Returns the captured requests.
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Shuts down the stub.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = self.handle.await;
    }
}

fn envelope(data: Value) -> Response<Full<Bytes>> {
    let body = serde_json::to_vec(&json!({ "code": 0, "data": data })).expect("serialize");
    let mut response = Response::new(Full::new(Bytes::from(body)));
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn not_found() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(b"not found")));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}

fn unauthorized() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(b"unauthorized")));
    *response.status_mut() = StatusCode::UNAUTHORIZED;
    response
}

fn route(state: &mut PlaneState, request: &CapturedRequest) -> Response<Full<Bytes>> {
    if state.rejects_sessions {
        return unauthorized();
    }
    let segments: Vec<&str> = request.path.trim_start_matches('/').split('/').collect();
    match (request.method.as_str(), segments.as_slice()) {
        ("GET", ["v2", kind, "rules"]) => {
            let app = request
                .query
                .iter()
                .find(|(key, _)| key == "app")
                .map(|(_, value)| value.clone())
                .unwrap_or_default();
            let rows: Vec<Value> = state
                .rows
                .get(*kind)
                .map(|rows| rows.iter().filter(|row| row["app"] == json!(app)).cloned().collect())
                .unwrap_or_default();
            envelope(Value::Array(rows))
        }
        ("POST", ["v2", kind, "rule"]) => {
            let mut row: Value = serde_json::from_slice(&request.body).expect("json body");
            state.next_id += 1;
            row["id"] = json!(state.next_id);
            state.rows.entry((*kind).to_string()).or_default().push(row.clone());
            envelope(row)
        }
        ("PUT", ["v2", kind, "rule", id]) => {
            let row: Value = serde_json::from_slice(&request.body).expect("json body");
            let rows = state.rows.entry((*kind).to_string()).or_default();
            match rows.iter_mut().find(|stored| stored["id"].to_string() == *id) {
                Some(stored) => {
                    *stored = row.clone();
                    envelope(row)
                }
                None => not_found(),
            }
        }
        ("DELETE", ["v2", kind, "rule", id]) => {
            let rows = state.rows.entry((*kind).to_string()).or_default();
            rows.retain(|stored| stored["id"].to_string() != *id);
            envelope(Value::Null)
        }
        _ => not_found(),
    }
}
