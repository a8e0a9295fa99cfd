// crates/rule-console-client/src/client.rs
// ============================================================================
// Module: API Client
// Description: The single request gateway to the control-plane REST API.
// Purpose: Normalize envelopes, map failures to ApiError, intercept session expiry.
// Dependencies: reqwest, serde, serde_json, url
// ============================================================================

//! ## Overview
//! [`ApiClient`] is the only component that talks to the network. Requests
//! always carry the session cookie jar. Responses are interpreted in a fixed
//! order: HTTP 401 first (unauthorized handler, then [`ApiError::Unauthorized`]),
//! then non-JSON responses, then the JSON envelope. Failures are never retried.
//!
//! Security posture: server responses are untrusted; bodies are read with a
//! hard size limit and only paths, never query strings, reach the audit log.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use reqwest::Client;
use reqwest::Method;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderValue;
use reqwest::multipart::Form;
use reqwest::redirect::Policy;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::audit::ApiAuditSink;
use crate::audit::ApiNoopAuditSink;
use crate::audit::ApiRequestEvent;
use crate::audit::ApiRequestEventParams;
use crate::audit::RequestOutcome;
use crate::envelope::decode_envelope;
use crate::error::ApiError;
use crate::session::UnauthorizedHandler;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default maximum response body size accepted by the client.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;

/// Content type used for JSON bodies.
const JSON_CONTENT_TYPE: &str = "application/json";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// HTTP client configuration.
///
/// # Invariants
/// - `base_url` is an absolute URL; request paths are appended verbatim.
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Control-plane base URL, e.g. `http://127.0.0.1:8080`.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum response body size in bytes.
    pub max_response_bytes: usize,
}

impl ApiClientConfig {
    /// Creates a configuration with default limits.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

// ============================================================================
// SECTION: Query Parameters
// ============================================================================

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    /// String value.
    Text(String),
    /// Integer value.
    Integer(i64),
    /// Floating point value.
    Float(f64),
    /// Boolean value.
    Bool(bool),
    /// Absent value; omitted from the query string.
    Absent,
}

impl QueryValue {
    /// Renders the value, or `None` when it must be omitted.
    fn render(&self) -> Option<String> {
        match self {
            Self::Text(value) => Some(value.clone()),
            Self::Integer(value) => Some(value.to_string()),
            Self::Float(value) => Some(value.to_string()),
            Self::Bool(value) => Some(value.to_string()),
            Self::Absent => None,
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

/// Ordered query parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    /// Parameter entries in insertion order.
    entries: Vec<(String, QueryValue)>,
}

impl QueryParams {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter and returns the set.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<QueryValue>) -> Self {
        self.entries.push((key.to_string(), value.into()));
        self
    }

    /// Returns the rendered `(key, value)` pairs, skipping absent values.
    #[must_use]
    pub fn rendered(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .filter_map(|(key, value)| value.render().map(|rendered| (key.clone(), rendered)))
            .collect()
    }
}

// ============================================================================
// SECTION: Request Bodies
// ============================================================================

/// Request body variants.
pub enum RequestBody {
    /// JSON document; sent with `content-type: application/json`.
    Json(Value),
    /// Raw multipart form; its own content type is left untouched.
    Multipart(Form),
}

impl RequestBody {
    /// Serializes `value` into a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] when `value` cannot be serialized.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|err| ApiError::Config(format!("request body serialization failed: {err}")))
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Self::Multipart(_) => f.write_str("Multipart(..)"),
        }
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Control-plane HTTP client.
///
/// # Invariants
/// - Every request sends the shared cookie jar.
/// - HTTP 401 always runs `unauthorized` and fails with [`ApiError::Unauthorized`].
#[derive(Clone)]
pub struct ApiClient {
    /// Reqwest client with cookie store enabled.
    http: Client,
    /// Base URL without trailing slash.
    base_url: String,
    /// Maximum response body size in bytes.
    max_response_bytes: usize,
    /// Session-expiry side effect.
    unauthorized: Arc<dyn UnauthorizedHandler>,
    /// Request audit sink.
    audit: Arc<dyn ApiAuditSink>,
}

/// Response facts gathered while a request runs, for the audit event.
#[derive(Debug, Default)]
struct ExchangeTrace {
    /// HTTP status when a response arrived.
    status: Option<u16>,
    /// Bytes read from the response body.
    response_bytes: usize,
}

impl ApiClient {
    /// Builds a client that reports session expiry to `unauthorized`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] when the base URL is invalid or the HTTP
    /// client cannot be constructed.
    pub fn new(
        config: ApiClientConfig,
        unauthorized: Arc<dyn UnauthorizedHandler>,
    ) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|err| ApiError::Config(format!("invalid base url {base_url}: {err}")))?;
        let http = Client::builder()
            .timeout(config.timeout)
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .map_err(|err| ApiError::Config(err.to_string()))?;
        Ok(Self {
            http,
            base_url,
            max_response_bytes: config.max_response_bytes,
            unauthorized,
            audit: Arc::new(ApiNoopAuditSink),
        })
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn ApiAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Returns the base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a GET request.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails at any layer.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Option<&QueryParams>,
    ) -> Result<T, ApiError> {
        self.request(Method::GET, path, None, params).await
    }

    /// Sends a POST request.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails at any layer.
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<RequestBody>,
        params: Option<&QueryParams>,
    ) -> Result<T, ApiError> {
        self.request(Method::POST, path, body, params).await
    }

    /// Sends a PUT request.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails at any layer.
    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<RequestBody>,
        params: Option<&QueryParams>,
    ) -> Result<T, ApiError> {
        self.request(Method::PUT, path, body, params).await
    }

    /// Sends a DELETE request.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails at any layer.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Option<&QueryParams>,
    ) -> Result<T, ApiError> {
        self.request(Method::DELETE, path, None, params).await
    }

    /// Runs a request and records its audit event.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        params: Option<&QueryParams>,
    ) -> Result<T, ApiError> {
        let started = Instant::now();
        let mut trace = ExchangeTrace::default();
        let result = self.exchange(method.clone(), path, body, params, &mut trace).await;
        let (outcome, error_code, error_kind) = match &result {
            Ok(_) => (RequestOutcome::Ok, None, None),
            Err(err) => (RequestOutcome::Error, err.code(), Some(err.kind())),
        };
        self.audit.record(&ApiRequestEvent::new(ApiRequestEventParams {
            method: method.as_str().to_string(),
            path: path.to_string(),
            status: trace.status,
            outcome,
            error_code,
            error_kind,
            response_bytes: trace.response_bytes,
            latency_ms: started.elapsed().as_millis(),
        }));
        result
    }

    /// Sends the request and interprets the response.
    async fn exchange<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        params: Option<&QueryParams>,
        trace: &mut ExchangeTrace,
    ) -> Result<T, ApiError> {
        let url = self.build_url(path, params)?;
        let mut request = self.http.request(method, url);
        match body {
            Some(RequestBody::Json(value)) => {
                let payload = serde_json::to_vec(&value).map_err(|err| {
                    ApiError::Config(format!("request body serialization failed: {err}"))
                })?;
                request = request
                    .header(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))
                    .body(payload);
            }
            Some(RequestBody::Multipart(form)) => {
                request = request.multipart(form);
            }
            None => {}
        }
        let response =
            request.send().await.map_err(|err| ApiError::Transport(err.to_string()))?;
        let status = response.status();
        trace.status = Some(status.as_u16());
        if status == StatusCode::UNAUTHORIZED {
            self.unauthorized.on_unauthorized();
            return Err(ApiError::Unauthorized);
        }
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains(JSON_CONTENT_TYPE));
        if !is_json {
            if !status.is_success() {
                return Err(ApiError::Http {
                    status: status.as_u16(),
                    status_text: status.canonical_reason().unwrap_or_default().to_string(),
                });
            }
            return serde_json::from_value(Value::Null)
                .map_err(|err| ApiError::Decode(format!("empty response payload: {err}")));
        }
        let body = read_response_body_with_limit(response, self.max_response_bytes).await?;
        trace.response_bytes = body.len();
        decode_envelope(&body)
    }

    /// Joins the base URL, path, and rendered query parameters.
    fn build_url(&self, path: &str, params: Option<&QueryParams>) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}{path}", self.base_url))
            .map_err(|err| ApiError::Config(format!("invalid request path {path}: {err}")))?;
        let pairs = params.map(QueryParams::rendered).unwrap_or_default();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads a response body while enforcing a hard byte limit.
async fn read_response_body_with_limit(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, ApiError> {
    let mut body = Vec::new();
    let mut total: usize = 0;
    while let Some(chunk) =
        response.chunk().await.map_err(|err| ApiError::Transport(err.to_string()))?
    {
        let next_total = total.checked_add(chunk.len()).ok_or(ApiError::ResponseTooLarge {
            actual: usize::MAX,
            limit,
        })?;
        if next_total > limit {
            return Err(ApiError::ResponseTooLarge {
                actual: next_total,
                limit,
            });
        }
        body.extend_from_slice(&chunk);
        total = next_total;
    }
    Ok(body)
}
