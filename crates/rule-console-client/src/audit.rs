// crates/rule-console-client/src/audit.rs
// ============================================================================
// Module: API Audit Logging
// Description: Structured audit events for control-plane requests.
// Purpose: Emit one JSON line per request without hard logging dependencies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The HTTP client records an [`ApiRequestEvent`] for every request it sends.
//! Events carry the method, path, status, and outcome, never query strings
//! or bodies, since sign-in passes credentials as query parameters.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Request outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    /// Request resolved with a payload.
    Ok,
    /// Request failed.
    Error,
}

/// Control-plane request audit event.
#[derive(Debug, Clone, Serialize)]
pub struct ApiRequestEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// HTTP method.
    pub method: String,
    /// Request path without query string.
    pub path: String,
    /// HTTP status when a response arrived.
    pub status: Option<u16>,
    /// Request outcome.
    pub outcome: RequestOutcome,
    /// Error code when the request failed with one.
    pub error_code: Option<i64>,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Response body size in bytes.
    pub response_bytes: usize,
    /// Wall-clock latency in milliseconds.
    pub latency_ms: u128,
}

/// Inputs required to construct a request audit event.
pub struct ApiRequestEventParams {
    /// HTTP method.
    pub method: String,
    /// Request path without query string.
    pub path: String,
    /// HTTP status when a response arrived.
    pub status: Option<u16>,
    /// Request outcome.
    pub outcome: RequestOutcome,
    /// Error code when the request failed with one.
    pub error_code: Option<i64>,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Response body size in bytes.
    pub response_bytes: usize,
    /// Wall-clock latency in milliseconds.
    pub latency_ms: u128,
}

impl ApiRequestEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: ApiRequestEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "api_request",
            timestamp_ms,
            method: params.method,
            path: params.path,
            status: params.status,
            outcome: params.outcome,
            error_code: params.error_code,
            error_kind: params.error_kind,
            response_bytes: params.response_bytes,
            latency_ms: params.latency_ms,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for control-plane requests.
pub trait ApiAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &ApiRequestEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct ApiStderrAuditSink;

impl ApiAuditSink for ApiStderrAuditSink {
    fn record(&self, event: &ApiRequestEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct ApiFileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl ApiFileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl ApiAuditSink for ApiFileAuditSink {
    fn record(&self, event: &ApiRequestEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct ApiNoopAuditSink;

impl ApiAuditSink for ApiNoopAuditSink {
    fn record(&self, _event: &ApiRequestEvent) {}
}
