// crates/rule-console-client/src/lib.rs
// ============================================================================
// Module: Rule Console Client Library
// Description: HTTP gateway to the flow-control dashboard REST API.
// Purpose: Send requests, normalize envelopes, and handle session expiry.
// Dependencies: reqwest, serde, serde_json, thiserror, url
// ============================================================================

//! ## Overview
//! Rule Console Client is the single network gateway of the console. It
//! decodes the `{ code, msg, data }` envelope, maps every failure to a typed
//! [`ApiError`], and runs an injected [`UnauthorizedHandler`] on HTTP 401.
//! Invariants:
//! - Requests always carry the session cookie jar.
//! - A 401 never resolves to a value, whatever its body says.
//! - Response bodies are capped at the configured byte limit.
//!
//! Security posture: server responses are untrusted input; credentials
//! never reach the audit log.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod auth;
pub mod client;
pub mod envelope;
pub mod error;
pub mod navigation;
pub mod session;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::ApiAuditSink;
pub use audit::ApiFileAuditSink;
pub use audit::ApiNoopAuditSink;
pub use audit::ApiRequestEvent;
pub use audit::ApiStderrAuditSink;
pub use audit::RequestOutcome;
pub use auth::AuthApi;
pub use auth::LoginResponse;
pub use auth::UserInfo;
pub use client::ApiClient;
pub use client::ApiClientConfig;
pub use client::DEFAULT_MAX_RESPONSE_BYTES;
pub use client::DEFAULT_TIMEOUT;
pub use client::QueryParams;
pub use client::QueryValue;
pub use client::RequestBody;
pub use envelope::ApiEnvelope;
pub use envelope::decode_envelope;
pub use error::ApiError;
pub use error::DEFAULT_FAILURE_MESSAGE;
pub use navigation::Location;
pub use navigation::MemoryNavigator;
pub use navigation::NavigationEvent;
pub use navigation::NavigationKind;
pub use navigation::Navigator;
pub use navigation::sign_in_url;
pub use session::ClearFailureReporter;
pub use session::FileSessionStore;
pub use session::MemorySessionStore;
pub use session::NoopUnauthorizedHandler;
pub use session::SessionError;
pub use session::SessionRecord;
pub use session::SessionStore;
pub use session::SignInRedirect;
pub use session::UnauthorizedHandler;
pub use session::report_clear_failure_to_stderr;
