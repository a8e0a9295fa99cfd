// crates/rule-console-client/src/error.rs
// ============================================================================
// Module: API Errors
// Description: Typed failures surfaced by the control-plane HTTP client.
// Purpose: Give callers one error shape for transport, status, and business failures.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every failed request resolves to an [`ApiError`]. Transport failures,
//! non-JSON error statuses, session expiry, and non-zero envelope codes are
//! distinct variants, but each one that carries a numeric code exposes it
//! through [`ApiError::code`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// HTTP status code signalling an expired or missing session.
pub const UNAUTHORIZED_STATUS: u16 = 401;

/// Message used when a failed envelope carries no `msg`.
pub const DEFAULT_FAILURE_MESSAGE: &str = "request failed";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Control-plane client errors.
///
/// # Invariants
/// - A request that did not succeed never resolves to a value; it maps to exactly one variant.
/// - String payloads may include untrusted server text.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Client configuration error (bad base URL, unbuildable request).
    #[error("api client config error: {0}")]
    Config(String),
    /// Network-level failure before a response was received.
    #[error("api transport error: {0}")]
    Transport(String),
    /// Non-JSON response with an error status.
    #[error("http status {status}: {status_text}")]
    Http {
        /// Numeric HTTP status.
        status: u16,
        /// Canonical reason phrase for the status.
        status_text: String,
    },
    /// HTTP 401; the unauthorized handler has already run.
    #[error("unauthorized")]
    Unauthorized,
    /// JSON envelope with a non-zero code.
    #[error("api error {code}: {message}")]
    Business {
        /// Envelope code.
        code: i64,
        /// Envelope message, or the default failure message.
        message: String,
        /// Raw envelope payload.
        data: Option<Value>,
    },
    /// Response body could not be decoded into the expected shape.
    #[error("api decode error: {0}")]
    Decode(String),
    /// Response body exceeded the configured limit.
    #[error("api response exceeds size limit ({actual} > {limit})")]
    ResponseTooLarge {
        /// Actual size in bytes.
        actual: usize,
        /// Maximum size in bytes.
        limit: usize,
    },
    /// Local session state could not be read or written.
    #[error("session store error: {0}")]
    Session(String),
}

impl ApiError {
    /// Returns the numeric code carried by the error, when it has one.
    ///
    /// HTTP-status errors report the status, session expiry reports `401`,
    /// and business errors report the envelope code.
    #[must_use]
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Http {
                status, ..
            } => Some(i64::from(*status)),
            Self::Unauthorized => Some(i64::from(UNAUTHORIZED_STATUS)),
            Self::Business {
                code, ..
            } => Some(*code),
            Self::Config(_)
            | Self::Transport(_)
            | Self::Decode(_)
            | Self::ResponseTooLarge {
                ..
            }
            | Self::Session(_) => None,
        }
    }

    /// Returns the raw payload attached to a business error.
    #[must_use]
    pub const fn data(&self) -> Option<&Value> {
        match self {
            Self::Business {
                data, ..
            } => data.as_ref(),
            _ => None,
        }
    }

    /// Returns true when the error signals session expiry.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Returns a stable label for audit events.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Transport(_) => "transport",
            Self::Http {
                ..
            } => "http_status",
            Self::Unauthorized => "unauthorized",
            Self::Business {
                ..
            } => "business",
            Self::Decode(_) => "decode",
            Self::ResponseTooLarge {
                ..
            } => "response_too_large",
            Self::Session(_) => "session",
        }
    }
}
