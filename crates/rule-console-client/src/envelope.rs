// crates/rule-console-client/src/envelope.rs
// ============================================================================
// Module: Response Envelope
// Description: The `{ code, msg, data }` wrapper carried by every API response.
// Purpose: Turn envelopes into payloads or typed business errors.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A zero `code` means success and yields `data`; any other code becomes
//! [`ApiError::Business`] carrying the code, message, and raw payload.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;
use crate::error::DEFAULT_FAILURE_MESSAGE;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Control-plane response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope {
    /// Discriminator; zero is success.
    pub code: i64,
    /// Optional human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    /// Optional payload.
    #[serde(default)]
    pub data: Option<Value>,
}

impl ApiEnvelope {
    /// Envelope code signalling success.
    pub const SUCCESS_CODE: i64 = 0;

    /// Builds a success envelope around `data`.
    #[must_use]
    pub const fn success(data: Value) -> Self {
        Self {
            code: Self::SUCCESS_CODE,
            msg: None,
            data: Some(data),
        }
    }

    /// Builds a failure envelope.
    #[must_use]
    pub fn failure(code: i64, msg: &str) -> Self {
        Self {
            code,
            msg: Some(msg.to_string()),
            data: None,
        }
    }

    /// Returns true when the envelope signals success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code == Self::SUCCESS_CODE
    }

    /// Converts the envelope into its payload.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Business`] for non-zero codes and
    /// [`ApiError::Decode`] when `data` does not match `T`.
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        if !self.is_success() {
            return Err(ApiError::Business {
                code: self.code,
                message: self.msg.unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
                data: self.data,
            });
        }
        serde_json::from_value(self.data.unwrap_or(Value::Null))
            .map_err(|err| ApiError::Decode(format!("invalid response payload: {err}")))
    }
}

/// Decodes a raw JSON response body into its payload.
///
/// # Errors
///
/// Returns [`ApiError::Decode`] for malformed envelopes and
/// [`ApiError::Business`] for non-zero codes.
pub fn decode_envelope<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let envelope: ApiEnvelope = serde_json::from_slice(body)
        .map_err(|err| ApiError::Decode(format!("invalid response envelope: {err}")))?;
    envelope.into_result()
}
