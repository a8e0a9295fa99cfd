// crates/rule-console-client/src/auth.rs
// ============================================================================
// Module: Authentication API
// Description: Sign-in, sign-out, and current-user calls.
// Purpose: Keep the persisted session flag in step with the server session.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Sign-in sends credentials as query parameters on `POST /auth/login`; the
//! server answers with a session cookie kept by the client's cookie jar.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::client::ApiClient;
use crate::client::QueryParams;
use crate::error::ApiError;
use crate::session::SessionStore;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Sign-in response payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Optional token issued alongside the session cookie.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Signed-in user description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// User name.
    pub username: String,
    /// Assigned roles.
    #[serde(default)]
    pub roles: Vec<String>,
}

// ============================================================================
// SECTION: API
// ============================================================================

/// Authentication endpoints.
#[derive(Clone)]
pub struct AuthApi {
    /// Shared HTTP client.
    client: ApiClient,
    /// Persisted session flag.
    session: Arc<dyn SessionStore>,
}

impl AuthApi {
    /// Creates the API over a client and session store.
    #[must_use]
    pub fn new(client: ApiClient, session: Arc<dyn SessionStore>) -> Self {
        Self {
            client,
            session,
        }
    }

    /// Signs in and marks the session as authenticated.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the server rejects the credentials or the
    /// session flag cannot be persisted.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let params = QueryParams::new().with("username", username).with("password", password);
        let response: Option<LoginResponse> =
            self.client.post("/auth/login", None, Some(&params)).await?;
        self.session.sign_in(username).map_err(|err| ApiError::Session(err.to_string()))?;
        Ok(response.unwrap_or_default())
    }

    /// Signs out; the local flag is cleared even when the server call fails.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the server call fails or the flag cannot be cleared.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result: Result<Value, ApiError> = self.client.post("/auth/logout", None, None).await;
        self.session.clear().map_err(|err| ApiError::Session(err.to_string()))?;
        result.map(|_| ())
    }

    /// Fetches the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when no session exists or the request fails.
    pub async fn current_user(&self) -> Result<UserInfo, ApiError> {
        self.client.get("/auth/check", None).await
    }
}
