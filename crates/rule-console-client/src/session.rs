// crates/rule-console-client/src/session.rs
// ============================================================================
// Module: Session State
// Description: Persisted authentication flag and session-expiry handling.
// Purpose: Force the console back to sign-in whenever the server rejects the session.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! [`SessionStore`] holds the "is the operator signed in" flag with an
//! external representation (memory or a JSON file). [`UnauthorizedHandler`]
//! is injected into the HTTP client and runs on every 401; the
//! [`SignInRedirect`] implementation clears the flag and redirects to the
//! sign-in page with a return URL, unless already on the auth surface.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::navigation::Navigator;
use crate::navigation::sign_in_url;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Session store errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// I/O failure on the persisted state.
    #[error("session io error: {0}")]
    Io(String),
    /// Persisted state could not be parsed or written.
    #[error("session state invalid: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Session Store
// ============================================================================

/// Persisted session record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Whether the operator is signed in.
    pub authenticated: bool,
    /// Signed-in user name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Storage for the authentication flag.
pub trait SessionStore: Send + Sync {
    /// Returns the persisted record; unreadable state counts as signed out.
    fn load(&self) -> SessionRecord;

    /// Marks `username` as signed in.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the state cannot be persisted.
    fn sign_in(&self, username: &str) -> Result<(), SessionError>;

    /// Clears the signed-in state.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the state cannot be persisted.
    fn clear(&self) -> Result<(), SessionError>;

    /// Returns true when the operator is signed in.
    fn is_authenticated(&self) -> bool {
        self.load().authenticated
    }
}

/// Session store kept in process memory.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    /// Current record.
    record: Mutex<SessionRecord>,
}

impl MemorySessionStore {
    /// Creates a store already signed in as `username`.
    #[must_use]
    pub fn signed_in(username: &str) -> Self {
        Self {
            record: Mutex::new(SessionRecord {
                authenticated: true,
                username: Some(username.to_string()),
            }),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> SessionRecord {
        self.record.lock().map(|record| record.clone()).unwrap_or_default()
    }

    fn sign_in(&self, username: &str) -> Result<(), SessionError> {
        let mut record = self
            .record
            .lock()
            .map_err(|_| SessionError::Invalid("session lock poisoned".to_string()))?;
        *record = SessionRecord {
            authenticated: true,
            username: Some(username.to_string()),
        };
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        let mut record = self
            .record
            .lock()
            .map_err(|_| SessionError::Invalid("session lock poisoned".to_string()))?;
        *record = SessionRecord::default();
        Ok(())
    }
}

/// Session store persisted as a JSON file.
///
/// # Invariants
/// - A missing file means signed out.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    /// Location of the state file.
    path: PathBuf,
}

impl FileSessionStore {
    /// Creates a store backed by `path`.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Writes the record to disk.
    fn write(&self, record: &SessionRecord) -> Result<(), SessionError> {
        let payload = serde_json::to_vec_pretty(record)
            .map_err(|err| SessionError::Invalid(err.to_string()))?;
        fs::write(&self.path, payload).map_err(|err| SessionError::Io(err.to_string()))
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> SessionRecord {
        fs::read(&self.path)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or_default()
    }

    fn sign_in(&self, username: &str) -> Result<(), SessionError> {
        self.write(&SessionRecord {
            authenticated: true,
            username: Some(username.to_string()),
        })
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(SessionError::Io(err.to_string())),
        }
    }
}

// ============================================================================
// SECTION: Unauthorized Handling
// ============================================================================

/// Side effect run by the client on every HTTP 401.
pub trait UnauthorizedHandler: Send + Sync {
    /// Reacts to an expired or missing session.
    fn on_unauthorized(&self);
}

/// Handler that ignores session expiry.
pub struct NoopUnauthorizedHandler;

impl UnauthorizedHandler for NoopUnauthorizedHandler {
    fn on_unauthorized(&self) {}
}

/// Callback receiving session clears that failed during expiry handling.
pub type ClearFailureReporter = Arc<dyn Fn(&SessionError) + Send + Sync>;

/// Writes a failed session clear to stderr.
pub fn report_clear_failure_to_stderr(error: &SessionError) {
    let _ = writeln!(io::stderr(), "failed to clear session after 401: {error}");
}

/// Handler that clears the session and redirects to sign-in.
///
/// # Invariants
/// - Never redirects while the current location is on the auth surface.
/// - A failed clear is reported, and the redirect still happens.
pub struct SignInRedirect {
    /// Navigation collaborator.
    navigator: Arc<dyn Navigator>,
    /// Session flag to clear.
    session: Arc<dyn SessionStore>,
    /// Receives clear failures.
    on_clear_failure: ClearFailureReporter,
}

impl SignInRedirect {
    /// Creates the handler; clear failures go to stderr.
    #[must_use]
    pub fn new(navigator: Arc<dyn Navigator>, session: Arc<dyn SessionStore>) -> Self {
        Self {
            navigator,
            session,
            on_clear_failure: Arc::new(report_clear_failure_to_stderr),
        }
    }

    /// Replaces the clear-failure reporter.
    #[must_use]
    pub fn with_clear_failure_reporter(mut self, reporter: ClearFailureReporter) -> Self {
        self.on_clear_failure = reporter;
        self
    }
}

impl UnauthorizedHandler for SignInRedirect {
    fn on_unauthorized(&self) {
        let location = self.navigator.location();
        if location.is_auth_surface() {
            return;
        }
        if let Err(err) = self.session.clear() {
            (self.on_clear_failure)(&err);
        }
        self.navigator.navigate(&sign_in_url(&location.return_url()));
    }
}
