// crates/rule-console-core/src/lifecycle/mod.rs
// ============================================================================
// Module: Rule Lifecycle Controllers
// Description: Headless create, edit, and list screens shared by every rule kind.
// Purpose: Drive session gating, loading, submission, and navigation for rules.
// Dependencies: async-trait, rule-console-client, thiserror
// ============================================================================

//! ## Overview
//! Each controller is generic over a rule payload `R` and a [`RuleApi<R>`].
//! Controllers never render; they expose a view-state enum and drive the
//! injected [`Navigator`]. Create and edit screens gate on the signed-in
//! user first: an anonymous operator is sent to sign-in (replacing the
//! current entry) before any rule is fetched or mutated.
//!
//! [`RuleApi<R>`]: crate::resource::RuleApi

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod create;
pub mod edit;
pub mod list;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use rule_console_client::ApiError;
use rule_console_client::AuthApi;
use rule_console_client::Navigator;
use rule_console_client::UserInfo;
use rule_console_client::sign_in_url;
use thiserror::Error;

use crate::model::RuleKind;
use crate::paths;
use crate::prefill::NewTabContext;
use crate::validation::FieldErrors;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Controller failures.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The control plane call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The draft failed field validation; nothing was sent.
    #[error("invalid rule: {0}")]
    Invalid(FieldErrors),
    /// The screen is not in a state that allows the action.
    #[error("not ready: {0}")]
    NotReady(String),
}

// ============================================================================
// SECTION: User Lookup
// ============================================================================

/// Source of the signed-in user.
#[async_trait]
pub trait UserProvider: Send + Sync {
    /// Returns the signed-in user, or `None` when nobody is signed in.
    async fn current_user(&self) -> Option<UserInfo>;
}

/// User lookup through `GET /auth/check`; any failure counts as signed out.
#[derive(Clone)]
pub struct RemoteUserProvider {
    /// Authentication endpoints.
    auth: AuthApi,
}

impl RemoteUserProvider {
    /// Creates the provider.
    #[must_use]
    pub const fn new(auth: AuthApi) -> Self {
        Self {
            auth,
        }
    }
}

#[async_trait]
impl UserProvider for RemoteUserProvider {
    async fn current_user(&self) -> Option<UserInfo> {
        self.auth.current_user().await.ok()
    }
}

/// Provider returning a fixed answer.
#[derive(Debug, Clone, Default)]
pub struct FixedUserProvider {
    /// The answer.
    user: Option<UserInfo>,
}

impl FixedUserProvider {
    /// Provider reporting `username` as signed in.
    #[must_use]
    pub fn signed_in(username: &str) -> Self {
        Self {
            user: Some(UserInfo {
                username: username.to_string(),
                roles: Vec::new(),
            }),
        }
    }

    /// Provider reporting nobody signed in.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserProvider for FixedUserProvider {
    async fn current_user(&self) -> Option<UserInfo> {
        self.user.clone()
    }
}

// ============================================================================
// SECTION: Session Gate
// ============================================================================

/// Outcome of the signed-in check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionGate {
    /// Lookup not finished.
    #[default]
    Pending,
    /// Nobody signed in; a sign-in redirect was issued.
    Anonymous,
    /// Signed in.
    SignedIn(UserInfo),
}

impl SessionGate {
    /// Returns true once a user is known.
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn(_))
    }

    /// Fails unless signed in.
    fn require(&self) -> Result<(), LifecycleError> {
        match self {
            Self::SignedIn(_) => Ok(()),
            Self::Pending => Err(LifecycleError::NotReady("session not resolved".to_string())),
            Self::Anonymous => Err(LifecycleError::NotReady("not signed in".to_string())),
        }
    }
}

/// Looks up the user and redirects anonymous operators to sign-in.
///
/// The return URL is the location seen before the lookup. A lookup that ends
/// on the auth surface (the 401 handler already redirected) is not redirected
/// again.
async fn resolve_gate(users: &dyn UserProvider, navigator: &dyn Navigator) -> SessionGate {
    let location = navigator.location();
    match users.current_user().await {
        Some(user) => SessionGate::SignedIn(user),
        None => {
            if !location.is_auth_surface() && !navigator.location().is_auth_surface() {
                navigator.replace(&sign_in_url(&location.return_url()));
            }
            SessionGate::Anonymous
        }
    }
}

// ============================================================================
// SECTION: Pending Flag
// ============================================================================

/// Shared "mutation in flight" flag, readable while a submission runs.
#[derive(Debug, Clone, Default)]
pub struct PendingFlag(Arc<AtomicBool>);

impl PendingFlag {
    /// Returns true while a submission is in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Marks a submission in flight; fails when one already is.
    fn begin(&self) -> Result<PendingGuard<'_>, LifecycleError> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| LifecycleError::NotReady("submission in flight".to_string()))?;
        Ok(PendingGuard(self))
    }
}

/// Clears the pending flag when the submission ends or is dropped.
struct PendingGuard<'a>(&'a PendingFlag);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.0.store(false, Ordering::Release);
    }
}

// ============================================================================
// SECTION: Shared Screen Wiring
// ============================================================================

/// Maps an application to the screen returned to after a form.
pub type BackPath = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Collaborators shared by the create and edit screens.
#[derive(Clone)]
pub struct FormContext {
    /// Signed-in user lookup.
    pub users: Arc<dyn UserProvider>,
    /// Navigation collaborator.
    pub navigator: Arc<dyn Navigator>,
    /// How the screen was opened.
    pub tab: NewTabContext,
    /// Back-path function.
    pub back_path: BackPath,
}

impl FormContext {
    /// Context returning to the list screen of `kind`.
    #[must_use]
    pub fn new(
        kind: RuleKind,
        users: Arc<dyn UserProvider>,
        navigator: Arc<dyn Navigator>,
        tab: NewTabContext,
    ) -> Self {
        Self {
            users,
            navigator,
            tab,
            back_path: Arc::new(move |app: &str| paths::list_path(kind, app)),
        }
    }

    /// Replaces the back-path function.
    #[must_use]
    pub fn with_back_path(mut self, back_path: BackPath) -> Self {
        self.back_path = back_path;
        self
    }

    /// Leaves after a successful save: closes a new tab, otherwise
    /// navigates to the back path.
    fn finish(&self, app: Option<&str>) {
        if self.tab.is_new_tab() {
            self.navigator.close_tab();
        } else if let Some(app) = app {
            self.navigator.navigate(&(self.back_path)(app));
        }
    }

    /// Leaves without saving: closes a new tab, otherwise goes back.
    fn abandon(&self) {
        if self.tab.is_new_tab() {
            self.navigator.close_tab();
        } else {
            self.navigator.back();
        }
    }
}

/// Returns the non-empty route parameter.
fn route_param(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
}
