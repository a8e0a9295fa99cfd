// crates/rule-console-core/src/lifecycle/edit.rs
// ============================================================================
// Module: Edit Controller
// Description: Headless "edit rule" screen for any rule kind.
// Purpose: Resolve the routed rule from its list and submit changes to it.
// Dependencies: rule-console-client
// ============================================================================

//! ## Overview
//! The control plane has no single-rule read, so the screen fetches the
//! application's rule list and picks the rule whose id renders equal to the
//! route id. An unknown id ends in [`EditView::NotFound`] and no mutation is
//! possible from there.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::marker::PhantomData;

use rule_console_client::ApiError;

use super::FormContext;
use super::LifecycleError;
use super::PendingFlag;
use super::SessionGate;
use super::resolve_gate;
use super::route_param;
use crate::model::Identified;
use crate::model::RuleId;
use crate::model::RuleSpec;
use crate::resource::RuleApi;

// ============================================================================
// SECTION: View State
// ============================================================================

/// Form contents shown by the edit screen.
#[derive(Debug, Clone, PartialEq)]
pub struct EditForm<R> {
    /// Route application.
    pub app: String,
    /// Id of the rule being edited.
    pub id: RuleId,
    /// Persisted payload the form starts from.
    pub initial: R,
    /// Screen the cancel link returns to.
    pub back_path: String,
    /// True while an update call is in flight.
    pub submitting: bool,
}

/// Edit screen view state.
#[derive(Debug, Clone, PartialEq)]
pub enum EditView<R> {
    /// Nothing rendered: session pending or redirecting to sign-in.
    Blank,
    /// The route lacks an application or a rule id.
    ParameterError,
    /// The rule list is being fetched.
    Loading,
    /// The rule list could not be fetched.
    LoadFailed {
        /// Error message.
        message: String,
        /// Error code, when the failure carried one.
        code: Option<i64>,
    },
    /// No rule has the routed id.
    NotFound,
    /// Ready for input.
    Form(EditForm<R>),
}

/// Rule resolution progress.
#[derive(Debug)]
enum LoadState<R> {
    /// Not fetched yet.
    Idle,
    /// Fetch in flight.
    Loading,
    /// Fetch failed.
    Failed(ApiError),
    /// Fetch finished; `None` when no rule matched.
    Loaded(Option<Identified<R>>),
}

// ============================================================================
// SECTION: Controller
// ============================================================================

/// Edit screen for rule kind `R`.
pub struct EditController<R, A> {
    /// Rule endpoints.
    api: A,
    /// Collaborators.
    context: FormContext,
    /// Route application.
    app: Option<String>,
    /// Route rule id, as text.
    id: Option<String>,
    /// Signed-in check outcome.
    gate: SessionGate,
    /// Rule resolution progress.
    load: LoadState<R>,
    /// Set while an update call is in flight.
    submitting: PendingFlag,
    /// Payload type marker.
    kind: PhantomData<fn() -> R>,
}

impl<R: RuleSpec, A: RuleApi<R>> EditController<R, A> {
    /// Creates the controller for route application `app` and rule `id`.
    #[must_use]
    pub fn new(api: A, context: FormContext, app: Option<&str>, id: Option<&str>) -> Self {
        Self {
            api,
            context,
            app: route_param(app),
            id: route_param(id),
            gate: SessionGate::Pending,
            load: LoadState::Idle,
            submitting: PendingFlag::default(),
            kind: PhantomData,
        }
    }

    /// Runs the signed-in check, redirecting to sign-in when nobody is.
    pub async fn resolve_session(&mut self) -> &SessionGate {
        self.gate = resolve_gate(self.context.users.as_ref(), self.context.navigator.as_ref()).await;
        &self.gate
    }

    /// Fetches the rule list and resolves the routed rule.
    ///
    /// Does nothing until the session gate passes and both route
    /// parameters are present.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Api`] when the fetch fails; the view shows
    /// [`EditView::LoadFailed`] as well.
    pub async fn load(&mut self) -> Result<(), LifecycleError> {
        if !self.gate.is_signed_in() {
            return Ok(());
        }
        let (Some(app), Some(id)) = (self.app.clone(), self.id.clone()) else {
            return Ok(());
        };
        self.load = LoadState::Loading;
        match self.api.get_rules(&app).await {
            Ok(rules) => {
                let found = rules.into_iter().find(|rule| rule.id().to_string() == id);
                self.load = LoadState::Loaded(found);
                Ok(())
            }
            Err(err) => {
                let surfaced = LifecycleError::Api(err.clone());
                self.load = LoadState::Failed(err);
                Err(surfaced)
            }
        }
    }

    /// Returns the current view state.
    #[must_use]
    pub fn view(&self) -> EditView<R> {
        if !self.gate.is_signed_in() {
            return EditView::Blank;
        }
        let (Some(app), Some(_)) = (self.app.as_deref(), self.id.as_deref()) else {
            return EditView::ParameterError;
        };
        match &self.load {
            LoadState::Idle | LoadState::Loading => EditView::Loading,
            LoadState::Failed(err) => EditView::LoadFailed {
                message: err.to_string(),
                code: err.code(),
            },
            LoadState::Loaded(None) => EditView::NotFound,
            LoadState::Loaded(Some(rule)) => EditView::Form(EditForm {
                app: app.to_string(),
                id: rule.id(),
                initial: rule.rule().clone(),
                back_path: (self.context.back_path)(app),
                submitting: self.submitting.is_pending(),
            }),
        }
    }

    /// Returns the resolved rule.
    #[must_use]
    pub const fn resolved(&self) -> Option<&Identified<R>> {
        match &self.load {
            LoadState::Loaded(Some(rule)) => Some(rule),
            _ => None,
        }
    }

    /// Merges `draft` with the resolved id, updates it, then leaves the screen.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotReady`] without a resolved rule or while
    /// another update is in flight, [`LifecycleError::Invalid`] when
    /// validation fails, and [`LifecycleError::Api`] when the update call
    /// fails.
    pub async fn submit(&self, draft: R) -> Result<Identified<R>, LifecycleError> {
        self.gate.require()?;
        let Some(resolved) = self.resolved() else {
            return Err(LifecycleError::NotReady("rule not loaded".to_string()));
        };
        draft.validate().map_err(LifecycleError::Invalid)?;
        let merged = resolved.clone().with_rule(draft);
        let pending = self.submitting.begin()?;
        let result = self.api.update_rule(&merged).await;
        drop(pending);
        let updated = result?;
        self.context.finish(self.app.as_deref());
        Ok(updated)
    }

    /// Returns a handle reporting whether a submission is in flight.
    #[must_use]
    pub fn pending(&self) -> PendingFlag {
        self.submitting.clone()
    }

    /// Leaves without saving: closes a new tab, otherwise goes back.
    pub fn cancel(&self) {
        self.context.abandon();
    }
}
