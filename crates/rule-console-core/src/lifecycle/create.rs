// crates/rule-console-core/src/lifecycle/create.rs
// ============================================================================
// Module: Create Controller
// Description: Headless "new rule" screen for any rule kind.
// Purpose: Seed a draft, submit it, and leave the screen the way it was opened.
// Dependencies: rule-console-client
// ============================================================================

//! ## Overview
//! The initial draft carries the kind defaults for the route application.
//! Its resource is seeded from new-tab prefill data first, then from the
//! in-memory navigation state, otherwise left empty.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::marker::PhantomData;

use super::FormContext;
use super::LifecycleError;
use super::PendingFlag;
use super::SessionGate;
use super::resolve_gate;
use super::route_param;
use crate::model::Identified;
use crate::model::RuleSpec;
use crate::resource::RuleApi;

// ============================================================================
// SECTION: View State
// ============================================================================

/// Form contents shown by the create screen.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateForm<R> {
    /// Route application.
    pub app: String,
    /// Draft the form starts from.
    pub initial: R,
    /// Screen the cancel link returns to.
    pub back_path: String,
    /// True while a create call is in flight.
    pub submitting: bool,
}

/// Create screen view state.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateView<R> {
    /// Nothing rendered: session pending or redirecting to sign-in.
    Blank,
    /// The route carries no application.
    AppRequired,
    /// Ready for input.
    Form(CreateForm<R>),
}

// ============================================================================
// SECTION: Controller
// ============================================================================

/// Create screen for rule kind `R`.
pub struct CreateController<R, A> {
    /// Rule endpoints.
    api: A,
    /// Collaborators.
    context: FormContext,
    /// Route application.
    app: Option<String>,
    /// Resource carried by in-memory navigation state.
    state_resource: Option<String>,
    /// Signed-in check outcome.
    gate: SessionGate,
    /// Set while a create call is in flight.
    submitting: PendingFlag,
    /// Payload type marker.
    kind: PhantomData<fn() -> R>,
}

impl<R: RuleSpec, A: RuleApi<R>> CreateController<R, A> {
    /// Creates the controller for route application `app`.
    #[must_use]
    pub fn new(api: A, context: FormContext, app: Option<&str>) -> Self {
        Self {
            api,
            context,
            app: route_param(app),
            state_resource: None,
            gate: SessionGate::Pending,
            submitting: PendingFlag::default(),
            kind: PhantomData,
        }
    }

    /// Seeds the resource from in-memory navigation state.
    #[must_use]
    pub fn with_state_resource(mut self, resource: Option<&str>) -> Self {
        self.state_resource = resource.filter(|value| !value.is_empty()).map(str::to_string);
        self
    }

    /// Runs the signed-in check, redirecting to sign-in when nobody is.
    pub async fn resolve_session(&mut self) -> &SessionGate {
        self.gate = resolve_gate(self.context.users.as_ref(), self.context.navigator.as_ref()).await;
        &self.gate
    }

    /// Returns the current view state.
    #[must_use]
    pub fn view(&self) -> CreateView<R> {
        if !self.gate.is_signed_in() {
            return CreateView::Blank;
        }
        let Some(app) = self.app.as_deref() else {
            return CreateView::AppRequired;
        };
        CreateView::Form(CreateForm {
            app: app.to_string(),
            initial: self.initial_draft(app),
            back_path: (self.context.back_path)(app),
            submitting: self.submitting.is_pending(),
        })
    }

    /// Builds the kind-default draft with the seeded resource.
    fn initial_draft(&self, app: &str) -> R {
        let mut draft = R::draft(app);
        if let Some(resource) = self.context.tab.resource().or(self.state_resource.as_deref()) {
            draft.set_resource(resource);
        }
        draft
    }

    /// Validates and creates `draft`, then leaves the screen.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotReady`] before the session resolves,
    /// without an application, or while another create is in flight,
    /// [`LifecycleError::Invalid`] when validation fails, and
    /// [`LifecycleError::Api`] when the create call fails.
    pub async fn submit(&self, draft: R) -> Result<Identified<R>, LifecycleError> {
        self.gate.require()?;
        if self.app.is_none() {
            return Err(LifecycleError::NotReady("application required".to_string()));
        }
        draft.validate().map_err(LifecycleError::Invalid)?;
        let pending = self.submitting.begin()?;
        let result = self.api.create_rule(&draft).await;
        drop(pending);
        let created = result?;
        self.context.finish(self.app.as_deref());
        Ok(created)
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
