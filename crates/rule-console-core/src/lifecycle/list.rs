// crates/rule-console-core/src/lifecycle/list.rs
// ============================================================================
// Module: List Controller
// Description: Headless rule list screen with search, paging, and delete.
// Purpose: Bind the rule list endpoint to the list filter engine.
// Dependencies: rule-console-client
// ============================================================================

//! ## Overview
//! The list is fetched once per [`ListController::refresh`] and handed to a
//! [`ListFilter`]; every mutation refetches. Fetch errors surface as
//! [`ListView::Failed`], never as an empty list.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::marker::PhantomData;
use std::sync::Arc;

use rule_console_client::ApiError;

use super::LifecycleError;
use super::route_param;
use crate::filter::ListFilter;
use crate::model::Identified;
use crate::model::RuleSpec;
use crate::paths;
use crate::resource::RuleApi;

// ============================================================================
// SECTION: View State
// ============================================================================

/// Rows shown on the current page.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRows<R> {
    /// Rules on the current page.
    pub items: Vec<Identified<R>>,
    /// Current page, 1-based.
    pub page: usize,
    /// Items per page.
    pub page_size: usize,
    /// Number of rules matching the keyword.
    pub total: usize,
    /// True when the matches span more than one page.
    pub show_pagination: bool,
}

/// List screen view state.
#[derive(Debug, Clone, PartialEq)]
pub enum ListView<R> {
    /// The route carries no application.
    AppRequired,
    /// The list is being fetched.
    Loading,
    /// The list could not be fetched.
    Failed {
        /// Error message.
        message: String,
        /// Error code, when the failure carried one.
        code: Option<i64>,
    },
    /// The application has no rules of this kind.
    Empty,
    /// Rules exist but none match the keyword.
    NoResults,
    /// Matching rules.
    Rows(ListRows<R>),
}

/// Fetch progress.
#[derive(Debug)]
enum FetchState {
    /// Not fetched yet or fetch in flight.
    Loading,
    /// Last fetch succeeded.
    Loaded,
    /// Last fetch failed.
    Failed(ApiError),
}

// ============================================================================
// SECTION: Controller
// ============================================================================

/// List screen for rule kind `R`.
pub struct ListController<R, A> {
    /// Rule endpoints.
    api: A,
    /// Route application.
    app: Option<String>,
    /// Search and paging over the fetched rules.
    filter: ListFilter<Identified<R>>,
    /// Fetch progress.
    fetch: FetchState,
    /// Payload type marker.
    kind: PhantomData<fn() -> R>,
}

impl<R: RuleSpec, A: RuleApi<R>> ListController<R, A> {
    /// Creates the controller searching `search_fields` with `page_size` rows.
    #[must_use]
    pub fn new(api: A, app: Option<&str>, search_fields: &[&str], page_size: usize) -> Self {
        Self {
            api,
            app: route_param(app),
            filter: ListFilter::new(search_fields, page_size),
            fetch: FetchState::Loading,
            kind: PhantomData,
        }
    }

    /// Fetches the rule list of the route application.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Api`] when the fetch fails; the view shows
    /// [`ListView::Failed`] as well.
    pub async fn refresh(&mut self) -> Result<(), LifecycleError> {
        let Some(app) = self.app.clone() else {
            return Ok(());
        };
        self.fetch = FetchState::Loading;
        match self.api.get_rules(&app).await {
            Ok(rules) => {
                self.filter.set_source(Some(Arc::from(rules)));
                self.fetch = FetchState::Loaded;
                Ok(())
            }
            Err(err) => {
                self.fetch = FetchState::Failed(err.clone());
                Err(LifecycleError::Api(err))
            }
        }
    }

    /// Returns the current view state.
    #[must_use]
    pub fn view(&self) -> ListView<R> {
        if self.app.is_none() {
            return ListView::AppRequired;
        }
        match &self.fetch {
            FetchState::Loading => ListView::Loading,
            FetchState::Failed(err) => ListView::Failed {
                message: err.to_string(),
                code: err.code(),
            },
            FetchState::Loaded => {
                if self.filter.source().is_none_or(|rules| rules.is_empty()) {
                    return ListView::Empty;
                }
                let total = self.filter.total();
                if total == 0 {
                    return ListView::NoResults;
                }
                let page_size = self.filter.page_size();
                ListView::Rows(ListRows {
                    items: self.filter.page_items().into_iter().cloned().collect(),
                    page: self.filter.page(),
                    page_size,
                    total,
                    show_pagination: total > page_size,
                })
            }
        }
    }

    /// Sets the search keyword; the page resets to 1 when it changes.
    pub fn set_keyword(&mut self, keyword: &str) {
        self.filter.set_keyword(keyword);
    }

    /// Sets or clears the keyword owned by an outer search box.
    pub fn set_external_keyword(&mut self, keyword: Option<&str>) {
        self.filter.set_external_keyword(keyword);
    }

    /// Moves to `page`.
    pub fn set_page(&mut self, page: usize) {
        self.filter.set_page(page);
    }

    /// Changes the page size.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.filter.set_page_size(page_size);
    }

    /// Returns the edit screen path for `rule`.
    #[must_use]
    pub fn edit_path(&self, rule: &Identified<R>) -> Option<String> {
        let app = self.app.as_deref()?;
        Some(paths::edit_path(R::KIND, app, &rule.id().to_string()))
    }

    /// Returns the create screen path.
    #[must_use]
    pub fn create_path(&self) -> Option<String> {
        self.app.as_deref().map(|app| paths::create_path(R::KIND, app))
    }

    /// Deletes `rule`, then refetches the list.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Api`] when the delete or the refetch fails.
    pub async fn delete(&mut self, rule: &Identified<R>) -> Result<(), LifecycleError> {
        self.api.delete_rule(rule.id()).await?;
        self.refresh().await
    }
}
