// crates/rule-console-client/src/navigation.rs
// ============================================================================
// Module: Navigation
// Description: Location and navigation collaborators for the console surface.
// Purpose: Let the client and controllers redirect without a real browser.
// Dependencies: percent-encoding, url
// ============================================================================

//! ## Overview
//! The console never owns a browser. Anything that needs to know where the
//! operator is, or to send them elsewhere, goes through [`Navigator`]. The
//! in-memory [`MemoryNavigator`] records every move and backs the CLI and
//! the tests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;

use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;
use percent_encoding::utf8_percent_encode;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Path prefix of the authentication surface.
pub const AUTH_PATH_PREFIX: &str = "/auth/";

/// Sign-in page path.
pub const SIGN_IN_PATH: &str = "/auth/sign-in";

/// Query parameter carrying the post-sign-in destination.
pub const RETURN_URL_PARAM: &str = "returnUrl";

/// Bytes escaped in a URI component; the unreserved marks `-_.!~*'()` pass through.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

// ============================================================================
// SECTION: Types
// ============================================================================

/// Current location of the operator.
///
/// # Invariants
/// - `search` is empty or starts with `?`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// Path component, e.g. `/dashboard/apps/demo/flow`.
    pub path: String,
    /// Query component including the leading `?`, or empty.
    pub search: String,
}

impl Location {
    /// Builds a location from a path and a query string (with or without `?`).
    #[must_use]
    pub fn new(path: impl Into<String>, query: &str) -> Self {
        let search = if query.is_empty() || query.starts_with('?') {
            query.to_string()
        } else {
            format!("?{query}")
        };
        Self {
            path: path.into(),
            search,
        }
    }

    /// Splits a `path?query` target into a location.
    #[must_use]
    pub fn parse(target: &str) -> Self {
        match target.split_once('?') {
            Some((path, query)) => Self::new(path, query),
            None => Self::new(target, ""),
        }
    }

    /// Returns the value of a query parameter, decoded.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.search.strip_prefix('?')?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Returns `path + search`, the value encoded into return URLs.
    #[must_use]
    pub fn return_url(&self) -> String {
        format!("{}{}", self.path, self.search)
    }

    /// Returns true when the location is on the authentication surface.
    #[must_use]
    pub fn is_auth_surface(&self) -> bool {
        self.path.starts_with(AUTH_PATH_PREFIX)
    }
}

/// Kind of navigation performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    /// A new history entry.
    Push,
    /// Replacement of the current history entry.
    Replace,
    /// Closing of the current tab.
    CloseTab,
    /// Return to the previous history entry.
    Back,
}

/// Navigation record kept by [`MemoryNavigator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEvent {
    /// How the navigation happened.
    pub kind: NavigationKind,
    /// Target path (empty for tab closing; the resulting location for back).
    pub target: String,
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Navigation collaborator.
pub trait Navigator: Send + Sync {
    /// Returns the current location.
    fn location(&self) -> Location;
    /// Navigates to `target`, adding a history entry.
    fn navigate(&self, target: &str);
    /// Navigates to `target`, replacing the current history entry.
    fn replace(&self, target: &str);
    /// Closes the current tab.
    fn close_tab(&self);
    /// Returns to the previous history entry.
    fn back(&self);
}

/// Builds the sign-in URL carrying `return_url` as an encoded parameter.
#[must_use]
pub fn sign_in_url(return_url: &str) -> String {
    let encoded = utf8_percent_encode(return_url, URI_COMPONENT);
    format!("{SIGN_IN_PATH}?{RETURN_URL_PARAM}={encoded}")
}

// ============================================================================
// SECTION: In-Memory Navigator
// ============================================================================

/// Location, back stack, and recorded events of a [`MemoryNavigator`].
#[derive(Debug, Default)]
struct NavigatorState {
    /// Current location.
    location: Location,
    /// Locations reachable with [`Navigator::back`], oldest first.
    entries: Vec<Location>,
    /// Recorded navigation events.
    events: Vec<NavigationEvent>,
}

/// Navigator that tracks location and history in memory.
#[derive(Debug, Default)]
pub struct MemoryNavigator {
    /// Current location and recorded history.
    state: Mutex<NavigatorState>,
}

impl MemoryNavigator {
    /// Creates a navigator positioned at `target` (`path?query`).
    #[must_use]
    pub fn at(target: &str) -> Self {
        Self {
            state: Mutex::new(NavigatorState {
                location: Location::parse(target),
                ..NavigatorState::default()
            }),
        }
    }

    /// Creates a navigator at `target` whose back stack holds `previous`.
    #[must_use]
    pub fn after(previous: &str, target: &str) -> Self {
        Self {
            state: Mutex::new(NavigatorState {
                location: Location::parse(target),
                entries: vec![Location::parse(previous)],
                events: Vec::new(),
            }),
        }
    }

    /// Returns a snapshot of recorded navigation events.
    #[must_use]
    pub fn history(&self) -> Vec<NavigationEvent> {
        self.state.lock().map(|state| state.events.clone()).unwrap_or_default()
    }

    /// Returns the most recent navigation event.
    #[must_use]
    pub fn last(&self) -> Option<NavigationEvent> {
        self.state.lock().ok().and_then(|state| state.events.last().cloned())
    }

    /// Appends an event and moves the location for path-bearing events.
    fn record(&self, kind: NavigationKind, target: &str) {
        if let Ok(mut state) = self.state.lock() {
            let next = Location::parse(target);
            match kind {
                NavigationKind::Push => {
                    let previous = std::mem::replace(&mut state.location, next);
                    state.entries.push(previous);
                }
                NavigationKind::Replace => state.location = next,
                NavigationKind::CloseTab | NavigationKind::Back => {}
            }
            state.events.push(NavigationEvent {
                kind,
                target: target.to_string(),
            });
        }
    }
}

impl Navigator for MemoryNavigator {
    fn location(&self) -> Location {
        self.state.lock().map(|state| state.location.clone()).unwrap_or_default()
    }

    fn navigate(&self, target: &str) {
        self.record(NavigationKind::Push, target);
    }

    fn replace(&self, target: &str) {
        self.record(NavigationKind::Replace, target);
    }

    fn close_tab(&self) {
        self.record(NavigationKind::CloseTab, "");
    }

    fn back(&self) {
        if let Ok(mut state) = self.state.lock() {
            if let Some(previous) = state.entries.pop() {
                state.location = previous;
            }
            let target = state.location.return_url();
            state.events.push(NavigationEvent {
                kind: NavigationKind::Back,
                target,
            });
        }
    }
}
