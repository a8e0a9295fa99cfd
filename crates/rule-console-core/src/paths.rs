// crates/rule-console-core/src/paths.rs
// ============================================================================
// Module: Console Paths
// Description: Console route paths for rule list, create, and edit screens.
// Purpose: Keep every navigation target in one place.
// Dependencies: rule-console-client
// ============================================================================

//! ## Overview
//! Rule screens live under `/dashboard/apps/{app}/{segment}` where the
//! segment comes from [`RuleKind::route_segment`].

use crate::model::RuleKind;

pub use rule_console_client::navigation::SIGN_IN_PATH;

/// Root of the per-application dashboard.
pub const APPS_PATH: &str = "/dashboard/apps";

/// Rule list screen for `kind` in `app`.
#[must_use]
pub fn list_path(kind: RuleKind, app: &str) -> String {
    format!("{APPS_PATH}/{app}/{}", kind.route_segment())
}

/// Rule create screen for `kind` in `app`.
#[must_use]
pub fn create_path(kind: RuleKind, app: &str) -> String {
    format!("{}/create", list_path(kind, app))
}

/// Rule edit screen for rule `id` of `kind` in `app`.
#[must_use]
pub fn edit_path(kind: RuleKind, app: &str, id: &str) -> String {
    format!("{}/{id}/edit", list_path(kind, app))
}
