// crates/rule-console-core/src/prefill.rs
// ============================================================================
// Module: New-Tab Prefill
// Description: One-shot handoff of form data to a create screen opened in a new tab.
// Purpose: Pass a resource name across contexts without putting it in the URL.
// Dependencies: rule-console-client, serde
// ============================================================================

//! ## Overview
//! The opener stores a [`PrefillData`] under a fresh data id and opens the
//! create screen with `opened_in_new_tab=true&data_id=<id>`. The new context
//! builds a [`NewTabContext`] from its location, which takes the data out of
//! the store. A data id can be read exactly once.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use rule_console_client::Location;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Query parameter flagging a screen opened in a new tab.
pub const OPENED_IN_NEW_TAB_PARAM: &str = "opened_in_new_tab";

/// Query parameter carrying the prefill data id.
pub const DATA_ID_PARAM: &str = "data_id";

/// Prefix of generated data ids.
pub const DATA_ID_PREFIX: &str = "rule-create-data-";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Data handed to the create screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefillData {
    /// Resource name to seed the draft with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

/// Cross-context store of prefill data.
pub trait PrefillStore: Send + Sync {
    /// Stores `data` under a new data id and returns the id.
    fn issue(&self, data: PrefillData) -> String;

    /// Removes and returns the data stored under `data_id`.
    fn take(&self, data_id: &str) -> Option<PrefillData>;
}

/// Prefill store kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryPrefillStore {
    /// Stored entries by data id.
    entries: Mutex<HashMap<String, PrefillData>>,
    /// Last issued sequence number.
    sequence: AtomicU64,
}

impl PrefillStore for MemoryPrefillStore {
    fn issue(&self, data: PrefillData) -> String {
        let next = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let data_id = format!("{DATA_ID_PREFIX}{next}");
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(data_id.clone(), data);
        }
        data_id
    }

    fn take(&self, data_id: &str) -> Option<PrefillData> {
        self.entries.lock().ok()?.remove(data_id)
    }
}

// ============================================================================
// SECTION: New-Tab Context
// ============================================================================

/// How the current screen was opened, plus any prefill data it received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTabContext {
    /// True when opened by [`open_in_new_tab`].
    opened_in_new_tab: bool,
    /// Data taken from the prefill store.
    data: Option<PrefillData>,
}

impl NewTabContext {
    /// Context of a screen reached by normal navigation.
    #[must_use]
    pub fn same_tab() -> Self {
        Self::default()
    }

    /// Reads the new-tab flag from `location` and takes its prefill data.
    #[must_use]
    pub fn from_location(location: &Location, store: &dyn PrefillStore) -> Self {
        let opened_in_new_tab =
            location.query_param(OPENED_IN_NEW_TAB_PARAM).is_some_and(|flag| flag == "true");
        let data = if opened_in_new_tab {
            location.query_param(DATA_ID_PARAM).and_then(|data_id| store.take(&data_id))
        } else {
            None
        };
        Self {
            opened_in_new_tab,
            data,
        }
    }

    /// Returns true when the screen was opened in a new tab.
    #[must_use]
    pub const fn is_new_tab(&self) -> bool {
        self.opened_in_new_tab
    }

    /// Returns the prefill data, if any arrived.
    #[must_use]
    pub const fn data(&self) -> Option<&PrefillData> {
        self.data.as_ref()
    }

    /// Returns the non-empty prefilled resource name.
    #[must_use]
    pub fn resource(&self) -> Option<&str> {
        self.data.as_ref()?.resource.as_deref().filter(|resource| !resource.is_empty())
    }
}

/// Stores `resource` and returns the URL that opens `create_path` in a new tab.
#[must_use]
pub fn open_in_new_tab(store: &dyn PrefillStore, create_path: &str, resource: &str) -> String {
    let data_id = store.issue(PrefillData {
        resource: Some(resource.to_string()),
    });
    format!("{create_path}?{OPENED_IN_NEW_TAB_PARAM}=true&{DATA_ID_PARAM}={data_id}")
}
