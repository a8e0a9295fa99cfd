// crates/rule-console-core/src/filter.rs
// ============================================================================
// Module: List Filter Engine
// Description: Keyword search and client-side pagination over fetched lists.
// Purpose: Derive the visible page of any list without another round trip.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! [`ListFilter`] keeps a shared source list, a keyword, and a 1-based page.
//! Items are matched through their JSON form: string fields by
//! case-insensitive substring, numbers by their decimal rendering. The page
//! resets to 1 whenever the effective keyword or the source identity changes;
//! page and page-size setters never touch the keyword.
//!
//! Invariants:
//! - A blank keyword matches every item.
//! - `page >= 1` and `page_size >= 1` at all times.
//! - An out-of-range page yields an empty slice, never an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde::Serialize;
use serde_json::Number;
use serde_json::Value;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Page size used when the caller does not pick one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

// ============================================================================
// SECTION: Filter
// ============================================================================

/// Search and pagination state over a shared source list.
#[derive(Debug, Clone)]
pub struct ListFilter<T> {
    /// Source list; `None` while loading.
    source: Option<Arc<[T]>>,
    /// Dot-separated field paths searched; empty means all top-level fields.
    search_fields: Vec<String>,
    /// Keyword set through [`ListFilter::set_keyword`].
    keyword: String,
    /// Keyword owned by an outer search box; wins over `keyword` when set.
    external_keyword: Option<String>,
    /// Current page, 1-based.
    page: usize,
    /// Items per page.
    page_size: usize,
    /// Indices into `source` that match the effective keyword.
    matches: Vec<usize>,
}

impl<T: Serialize> ListFilter<T> {
    /// Creates an empty filter searching `search_fields`.
    #[must_use]
    pub fn new(search_fields: &[&str], page_size: usize) -> Self {
        Self {
            source: None,
            search_fields: search_fields.iter().map(|field| (*field).to_string()).collect(),
            keyword: String::new(),
            external_keyword: None,
            page: 1,
            page_size: page_size.max(1),
            matches: Vec::new(),
        }
    }

    /// Replaces the source list; a different list resets the page.
    pub fn set_source(&mut self, source: Option<Arc<[T]>>) {
        let same = match (&self.source, &source) {
            (Some(current), Some(next)) => Arc::ptr_eq(current, next),
            (None, None) => true,
            _ => false,
        };
        self.source = source;
        self.refresh();
        if !same {
            self.page = 1;
        }
    }

    /// Returns the source list.
    #[must_use]
    pub const fn source(&self) -> Option<&Arc<[T]>> {
        self.source.as_ref()
    }

    /// Sets the internal keyword.
    pub fn set_keyword(&mut self, keyword: &str) {
        let before = self.keyword().to_string();
        keyword.clone_into(&mut self.keyword);
        self.keyword_changed(&before);
    }

    /// Sets or clears the external keyword.
    pub fn set_external_keyword(&mut self, keyword: Option<&str>) {
        let before = self.keyword().to_string();
        self.external_keyword = keyword.map(str::to_string);
        self.keyword_changed(&before);
    }

    /// Returns the effective keyword: external when set, else internal.
    #[must_use]
    pub fn keyword(&self) -> &str {
        self.external_keyword.as_deref().unwrap_or(&self.keyword)
    }

    /// Returns the current page (1-based).
    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    /// Moves to `page`; values below 1 clamp to 1.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Returns the page size.
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Changes the page size; values below 1 clamp to 1.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
    }

    /// Returns the number of items matching the effective keyword.
    #[must_use]
    pub fn total(&self) -> usize {
        self.matches.len()
    }

    /// Returns every matching item in source order.
    #[must_use]
    pub fn all_filtered(&self) -> Vec<&T> {
        self.collect(&self.matches)
    }

    /// Returns the matching items on the current page.
    #[must_use]
    pub fn page_items(&self) -> Vec<&T> {
        let start = (self.page - 1).saturating_mul(self.page_size);
        if start >= self.matches.len() {
            return Vec::new();
        }
        let end = start.saturating_add(self.page_size).min(self.matches.len());
        self.collect(&self.matches[start .. end])
    }

    /// Resolves indices into source items.
    fn collect(&self, indices: &[usize]) -> Vec<&T> {
        let Some(source) = self.source.as_deref() else {
            return Vec::new();
        };
        indices.iter().filter_map(|index| source.get(*index)).collect()
    }

    /// Resets the page and recomputes matches when the effective keyword moved.
    fn keyword_changed(&mut self, before: &str) {
        if self.keyword() != before {
            self.page = 1;
            self.refresh();
        }
    }

    /// Recomputes the matching indices.
    fn refresh(&mut self) {
        let needle = self.keyword().trim().to_lowercase();
        self.matches = match self.source.as_deref() {
            None => Vec::new(),
            Some(source) if needle.is_empty() => (0 .. source.len()).collect(),
            Some(source) => source
                .iter()
                .enumerate()
                .filter(|(_, item)| item_matches(*item, &self.search_fields, &needle))
                .map(|(index, _)| index)
                .collect(),
        };
    }
}

// ============================================================================
// SECTION: Matching
// ============================================================================

/// Returns true when any searched field of `item` contains `needle`.
fn item_matches<T: Serialize>(item: &T, fields: &[String], needle: &str) -> bool {
    let Ok(value) = serde_json::to_value(item) else {
        return false;
    };
    if fields.is_empty() {
        return match &value {
            Value::Object(map) => map.values().any(|field| value_matches(field, needle)),
            _ => false,
        };
    }
    fields.iter().any(|path| lookup(&value, path).is_some_and(|field| value_matches(field, needle)))
}

/// Follows a dot-separated path through nested objects.
fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, part| current.as_object()?.get(part))
}

/// Matches strings case-insensitively and numbers by their rendering.
fn value_matches(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(text) => text.to_lowercase().contains(needle),
        Value::Number(number) => render_number(number).contains(needle),
        _ => false,
    }
}

/// Renders a number the way a browser stringifies it: `1.0` becomes `1`,
/// and magnitudes outside `[1e-6, 1e21)` use exponent form such as `1e+21`.
fn render_number(number: &Number) -> String {
    if let Some(value) = number.as_i64() {
        return value.to_string();
    }
    if let Some(value) = number.as_u64() {
        return value.to_string();
    }
    match number.as_f64() {
        Some(value) if value == 0.0 => "0".to_string(),
        Some(value) if (1e-6 .. 1e21).contains(&value.abs()) => value.to_string(),
        Some(value) => {
            let rendered = format!("{value:e}");
            match rendered.split_once('e') {
                Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                    format!("{mantissa}e+{exponent}")
                }
                _ => rendered,
            }
        }
        None => number.to_string(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
