// crates/rule-console-core/src/validation.rs
// ============================================================================
// Module: Field Validation
// Description: Per-kind field checks applied before a rule is submitted.
// Purpose: Reject drafts the control plane would store in a useless state.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`Validate`] collects every failing field into [`FieldErrors`] rather than
//! stopping at the first one, so callers can report all problems at once.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::model::AuthorityRule;
use crate::model::DegradeRule;
use crate::model::FlowRule;
use crate::model::ParamFlowRule;
use crate::model::SystemRule;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Field-level validation failures keyed by wire field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors {
    /// Failures in field-name order.
    errors: BTreeMap<&'static str, String>,
}

impl FieldErrors {
    /// Creates an empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure for `field`; the first message per field wins.
    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    /// Records a failure when `failed` is true.
    pub fn check(&mut self, failed: bool, field: &'static str, message: &str) {
        if failed {
            self.insert(field, message);
        }
    }

    /// Returns the message recorded for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    /// Returns true when no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns the failing field names.
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.errors.keys().copied()
    }

    /// Converts into `Ok(())` when empty.
    ///
    /// # Errors
    ///
    /// Returns `self` when any field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (field, message)) in self.errors.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Field validation for a rule payload.
pub trait Validate {
    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns [`FieldErrors`] naming each failing field.
    fn validate(&self) -> Result<(), FieldErrors>;
}

/// Returns true when the text is empty after trimming.
fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Returns true when an optional duration is missing or not positive.
fn not_positive(value: Option<i64>) -> bool {
    value.is_none_or(|v| v <= 0)
}

// ============================================================================
// SECTION: Kind Rules
// ============================================================================

impl Validate for FlowRule {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(blank(&self.resource), "resource", "resource must not be empty");
        errors.check(self.count < 0.0, "count", "threshold must not be negative");
        errors.check(
            self.strategy == Self::STRATEGY_RELATE
                && self.ref_resource.as_deref().is_none_or(blank),
            "refResource",
            "relate mode requires a related resource",
        );
        errors.check(
            self.control_behavior == Self::BEHAVIOR_WARM_UP && not_positive(self.warm_up_period_sec),
            "warmUpPeriodSec",
            "warm up requires a positive warm-up period",
        );
        errors.check(
            self.control_behavior == Self::BEHAVIOR_QUEUEING
                && not_positive(self.max_queueing_time_ms),
            "maxQueueingTimeMs",
            "queueing requires a positive timeout",
        );
        errors.into_result()
    }
}

impl Validate for DegradeRule {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(blank(&self.resource), "resource", "resource must not be empty");
        errors.check(self.count < 0.0, "count", "threshold must not be negative");
        errors.check(self.time_window <= 0, "timeWindow", "time window must be positive");
        errors.check(
            self.min_request_amount <= 0,
            "minRequestAmount",
            "minimum request amount must be positive",
        );
        if self.grade == Self::GRADE_SLOW_RATIO {
            errors.check(
                self.slow_ratio_threshold.is_none_or(|ratio| ratio <= 0.0 || ratio > 1.0),
                "slowRatioThreshold",
                "slow ratio threshold must be within (0, 1]",
            );
            errors.check(
                not_positive(self.stat_interval_ms),
                "statIntervalMs",
                "statistics interval must be positive",
            );
        }
        errors.check(
            self.grade == Self::GRADE_ERROR_RATIO && self.count > 1.0,
            "count",
            "error ratio must be within [0, 1]",
        );
        errors.into_result()
    }
}

impl Validate for ParamFlowRule {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(blank(&self.resource), "resource", "resource must not be empty");
        errors.check(self.param_idx < 0, "paramIdx", "parameter index must not be negative");
        errors.check(self.count < 0.0, "count", "threshold must not be negative");
        errors.check(self.duration_in_sec <= 0, "durationInSec", "window must be positive");
        errors.check(
            self.param_flow_item_list.iter().any(|item| blank(&item.object) || item.count < 0.0),
            "paramFlowItemList",
            "exception items need a value and a non-negative threshold",
        );
        errors.into_result()
    }
}

impl Validate for SystemRule {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(
            !self.has_enabled_threshold(),
            "threshold",
            "at least one threshold must be set",
        );
        errors.check(
            self.highest_cpu_usage.is_some_and(|usage| usage > 1.0),
            "highestCpuUsage",
            "cpu usage must be within [0, 1]",
        );
        errors.into_result()
    }
}

impl Validate for AuthorityRule {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(blank(&self.resource), "resource", "resource must not be empty");
        errors.check(blank(&self.limit_app), "limitApp", "limit app must not be empty");
        errors.into_result()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
