// crates/rule-console-core/src/model.rs
// ============================================================================
// Module: Rule Model
// Description: Payloads for the five rule kinds and the persisted-rule wrapper.
// Purpose: Give every kind one shape the generic clients and controllers share.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A rule payload without an id is a draft. Once the control plane assigns
//! an id the rule travels as [`Identified<R>`], whose id cannot be changed,
//! so update and delete can only ever target a persisted rule.
//!
//! Wire format is camelCase JSON with integer strategy codes; optional
//! fields are omitted when absent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::validation::Validate;

// ============================================================================
// SECTION: Rule Kind
// ============================================================================

/// The five rule kinds managed by the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// Rate limiting.
    Flow,
    /// Circuit breaking.
    Degrade,
    /// Hot-parameter rate limiting.
    ParamFlow,
    /// System-wide adaptive protection.
    System,
    /// Caller allow/deny lists.
    Authority,
}

impl RuleKind {
    /// All kinds, in console menu order.
    pub const ALL: [Self; 5] =
        [Self::Flow, Self::Degrade, Self::ParamFlow, Self::System, Self::Authority];

    /// Returns the REST path segment (`/v2/{segment}/rules`).
    #[must_use]
    pub const fn api_segment(self) -> &'static str {
        match self {
            Self::Flow => "flow",
            Self::Degrade => "degrade",
            Self::ParamFlow => "paramFlow",
            Self::System => "system",
            Self::Authority => "authority",
        }
    }

    /// Returns the console route segment (`/dashboard/apps/{app}/{segment}`).
    #[must_use]
    pub const fn route_segment(self) -> &'static str {
        match self {
            Self::Flow => "flow",
            Self::Degrade => "degrade",
            Self::ParamFlow => "param-flow",
            Self::System => "system",
            Self::Authority => "authority",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_segment())
    }
}

impl FromStr for RuleKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.api_segment() == value || kind.route_segment() == value)
            .ok_or_else(|| format!("unknown rule kind: {value}"))
    }
}

// ============================================================================
// SECTION: Identity
// ============================================================================

/// Server-assigned rule identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(i64);

impl RuleId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for RuleId {
    type Err = std::num::ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value.trim().parse().map(Self)
    }
}

/// A persisted rule: payload plus its server-assigned id.
///
/// # Invariants
/// - The id is set once at construction and never changes.
/// - Serializes as the payload's fields with `id` alongside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "R: Serialize", deserialize = "R: DeserializeOwned"))]
pub struct Identified<R> {
    /// Server-assigned identifier.
    id: RuleId,
    /// Rule payload.
    #[serde(flatten)]
    rule: R,
}

impl<R> Identified<R> {
    /// Pairs a payload with its id.
    #[must_use]
    pub const fn new(id: RuleId, rule: R) -> Self {
        Self {
            id,
            rule,
        }
    }

    /// Returns the rule id.
    #[must_use]
    pub const fn id(&self) -> RuleId {
        self.id
    }

    /// Returns the payload.
    #[must_use]
    pub const fn rule(&self) -> &R {
        &self.rule
    }

    /// Replaces the payload, keeping the id.
    #[must_use]
    pub fn with_rule(self, rule: R) -> Self {
        Self {
            id: self.id,
            rule,
        }
    }

    /// Returns the payload, dropping the id.
    #[must_use]
    pub fn into_rule(self) -> R {
        self.rule
    }
}

// ============================================================================
// SECTION: Rule Spec
// ============================================================================

/// Behavior shared by every rule payload.
pub trait RuleSpec:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Validate + Send + Sync + 'static
{
    /// Kind this payload belongs to.
    const KIND: RuleKind;

    /// Returns a draft with the kind defaults for `app`.
    fn draft(app: &str) -> Self;

    /// Returns the owning application.
    fn app(&self) -> &str;

    /// Returns the protected resource, for kinds that have one.
    fn resource(&self) -> Option<&str>;

    /// Sets the protected resource; ignored by kinds without one.
    fn set_resource(&mut self, resource: &str);
}

// ============================================================================
// SECTION: Shared Payload Parts
// ============================================================================

/// Cluster-mode configuration for flow and hot-parameter rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterFlowConfig {
    /// Cluster-wide flow id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<i64>,
    /// 0 = per-node average, 1 = global threshold.
    pub threshold_type: i32,
    /// Falls back to local limiting when the token server is unreachable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_to_local_when_fail: Option<bool>,
    /// Sliding window sample count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_count: Option<i64>,
    /// Sliding window length in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_interval_ms: Option<i64>,
}

// ============================================================================
// SECTION: Flow Rules
// ============================================================================

/// Rate limiting rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRule {
    /// Owning application.
    pub app: String,
    /// Protected resource.
    pub resource: String,
    /// Threshold type: 0 = threads, 1 = QPS.
    pub grade: i32,
    /// Threshold.
    pub count: f64,
    /// Mode: 0 = direct, 1 = relate, 2 = chain.
    pub strategy: i32,
    /// Related resource for relate mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_resource: Option<String>,
    /// Effect: 0 = fail fast, 1 = warm up, 2 = queueing.
    pub control_behavior: i32,
    /// Warm-up period in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warm_up_period_sec: Option<i64>,
    /// Queueing timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_queueing_time_ms: Option<i64>,
    /// Origin the rule applies to.
    pub limit_app: String,
    /// Cluster mode switch.
    #[serde(default)]
    pub cluster_mode: bool,
    /// Cluster configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_config: Option<ClusterFlowConfig>,
}

impl FlowRule {
    /// Thread-count threshold.
    pub const GRADE_THREAD: i32 = 0;
    /// QPS threshold.
    pub const GRADE_QPS: i32 = 1;
    /// Limit on the resource itself.
    pub const STRATEGY_DIRECT: i32 = 0;
    /// Limit triggered by a related resource.
    pub const STRATEGY_RELATE: i32 = 1;
    /// Limit on one call chain entry.
    pub const STRATEGY_CHAIN: i32 = 2;
    /// Reject immediately.
    pub const BEHAVIOR_FAIL_FAST: i32 = 0;
    /// Ramp up to the threshold.
    pub const BEHAVIOR_WARM_UP: i32 = 1;
    /// Queue requests at a uniform rate.
    pub const BEHAVIOR_QUEUEING: i32 = 2;
}

impl RuleSpec for FlowRule {
    const KIND: RuleKind = RuleKind::Flow;

    fn draft(app: &str) -> Self {
        Self {
            app: app.to_string(),
            resource: String::new(),
            grade: Self::GRADE_QPS,
            count: 0.0,
            strategy: Self::STRATEGY_DIRECT,
            ref_resource: None,
            control_behavior: Self::BEHAVIOR_FAIL_FAST,
            warm_up_period_sec: None,
            max_queueing_time_ms: None,
            limit_app: DEFAULT_LIMIT_APP.to_string(),
            cluster_mode: false,
            cluster_config: None,
        }
    }

    fn app(&self) -> &str {
        &self.app
    }

    fn resource(&self) -> Option<&str> {
        Some(&self.resource)
    }

    fn set_resource(&mut self, resource: &str) {
        resource.clone_into(&mut self.resource);
    }
}

/// Origin value matching every caller.
pub const DEFAULT_LIMIT_APP: &str = "default";

// ============================================================================
// SECTION: Degrade Rules
// ============================================================================

/// Circuit breaking rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DegradeRule {
    /// Owning application.
    pub app: String,
    /// Protected resource.
    pub resource: String,
    /// Strategy: 0 = slow-call ratio, 1 = error ratio, 2 = error count.
    pub grade: i32,
    /// Threshold (max RT, ratio, or count depending on grade).
    pub count: f64,
    /// Open-circuit duration in seconds.
    pub time_window: i64,
    /// Minimum requests before the breaker may trip.
    pub min_request_amount: i64,
    /// Slow-call ratio threshold for grade 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slow_ratio_threshold: Option<f64>,
    /// Statistics interval in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat_interval_ms: Option<i64>,
}

impl DegradeRule {
    /// Trip on slow-call ratio.
    pub const GRADE_SLOW_RATIO: i32 = 0;
    /// Trip on error ratio.
    pub const GRADE_ERROR_RATIO: i32 = 1;
    /// Trip on error count.
    pub const GRADE_ERROR_COUNT: i32 = 2;
}

impl RuleSpec for DegradeRule {
    const KIND: RuleKind = RuleKind::Degrade;

    fn draft(app: &str) -> Self {
        Self {
            app: app.to_string(),
            resource: String::new(),
            grade: Self::GRADE_SLOW_RATIO,
            count: 0.0,
            time_window: 5,
            min_request_amount: 5,
            slow_ratio_threshold: Some(1.0),
            stat_interval_ms: Some(1000),
        }
    }

    fn app(&self) -> &str {
        &self.app
    }

    fn resource(&self) -> Option<&str> {
        Some(&self.resource)
    }

    fn set_resource(&mut self, resource: &str) {
        resource.clone_into(&mut self.resource);
    }
}

// ============================================================================
// SECTION: Hot-Parameter Rules
// ============================================================================

/// Per-value exception inside a hot-parameter rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamFlowItem {
    /// Parameter type, e.g. `java.lang.String`.
    pub class_type: String,
    /// Parameter value.
    pub object: String,
    /// Threshold for this value.
    pub count: f64,
}

/// Hot-parameter rate limiting rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamFlowRule {
    /// Owning application.
    pub app: String,
    /// Protected resource.
    pub resource: String,
    /// Index of the limited argument.
    pub param_idx: i32,
    /// Threshold type: 0 = threads, 1 = QPS.
    pub grade: i32,
    /// Per-value threshold.
    pub count: f64,
    /// Statistics window in seconds.
    pub duration_in_sec: i64,
    /// Effect: 0 = fail fast, 1 = warm up, 2 = queueing.
    pub control_behavior: i32,
    /// Per-value exceptions.
    #[serde(default)]
    pub param_flow_item_list: Vec<ParamFlowItem>,
    /// Cluster mode switch.
    #[serde(default)]
    pub cluster_mode: bool,
    /// Cluster configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_config: Option<ClusterFlowConfig>,
}

impl RuleSpec for ParamFlowRule {
    const KIND: RuleKind = RuleKind::ParamFlow;

    fn draft(app: &str) -> Self {
        Self {
            app: app.to_string(),
            resource: String::new(),
            param_idx: 0,
            grade: FlowRule::GRADE_QPS,
            count: 0.0,
            duration_in_sec: 1,
            control_behavior: FlowRule::BEHAVIOR_FAIL_FAST,
            param_flow_item_list: Vec::new(),
            cluster_mode: false,
            cluster_config: None,
        }
    }

    fn app(&self) -> &str {
        &self.app
    }

    fn resource(&self) -> Option<&str> {
        Some(&self.resource)
    }

    fn set_resource(&mut self, resource: &str) {
        resource.clone_into(&mut self.resource);
    }
}

// ============================================================================
// SECTION: System Rules
// ============================================================================

/// System-wide protection rule; a negative threshold is disabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemRule {
    /// Owning application.
    pub app: String,
    /// Highest one-minute load average.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highest_system_load: Option<f64>,
    /// Highest CPU usage ratio (0 to 1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highest_cpu_usage: Option<f64>,
    /// Entry QPS threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qps: Option<f64>,
    /// Average RT threshold in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_rt: Option<i64>,
    /// Concurrent thread threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_thread: Option<i64>,
}

impl SystemRule {
    /// Integer threshold meaning "disabled".
    pub const DISABLED: i64 = -1;
    /// Floating-point threshold meaning "disabled".
    pub const DISABLED_VALUE: f64 = -1.0;

    /// Returns true when at least one threshold is enabled.
    #[must_use]
    pub fn has_enabled_threshold(&self) -> bool {
        let float_enabled = |value: Option<f64>| value.is_some_and(|v| v >= 0.0);
        let int_enabled = |value: Option<i64>| value.is_some_and(|v| v >= 0);
        float_enabled(self.highest_system_load)
            || float_enabled(self.highest_cpu_usage)
            || float_enabled(self.qps)
            || int_enabled(self.avg_rt)
            || int_enabled(self.max_thread)
    }
}

impl RuleSpec for SystemRule {
    const KIND: RuleKind = RuleKind::System;

    fn draft(app: &str) -> Self {
        Self {
            app: app.to_string(),
            highest_system_load: Some(Self::DISABLED_VALUE),
            highest_cpu_usage: Some(Self::DISABLED_VALUE),
            qps: Some(Self::DISABLED_VALUE),
            avg_rt: Some(Self::DISABLED),
            max_thread: Some(Self::DISABLED),
        }
    }

    fn app(&self) -> &str {
        &self.app
    }

    fn resource(&self) -> Option<&str> {
        None
    }

    fn set_resource(&mut self, _resource: &str) {}
}

// ============================================================================
// SECTION: Authority Rules
// ============================================================================

/// Caller allow/deny list rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorityRule {
    /// Owning application.
    pub app: String,
    /// Protected resource.
    pub resource: String,
    /// Comma-separated caller list.
    pub limit_app: String,
    /// 0 = whitelist, 1 = blacklist.
    pub strategy: i32,
}

impl AuthorityRule {
    /// Only listed callers pass.
    pub const STRATEGY_WHITELIST: i32 = 0;
    /// Listed callers are rejected.
    pub const STRATEGY_BLACKLIST: i32 = 1;
}

impl RuleSpec for AuthorityRule {
    const KIND: RuleKind = RuleKind::Authority;

    fn draft(app: &str) -> Self {
        Self {
            app: app.to_string(),
            resource: String::new(),
            limit_app: DEFAULT_LIMIT_APP.to_string(),
            strategy: Self::STRATEGY_WHITELIST,
        }
    }

    fn app(&self) -> &str {
        &self.app
    }

    fn resource(&self) -> Option<&str> {
        Some(&self.resource)
    }

    fn set_resource(&mut self, resource: &str) {
        resource.clone_into(&mut self.resource);
    }
}
