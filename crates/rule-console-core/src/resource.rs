// crates/rule-console-core/src/resource.rs
// ============================================================================
// Module: Rule Resource Clients
// Description: Typed CRUD over the `/v2/{kind}` rule endpoints.
// Purpose: Give every rule kind the same four operations through one adapter.
// Dependencies: async-trait, rule-console-client
// ============================================================================

//! ## Overview
//! [`RuleResource<R>`] binds the list/create/update/delete endpoints of one
//! rule kind. Controllers depend on the [`RuleApi`] trait instead, so tests
//! can substitute an in-memory implementation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::marker::PhantomData;

use async_trait::async_trait;
use rule_console_client::ApiClient;
use rule_console_client::ApiError;
use rule_console_client::QueryParams;
use rule_console_client::RequestBody;
use serde_json::Value;

use crate::model::AuthorityRule;
use crate::model::DegradeRule;
use crate::model::FlowRule;
use crate::model::Identified;
use crate::model::ParamFlowRule;
use crate::model::RuleId;
use crate::model::RuleSpec;
use crate::model::SystemRule;

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Rule operations the lifecycle controllers depend on.
#[async_trait]
pub trait RuleApi<R: RuleSpec>: Send + Sync {
    /// Lists the rules of `app`.
    async fn get_rules(&self, app: &str) -> Result<Vec<Identified<R>>, ApiError>;

    /// Creates a rule; the server assigns its id.
    async fn create_rule(&self, rule: &R) -> Result<Identified<R>, ApiError>;

    /// Replaces a persisted rule.
    async fn update_rule(&self, rule: &Identified<R>) -> Result<Identified<R>, ApiError>;

    /// Deletes a persisted rule.
    async fn delete_rule(&self, id: RuleId) -> Result<(), ApiError>;
}

// ============================================================================
// SECTION: HTTP Adapter
// ============================================================================

/// HTTP-backed [`RuleApi`] for rule kind `R`.
pub struct RuleResource<R> {
    /// Shared HTTP client.
    client: ApiClient,
    /// Payload type marker.
    kind: PhantomData<fn() -> R>,
}

impl<R> Clone for RuleResource<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            kind: PhantomData,
        }
    }
}

impl<R: RuleSpec> RuleResource<R> {
    /// Creates the adapter over `client`.
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self {
            client,
            kind: PhantomData,
        }
    }

    /// Returns the list endpoint path.
    #[must_use]
    pub fn list_path() -> String {
        format!("/v2/{}/rules", R::KIND.api_segment())
    }

    /// Returns the create endpoint path.
    #[must_use]
    pub fn create_path() -> String {
        format!("/v2/{}/rule", R::KIND.api_segment())
    }

    /// Returns the update/delete endpoint path for `id`.
    #[must_use]
    pub fn item_path(id: RuleId) -> String {
        format!("/v2/{}/rule/{id}", R::KIND.api_segment())
    }
}

#[async_trait]
impl<R: RuleSpec> RuleApi<R> for RuleResource<R> {
    async fn get_rules(&self, app: &str) -> Result<Vec<Identified<R>>, ApiError> {
        let params = QueryParams::new().with("app", app);
        let rules: Option<Vec<Identified<R>>> =
            self.client.get(&Self::list_path(), Some(&params)).await?;
        Ok(rules.unwrap_or_default())
    }

    async fn create_rule(&self, rule: &R) -> Result<Identified<R>, ApiError> {
        let body = RequestBody::json(rule)?;
        self.client.post(&Self::create_path(), Some(body), None).await
    }

    async fn update_rule(&self, rule: &Identified<R>) -> Result<Identified<R>, ApiError> {
        let body = RequestBody::json(rule)?;
        self.client.put(&Self::item_path(rule.id()), Some(body), None).await
    }

    async fn delete_rule(&self, id: RuleId) -> Result<(), ApiError> {
        let _: Option<Value> = self.client.delete(&Self::item_path(id), None).await?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Kind Aliases
// ============================================================================

/// Flow rule endpoints.
pub type FlowRuleApi = RuleResource<FlowRule>;
/// Degrade rule endpoints.
pub type DegradeRuleApi = RuleResource<DegradeRule>;
/// Hot-parameter rule endpoints.
pub type ParamFlowRuleApi = RuleResource<ParamFlowRule>;
/// System rule endpoints.
pub type SystemRuleApi = RuleResource<SystemRule>;
/// Authority rule endpoints.
pub type AuthorityRuleApi = RuleResource<AuthorityRule>;
