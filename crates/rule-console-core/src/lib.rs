// crates/rule-console-core/src/lib.rs
// ============================================================================
// Module: Rule Console Core Library
// Description: Rule model, resource clients, list filtering, and screen controllers.
// Purpose: Implement rule management once, generic over every rule kind.
// Dependencies: async-trait, rule-console-client, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Rule Console Core holds the rule-management logic of the console: the
//! five rule payloads behind the [`RuleSpec`] trait, the [`RuleResource`]
//! adapter over the `/v2/{kind}` endpoints, the [`ListFilter`] search and
//! pagination engine, and the headless create/edit/list controllers.
//! Invariants:
//! - Update and delete only accept persisted rules ([`Identified`]).
//! - Create and edit screens gate on the signed-in user before any fetch.
//! - Fetch errors surface as error views, never as empty lists.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod filter;
pub mod lifecycle;
pub mod model;
pub mod paths;
pub mod prefill;
pub mod resource;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use filter::DEFAULT_PAGE_SIZE;
pub use filter::ListFilter;
pub use lifecycle::BackPath;
pub use lifecycle::FixedUserProvider;
pub use lifecycle::FormContext;
pub use lifecycle::LifecycleError;
pub use lifecycle::PendingFlag;
pub use lifecycle::RemoteUserProvider;
pub use lifecycle::SessionGate;
pub use lifecycle::UserProvider;
pub use lifecycle::create::CreateController;
pub use lifecycle::create::CreateForm;
pub use lifecycle::create::CreateView;
pub use lifecycle::edit::EditController;
pub use lifecycle::edit::EditForm;
pub use lifecycle::edit::EditView;
pub use lifecycle::list::ListController;
pub use lifecycle::list::ListRows;
pub use lifecycle::list::ListView;
pub use model::AuthorityRule;
pub use model::ClusterFlowConfig;
pub use model::DEFAULT_LIMIT_APP;
pub use model::DegradeRule;
pub use model::FlowRule;
pub use model::Identified;
pub use model::ParamFlowItem;
pub use model::ParamFlowRule;
pub use model::RuleId;
pub use model::RuleKind;
pub use model::RuleSpec;
pub use model::SystemRule;
pub use prefill::MemoryPrefillStore;
pub use prefill::NewTabContext;
pub use prefill::PrefillData;
pub use prefill::PrefillStore;
pub use prefill::open_in_new_tab;
pub use resource::AuthorityRuleApi;
pub use resource::DegradeRuleApi;
pub use resource::FlowRuleApi;
pub use resource::ParamFlowRuleApi;
pub use resource::RuleApi;
pub use resource::RuleResource;
pub use resource::SystemRuleApi;
pub use validation::FieldErrors;
pub use validation::Validate;
