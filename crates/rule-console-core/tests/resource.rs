// crates/rule-console-core/tests/resource.rs
// ============================================================================
// Module: Rule Resource Tests
// Description: CRUD through the HTTP adapter against a stub control plane.
// Purpose: Verify endpoint paths, wire format, and id round-trips per kind.
// Dependencies: rule-console-core, tokio
// ============================================================================

//! ## Overview
//! Exercises [`RuleResource`] for several kinds over real HTTP.

#![allow(dead_code, reason = "Common module may have unused helpers.")]
#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use rule_console_core::AuthorityRule;
use rule_console_core::FlowRule;
use rule_console_core::FlowRuleApi;
use rule_console_core::ParamFlowItem;
use rule_console_core::ParamFlowRule;
use rule_console_core::ParamFlowRuleApi;
use rule_console_core::RuleApi;
use rule_console_core::RuleId;
use rule_console_core::RuleResource;
use rule_console_core::RuleSpec;
use rule_console_core::SystemRule;
use rule_console_core::SystemRuleApi;
use serde_json::Value;
use serde_json::json;

use crate::common::StubControlPlane;

#[tokio::test]
async fn created_flow_rule_round_trips_with_an_id() {
    let plane = StubControlPlane::start().await;
    let api = FlowRuleApi::new(plane.client());
    let mut draft = FlowRule::draft("demo");
    draft.set_resource("GET:/api/users");
    draft.count = 100.0;

    let created = api.create_rule(&draft).await.expect("create");
    let listed = api.get_rules("demo").await.expect("list");

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id(), created.id());
    assert_eq!(listed[0].rule(), &draft);
    let requests = plane.requests();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/v2/flow/rule");
    assert_eq!(requests[1].path, "/v2/flow/rules");
    assert_eq!(requests[1].query, vec![("app".to_string(), "demo".to_string())]);
    plane.shutdown().await;
}

#[tokio::test]
async fn drafts_are_sent_without_an_id_in_camel_case() {
    let plane = StubControlPlane::start().await;
    let api = FlowRuleApi::new(plane.client());
    let mut draft = FlowRule::draft("demo");
    draft.set_resource("GET:/api/users");

    api.create_rule(&draft).await.expect("create");

    let body: Value = serde_json::from_slice(&plane.requests()[0].body).expect("json");
    assert!(body.get("id").is_none());
    assert_eq!(body["limitApp"], json!("default"));
    assert_eq!(body["controlBehavior"], json!(0));
    assert!(body.get("refResource").is_none());
    plane.shutdown().await;
}

#[tokio::test]
async fn update_and_delete_target_the_assigned_id() {
    let plane = StubControlPlane::start().await;
    let api = SystemRuleApi::new(plane.client());
    let mut draft = SystemRule::draft("demo");
    draft.qps = Some(200.0);
    let created = api.create_rule(&draft).await.expect("create");

    let mut changed = created.rule().clone();
    changed.qps = Some(300.0);
    let updated = api.update_rule(&created.clone().with_rule(changed)).await.expect("update");
    assert_eq!(updated.id(), created.id());
    assert_eq!(updated.rule().qps, Some(300.0));

    api.delete_rule(created.id()).await.expect("delete");
    assert!(api.get_rules("demo").await.expect("list").is_empty());

    let requests = plane.requests();
    let item_path = format!("/v2/system/rule/{}", created.id());
    assert!(requests.iter().any(|r| r.method == "PUT" && r.path == item_path));
    assert!(requests.iter().any(|r| r.method == "DELETE" && r.path == item_path));
    let put_body: Value = serde_json::from_slice(
        &requests.iter().find(|r| r.method == "PUT").expect("put").body,
    )
    .expect("json");
    assert_eq!(put_body["id"], json!(created.id().get()));
    plane.shutdown().await;
}

#[tokio::test]
async fn hot_parameter_rules_use_the_param_flow_segment() {
    let plane = StubControlPlane::start().await;
    let api = ParamFlowRuleApi::new(plane.client());
    let mut draft = ParamFlowRule::draft("demo");
    draft.set_resource("GET:/api/search");
    draft.param_flow_item_list.push(ParamFlowItem {
        class_type: "java.lang.String".to_string(),
        object: "vip".to_string(),
        count: 50.0,
    });

    let created = api.create_rule(&draft).await.expect("create");

    assert_eq!(created.rule().param_flow_item_list.len(), 1);
    assert_eq!(plane.requests()[0].path, "/v2/paramFlow/rule");
    plane.shutdown().await;
}

#[tokio::test]
async fn listing_is_scoped_to_the_application() {
    let plane = StubControlPlane::start().await;
    let api: RuleResource<AuthorityRule> = RuleResource::new(plane.client());
    for app in ["demo", "other", "demo"] {
        let mut draft = AuthorityRule::draft(app);
        draft.set_resource("GET:/api/admin");
        api.create_rule(&draft).await.expect("create");
    }

    let listed = api.get_rules("demo").await.expect("list");

    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|rule| rule.rule().app == "demo"));
    plane.shutdown().await;
}

#[test]
fn endpoint_paths_follow_the_kind() {
    assert_eq!(FlowRuleApi::list_path(), "/v2/flow/rules");
    assert_eq!(ParamFlowRuleApi::create_path(), "/v2/paramFlow/rule");
    assert_eq!(
        SystemRuleApi::item_path(RuleId::new(7)),
        "/v2/system/rule/7"
    );
}

#[test]
fn rule_ids_render_and_parse_as_plain_integers() {
    let id = RuleId::new(-42);

    assert_eq!(id.to_string(), "-42");
    assert_eq!(format!("{:>5}", RuleId::new(7)), "    7");
    assert_eq!(" 42 ".parse::<RuleId>().expect("parse"), RuleId::new(42));
}
