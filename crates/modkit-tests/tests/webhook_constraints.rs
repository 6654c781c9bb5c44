//! Webhook subscription constraints through the loader, plus properties
//! over generated subscription documents.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};

use modkit_spec::constraint::validate_webhook_subscriptions;
use modkit_spec::kinds::default_registry;
use modkit_spec::{
    load_extension, ConstraintErrorKind, ConstraintMode, LoadRequest, ValidationConfig,
};
use modkit_tests::fixtures::{self, webhooks, ENDPOINT};
use modkit_tests::load;

fn constraint_kinds(configuration: Value, config: &ValidationConfig) -> Vec<ConstraintErrorKind> {
    let registry = default_registry().unwrap();
    match load_extension(
        &registry,
        LoadRequest::new("webhooks", configuration, "."),
        config,
    ) {
        Ok(_) => Vec::new(),
        Err(err) => err.constraint_errors().iter().map(|e| e.kind).collect(),
    }
}

// ============================================================================
// Documented examples
// ============================================================================

#[test]
fn test_single_topic_loads() {
    let configuration = webhooks(json!({
        "topics": ["orders/create"],
        "subscription_endpoint_url": "https://a.com"
    }));
    assert!(load("webhooks", configuration).is_ok());
}

#[test]
fn test_second_identical_topic_fails() {
    let configuration = webhooks(json!({
        "topics": ["orders/create", "orders/create"],
        "subscription_endpoint_url": "https://a.com"
    }));
    assert_eq!(
        constraint_kinds(configuration, &ValidationConfig::default()),
        vec![ConstraintErrorKind::DuplicateSubscription]
    );
}

#[test]
fn test_record_with_half_pubsub_pair_fails() {
    let configuration = webhooks(json!({
        "subscriptions": [{"topic": "t", "pubsub_project": "p"}]
    }));
    assert_eq!(
        constraint_kinds(configuration, &ValidationConfig::default()),
        vec![ConstraintErrorKind::IncompletePubSubPair]
    );
}

#[test]
fn test_fixture_is_valid() {
    let instance = load("webhooks", fixtures::webhooks_config()).unwrap();
    assert_eq!(instance.uid(), "webhooks");
}

// ============================================================================
// Reporting modes
// ============================================================================

#[test]
fn test_collect_mode_returns_every_violation() {
    let configuration = webhooks(json!({
        "subscription_endpoint_url": ENDPOINT,
        "topics": ["orders/create", "orders/create"],
        "subscriptions": [
            {"topic": "orders/paid", "arn": "arn:aws:events:us-east-1::event-source/aws.partner/a", "path": "/paid"},
            {"topic": "orders/create"}
        ]
    }));

    assert_eq!(
        constraint_kinds(configuration.clone(), &ValidationConfig::fail_fast()),
        vec![ConstraintErrorKind::DuplicateSubscription]
    );
    assert_eq!(
        constraint_kinds(configuration, &ValidationConfig::collect_all()),
        vec![
            ConstraintErrorKind::DuplicateSubscription,
            ConstraintErrorKind::PathWithIncompatibleDestination,
            ConstraintErrorKind::DuplicateSubscription,
        ]
    );
}

#[test]
fn test_error_display_includes_code_scope_and_path() {
    let registry = default_registry().unwrap();
    let err = load_extension(
        &registry,
        LoadRequest::new(
            "webhooks",
            webhooks(json!({"subscriptions": [{"topic": "t"}]})),
            ".",
        ),
        &ValidationConfig::default(),
    )
    .unwrap_err();
    assert_eq!(
        err.constraint_errors()[0].to_string(),
        "C005: subscription has no destination and no top-level destination is set [record] (at webhooks.subscriptions[0])"
    );
}

// ============================================================================
// Properties
// ============================================================================

fn topic() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "orders/create",
        "orders/paid",
        "products/update",
        "customers/delete",
    ])
    .prop_map(str::to_string)
}

fn destination() -> impl Strategy<Value = Value> {
    prop_oneof![
        prop::sample::select(vec!["https://a.com", "https://b.com"])
            .prop_map(|url| json!({"subscription_endpoint_url": url})),
        Just(json!({"pubsub_project": "p", "pubsub_topic": "t"})),
        Just(json!({"arn": "arn:aws:events:us-east-1::event-source/aws.partner/x"})),
    ]
}

fn record() -> impl Strategy<Value = Value> {
    (topic(), destination()).prop_map(|(topic, destination)| {
        let mut record = destination;
        record["topic"] = json!(topic);
        record
    })
}

proptest! {
    /// Repeating any valid record always yields a duplicate subscription.
    #[test]
    fn repeated_record_is_duplicate(
        records in prop::collection::vec(record(), 1..6),
        pick in any::<prop::sample::Index>(),
    ) {
        let repeated = pick.get(&records).clone();
        let mut all = records.clone();
        all.push(repeated);
        let doc = json!({"subscriptions": all});

        let errors = validate_webhook_subscriptions(&doc, ConstraintMode::Collect).unwrap_err();
        prop_assert!(errors.iter().all(|e| e.kind == ConstraintErrorKind::DuplicateSubscription));
        let last = format!("subscriptions[{}].topic", all.len() - 1);
        prop_assert!(errors.iter().any(|e| e.path.to_string() == last));
    }

    /// Records with pairwise distinct keys never conflict.
    #[test]
    fn distinct_records_validate(records in prop::collection::vec(record(), 0..8)) {
        let mut seen = std::collections::HashSet::new();
        let unique: Vec<Value> = records
            .into_iter()
            .filter(|r| seen.insert(serde_json::to_string(r).unwrap_or_default()))
            .collect();
        let doc = json!({"subscriptions": unique});
        prop_assert!(validate_webhook_subscriptions(&doc, ConstraintMode::FailFast).is_ok());
    }

    /// A record naming both a pubsub project and an ARN fails exclusivity first.
    #[test]
    fn project_and_arn_is_exclusive(
        topic in topic(),
        with_topic in any::<bool>(),
        with_endpoint in any::<bool>(),
        with_path in any::<bool>(),
    ) {
        let mut record = json!({
            "topic": topic,
            "pubsub_project": "p",
            "arn": "arn:aws:events:us-east-1::event-source/aws.partner/x"
        });
        if with_topic {
            record["pubsub_topic"] = json!("t");
        }
        if with_endpoint {
            record["subscription_endpoint_url"] = json!("https://a.com");
        }
        if with_path {
            record["path"] = json!("/hooks");
        }
        let doc = json!({"subscriptions": [record]});
        let errors = validate_webhook_subscriptions(&doc, ConstraintMode::FailFast).unwrap_err();
        prop_assert_eq!(errors[0].kind, ConstraintErrorKind::MultipleDestinations);
    }

    /// A path with no endpoint URL anywhere in scope is always reported.
    #[test]
    fn path_without_endpoint_is_reported(topic in topic(), top_level_arn in any::<bool>()) {
        let mut doc = json!({
            "subscriptions": [{"topic": topic, "pubsub_project": "p", "pubsub_topic": "t", "path": "/x"}]
        });
        if top_level_arn {
            doc["arn"] = json!("arn:aws:events:us-east-1::event-source/aws.partner/x");
        }
        let errors = validate_webhook_subscriptions(&doc, ConstraintMode::Collect).unwrap_err();
        prop_assert!(errors.iter().any(|e| e.kind == ConstraintErrorKind::PathMissingEndpoint));
    }
}
