//! End-to-end loading tests: raw configuration -> extension instance.

use pretty_assertions::assert_eq;
use serde_json::json;

use modkit_spec::kinds::default_registry;
use modkit_spec::{
    load_all, load_extension, Capability, ConfigurationError, LoadRequest, LookupError,
    StructuralErrorKind, ValidationConfig,
};
use modkit_tests::fixtures;
use modkit_tests::load;

// ============================================================================
// Successful loads
// ============================================================================

#[test]
fn test_load_every_builtin_kind() {
    let cases = [
        ("webhooks", fixtures::webhooks_config()),
        ("app_home", fixtures::app_home_config()),
        ("function", fixtures::function_config()),
        ("ui_extension", fixtures::ui_extension_config()),
        ("theme", fixtures::theme_config()),
    ];
    for (kind, configuration) in cases {
        let instance = load(kind, configuration).unwrap_or_else(|e| panic!("{}: {}", kind, e));
        assert_eq!(instance.identifier(), kind);
    }
}

#[test]
fn test_load_by_alias() {
    let instance = load("product_discounts", fixtures::function_config()).unwrap();
    assert_eq!(instance.identifier(), "function");
    assert!(instance.has_capability(Capability::Function));

    let instance = load("theme_app_extension", fixtures::theme_config()).unwrap();
    assert_eq!(instance.identifier(), "theme");
}

#[test]
fn test_loaded_value_follows_schema_order() {
    let instance = load(
        "app_home",
        json!({
            "app_preferences": {"url": "https://a.com/p"},
            "embedded": false,
            "application_url": "https://a.com"
        }),
    )
    .unwrap();
    assert_eq!(
        serde_json::to_string(instance.configuration()).unwrap(),
        r#"{"application_url":"https://a.com","embedded":false,"app_preferences":{"url":"https://a.com/p"}}"#
    );
}

#[test]
fn test_ui_extension_capabilities() {
    let instance = load("ui_extension", fixtures::ui_extension_config()).unwrap();
    let capabilities: Vec<Capability> = instance.capabilities().into_iter().collect();
    assert_eq!(
        capabilities,
        vec![
            Capability::UiPreview,
            Capability::Bundling,
            Capability::Esbuild,
            Capability::CartUrl,
        ]
    );
}

#[test]
fn test_configuration_hash_ignores_key_order() {
    let a = load("theme", json!({"name": "Reviews", "handle": "reviews"})).unwrap();
    let b = load("theme", json!({"handle": "reviews", "name": "Reviews"})).unwrap();
    assert_eq!(a.configuration_hash(), b.configuration_hash());
    assert_eq!(a.uid(), b.uid());
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_unknown_kind() {
    let err = load("checkout_post_purchase", json!({})).unwrap_err();
    assert!(matches!(
        err,
        ConfigurationError::Lookup(LookupError::NotFound(ref kind)) if kind == "checkout_post_purchase"
    ));
    assert_eq!(
        err.to_string(),
        "no extension specification registered for 'checkout_post_purchase'"
    );
}

#[test]
fn test_every_structural_error_is_reported() {
    let err = load(
        "ui_extension",
        json!({
            "name": "",
            "targeting": [{"target": "admin.block"}, "not an object"],
            "capabilities": {"network_access": "yes"}
        }),
    )
    .unwrap_err();

    let reported: Vec<(StructuralErrorKind, String)> = err
        .structural_errors()
        .iter()
        .map(|e| (e.kind, e.path.to_string()))
        .collect();
    assert_eq!(
        reported,
        vec![
            (StructuralErrorKind::RefinementFailed, "name".to_string()),
            (StructuralErrorKind::MissingField, "api_version".to_string()),
            (StructuralErrorKind::MissingField, "targeting[0].module".to_string()),
            (StructuralErrorKind::TypeMismatch, "targeting[1]".to_string()),
            (
                StructuralErrorKind::TypeMismatch,
                "capabilities.network_access".to_string()
            ),
        ]
    );
}

#[test]
fn test_structural_error_display() {
    let err = load("app_home", json!({"application_url": "http://a.com", "embedded": true}))
        .unwrap_err();
    assert_eq!(
        err.structural_errors()[0].to_string(),
        "S004: must be an https URL (at application_url)"
    );
}

#[test]
fn test_max_structural_errors_from_json_config() {
    let registry = default_registry().unwrap();
    let config = ValidationConfig::from_json(r#"{"max_structural_errors": 1}"#).unwrap();
    let err = load_extension(
        &registry,
        LoadRequest::new("ui_extension", json!({}), "."),
        &config,
    )
    .unwrap_err();
    assert_eq!(err.structural_errors().len(), 1);
}

#[test]
fn test_load_all_is_independent() {
    let registry = default_registry().unwrap();
    let results = load_all(
        &registry,
        [
            LoadRequest::new("theme", fixtures::theme_config(), "a"),
            LoadRequest::new("theme", json!({}), "b"),
            LoadRequest::new("app_home", fixtures::app_home_config(), "c"),
        ],
        &ValidationConfig::default(),
    );
    let ok: Vec<bool> = results.iter().map(Result::is_ok).collect();
    assert_eq!(ok, vec![true, false, true]);
}
