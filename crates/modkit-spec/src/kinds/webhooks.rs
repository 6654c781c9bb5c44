//! The `webhooks` app configuration section.

use futures_util::future::BoxFuture;
use serde_json::{json, Map, Value};

use crate::config::ConstraintMode;
use crate::constraint::{effective_subscriptions, validate_webhook_subscriptions};
use crate::error::{ConstraintError, TransformError};
use crate::path::FieldPath;
use crate::schema::{ObjectSchema, Refinement, SchemaNode};
use crate::specification::{Capability, DeployContext, Experience, Specification, UidStrategy};

const SECTION: &str = "webhooks";

pub(super) fn specification() -> Specification {
    Specification::builder("webhooks")
        .external_identifier("webhook_subscription")
        .external_name("Webhooks")
        .surface("admin")
        .experience(Experience::Configuration)
        .uid_strategy(UidStrategy::Single)
        .schema(schema())
        .static_capabilities([Capability::AppConfig])
        .constraints(webhooks_section_constraints)
        .deploy_config(deploy_config)
        .build()
}

fn endpoint_url() -> SchemaNode {
    SchemaNode::string()
        .refine(Refinement::starts_with("https://").with_message("must be an https URL"))
        .refine(Refinement::not_ends_with("/"))
}

fn arn() -> SchemaNode {
    SchemaNode::string().refine(
        Refinement::pattern(r"^arn:aws:events:[a-z0-9-]+::event-source/aws\.partner/.+$")
            .with_message("must be an AWS EventBridge partner event source ARN"),
    )
}

fn with_destination(object: ObjectSchema) -> ObjectSchema {
    object
        .field("subscription_endpoint_url", endpoint_url().optional())
        .field("pubsub_project", SchemaNode::string().optional())
        .field("pubsub_topic", SchemaNode::string().optional())
        .field("arn", arn().optional())
}

fn subscription() -> SchemaNode {
    let record = with_destination(
        ObjectSchema::new().field("topic", SchemaNode::string().refine(Refinement::non_empty())),
    )
    .field(
        "path",
        SchemaNode::string()
            .refine(Refinement::starts_with("/").with_message("must start with /"))
            .optional(),
    )
    .field("sub_topic", SchemaNode::string().optional())
    .field(
        "format",
        SchemaNode::string()
            .refine(Refinement::one_of(["json", "xml"]))
            .optional(),
    )
    .field(
        "include_fields",
        SchemaNode::array(SchemaNode::string()).optional(),
    )
    .field(
        "metafield_namespaces",
        SchemaNode::array(SchemaNode::string()).optional(),
    );
    SchemaNode::object(record)
}

fn schema() -> SchemaNode {
    let section = with_destination(
        ObjectSchema::new().field(
            "api_version",
            SchemaNode::string().refine(Refinement::non_empty()),
        ),
    )
    .field("topics", SchemaNode::array(SchemaNode::string()).optional())
    .field("subscriptions", SchemaNode::array(subscription()).optional());

    SchemaNode::object(ObjectSchema::new().field(SECTION, SchemaNode::object(section)))
}

/// Runs the subscription constraints on the `webhooks` section.
///
/// Error paths are relative to the whole configuration.
pub fn webhooks_section_constraints(
    configuration: &Value,
    mode: ConstraintMode,
) -> Result<(), Vec<ConstraintError>> {
    let Some(section) = configuration.get(SECTION) else {
        return Ok(());
    };
    let prefix = FieldPath::from_segments([SECTION]);
    validate_webhook_subscriptions(section, mode)
        .map_err(|errors| errors.into_iter().map(|e| e.prefixed(&prefix)).collect())
}

/// Flattens the `webhooks` section into one entry per delivered subscription.
///
/// ```
/// use modkit_spec::kinds::remote_webhooks_config;
/// use serde_json::json;
///
/// let remote = remote_webhooks_config(&json!({"webhooks": {
///     "api_version": "2024-01",
///     "pubsub_project": "p",
///     "pubsub_topic": "t",
///     "topics": ["orders/create"]
/// }}));
/// assert_eq!(remote["subscriptions"][0]["uri"], "pubsub://p:t");
/// ```
pub fn remote_webhooks_config(configuration: &Value) -> Value {
    let section = configuration.get(SECTION).unwrap_or(&Value::Null);
    let subscriptions: Vec<Value> = effective_subscriptions(section)
        .into_iter()
        .filter_map(|subscription| {
            let uri = subscription.uri()?;
            let mut entry = Map::new();
            entry.insert("topic".into(), Value::String(subscription.topic));
            entry.insert("uri".into(), Value::String(uri));
            if let Some(sub_topic) = subscription.sub_topic {
                entry.insert("sub_topic".into(), Value::String(sub_topic));
            }
            if !subscription.include_fields.is_empty() {
                entry.insert("include_fields".into(), json!(subscription.include_fields));
            }
            if let Some(format) = subscription.format {
                entry.insert("format".into(), Value::String(format));
            }
            if !subscription.metafield_namespaces.is_empty() {
                entry.insert(
                    "metafield_namespaces".into(),
                    json!(subscription.metafield_namespaces),
                );
            }
            Some(Value::Object(entry))
        })
        .collect();

    json!({
        "api_version": section.get("api_version").cloned().unwrap_or(Value::Null),
        "subscriptions": subscriptions,
    })
}

fn deploy_config(
    context: DeployContext<'_>,
) -> BoxFuture<'_, Result<Option<Value>, TransformError>> {
    Box::pin(async move { Ok(Some(remote_webhooks_config(context.configuration))) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConstraintErrorKind;
    use crate::walker::validate_value;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_schema_accepts_section() {
        let config = json!({
            "client_id": "abc",
            "webhooks": {
                "api_version": "2024-01",
                "subscription_endpoint_url": "https://example.com/hooks",
                "topics": ["orders/create"],
                "subscriptions": [{"topic": "orders/paid", "path": "/paid", "format": "json"}]
            }
        });
        let validated = validate_value(&schema(), &config).unwrap();
        assert!(validated.get("client_id").is_none());
    }

    #[test]
    fn test_schema_refinements() {
        let config = json!({"webhooks": {
            "api_version": "2024-01",
            "subscription_endpoint_url": "http://example.com/",
            "subscriptions": [{"topic": "t", "path": "paid", "format": "yaml"}]
        }});
        let errors = validate_value(&schema(), &config).unwrap_err();
        let paths: Vec<String> = errors.iter().map(|e| e.path.to_string()).collect();
        assert_eq!(
            paths,
            vec![
                "webhooks.subscription_endpoint_url",
                "webhooks.subscriptions[0].path",
                "webhooks.subscriptions[0].format",
            ]
        );
        assert_eq!(errors[0].message, "must be an https URL");
    }

    #[test]
    fn test_constraint_paths_are_prefixed() {
        let config = json!({"webhooks": {
            "api_version": "2024-01",
            "subscriptions": [{"topic": "t", "pubsub_project": "p"}]
        }});
        let errors = webhooks_section_constraints(&config, ConstraintMode::FailFast).unwrap_err();
        assert_eq!(errors[0].kind, ConstraintErrorKind::IncompletePubSubPair);
        assert_eq!(
            errors[0].path.to_string(),
            "webhooks.subscriptions[0].pubsub_topic"
        );
    }

    #[test]
    fn test_missing_section_has_no_constraints() {
        assert!(webhooks_section_constraints(&json!({}), ConstraintMode::Collect).is_ok());
    }

    #[test]
    fn test_remote_config() {
        let config = json!({"webhooks": {
            "api_version": "2024-01",
            "subscription_endpoint_url": "https://example.com",
            "topics": ["orders/create"],
            "subscriptions": [
                {"topic": "products/update", "path": "/products", "include_fields": ["id"]},
                {"topic": "orders/delete", "arn": "arn:aws:events:us-east-1::event-source/aws.partner/x", "sub_topic": "s"}
            ]
        }});
        assert_eq!(
            remote_webhooks_config(&config),
            json!({
                "api_version": "2024-01",
                "subscriptions": [
                    {"topic": "orders/create", "uri": "https://example.com"},
                    {"topic": "products/update", "uri": "https://example.com/products", "include_fields": ["id"]},
                    {"topic": "orders/delete", "uri": "arn:aws:events:us-east-1::event-source/aws.partner/x", "sub_topic": "s"}
                ]
            })
        );
    }
}
