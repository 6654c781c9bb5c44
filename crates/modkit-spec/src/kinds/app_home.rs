//! The `app_home` app configuration section.

use futures_util::future::BoxFuture;
use serde_json::{Map, Value};

use crate::error::TransformError;
use crate::schema::{ObjectSchema, Refinement, SchemaNode};
use crate::specification::{Capability, DeployContext, Experience, Specification, UidStrategy};

pub(super) fn specification() -> Specification {
    Specification::builder("app_home")
        .external_name("App home")
        .surface("admin")
        .experience(Experience::Configuration)
        .uid_strategy(UidStrategy::Single)
        .schema(schema())
        .static_capabilities([Capability::AppConfig])
        .deploy_config(deploy_config)
        .build()
}

fn https_url() -> SchemaNode {
    SchemaNode::string()
        .refine(Refinement::starts_with("https://").with_message("must be an https URL"))
        .refine(Refinement::max_length(255))
}

fn schema() -> SchemaNode {
    SchemaNode::object(
        ObjectSchema::new()
            .field("application_url", https_url())
            .field("embedded", SchemaNode::boolean())
            .field(
                "app_preferences",
                SchemaNode::object(ObjectSchema::new().field("url", https_url().optional()))
                    .optional(),
            ),
    )
}

fn remote_config(configuration: &Value) -> Value {
    let mut out = Map::new();
    if let Some(url) = configuration.get("application_url") {
        out.insert("app_url".into(), url.clone());
    }
    if let Some(embedded) = configuration.get("embedded") {
        out.insert("embedded".into(), embedded.clone());
    }
    if let Some(url) = configuration.pointer("/app_preferences/url") {
        out.insert("preferences_url".into(), url.clone());
    }
    Value::Object(out)
}

fn deploy_config(
    context: DeployContext<'_>,
) -> BoxFuture<'_, Result<Option<Value>, TransformError>> {
    Box::pin(async move { Ok(Some(remote_config(context.configuration))) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::validate_value;
    use serde_json::json;

    #[test]
    fn test_remote_config() {
        let config = json!({
            "application_url": "https://app.example.com",
            "embedded": true,
            "app_preferences": {"url": "https://app.example.com/prefs"}
        });
        assert_eq!(
            remote_config(&config),
            json!({
                "app_url": "https://app.example.com",
                "embedded": true,
                "preferences_url": "https://app.example.com/prefs"
            })
        );
        assert!(remote_config(&json!({"embedded": false})).get("preferences_url").is_none());
    }

    #[test]
    fn test_schema() {
        assert!(validate_value(
            &schema(),
            &json!({"application_url": "https://a.com", "embedded": false})
        )
        .is_ok());

        let errors =
            validate_value(&schema(), &json!({"application_url": "http://a.com"})).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
