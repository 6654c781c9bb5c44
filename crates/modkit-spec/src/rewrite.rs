//! Canonical, schema-ordered configuration output.
//!
//! The rewriter produces the value that gets persisted: object keys in the
//! order the schema declares them, vacuous nested sections removed. It uses
//! the walker's reshape mode, so malformed input is not rejected here.
//! Validation is the loader's job.

use serde_json::Value;

use crate::schema::SchemaNode;
use crate::walker::reshape_value;

/// Rewrites `value` into the canonical layout declared by `schema`.
///
/// - Object keys follow schema declaration order, regardless of input order.
/// - Object-valued fields that reshape to `{}` are omitted.
/// - Undeclared keys are dropped unless the object passes them through, in
///   which case they follow the declared fields.
///
/// Rewriting is idempotent.
///
/// # Example
/// ```
/// use modkit_spec::rewrite::rewrite;
/// use modkit_spec::schema::{ObjectSchema, SchemaNode};
/// use serde_json::json;
///
/// let schema = SchemaNode::object(
///     ObjectSchema::new()
///         .field("name", SchemaNode::string())
///         .field(
///             "build",
///             SchemaNode::object(
///                 ObjectSchema::new().field("command", SchemaNode::string().optional()),
///             )
///             .optional(),
///         ),
/// );
///
/// let out = rewrite(&schema, &json!({"build": {}, "name": "x"}));
/// assert_eq!(serde_json::to_string(&out).unwrap(), r#"{"name":"x"}"#);
/// ```
pub fn rewrite(schema: &SchemaNode, value: &Value) -> Value {
    reshape_value(schema, value)
}

/// Rewrites `value` and serializes it as pretty-printed JSON.
pub fn rewrite_to_string_pretty(
    schema: &SchemaNode,
    value: &Value,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&rewrite(schema, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ObjectSchema;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn app_schema() -> SchemaNode {
        SchemaNode::object(
            ObjectSchema::new()
                .field("client_id", SchemaNode::string())
                .field("name", SchemaNode::string())
                .field(
                    "access_scopes",
                    SchemaNode::object(
                        ObjectSchema::new()
                            .field("scopes", SchemaNode::string().optional())
                            .field("use_legacy_install_flow", SchemaNode::boolean().optional()),
                    )
                    .optional(),
                )
                .field(
                    "build",
                    SchemaNode::object(
                        ObjectSchema::new()
                            .field(
                                "dev_store_url",
                                SchemaNode::string().optional(),
                            )
                            .field(
                                "nested",
                                SchemaNode::object(
                                    ObjectSchema::new()
                                        .field("flag", SchemaNode::boolean().optional()),
                                )
                                .optional(),
                            ),
                    )
                    .optional(),
                )
                .field(
                    "extra",
                    SchemaNode::object(ObjectSchema::new().passthrough()).optional(),
                ),
        )
    }

    #[test]
    fn test_orders_fields_as_declared() {
        let value = json!({
            "access_scopes": {"use_legacy_install_flow": true, "scopes": "read_products"},
            "name": "app",
            "client_id": "abc"
        });
        let out = rewrite(&app_schema(), &value);
        assert_eq!(
            serde_json::to_string(&out).unwrap(),
            r#"{"client_id":"abc","name":"app","access_scopes":{"scopes":"read_products","use_legacy_install_flow":true}}"#
        );
    }

    #[test]
    fn test_prunes_recursively_empty_sections() {
        let value = json!({
            "client_id": "abc",
            "name": "app",
            "build": {"nested": {}}
        });
        let out = rewrite(&app_schema(), &value);
        assert_eq!(out, json!({"client_id": "abc", "name": "app"}));
    }

    #[test]
    fn test_passthrough_keeps_unknown_keys_after_declared() {
        let value = json!({"extra": {"z": 1, "a": 2}, "name": "app", "client_id": "abc"});
        let out = rewrite(&app_schema(), &value);
        assert_eq!(
            serde_json::to_string(&out).unwrap(),
            r#"{"client_id":"abc","name":"app","extra":{"z":1,"a":2}}"#
        );
    }

    #[test]
    fn test_is_idempotent() {
        let value = json!({
            "build": {"dev_store_url": "shop.example.com", "nested": {}},
            "name": "app",
            "client_id": "abc",
            "stray": 1
        });
        let once = rewrite(&app_schema(), &value);
        let twice = rewrite(&app_schema(), &once);
        assert_eq!(
            serde_json::to_string(&once).unwrap(),
            serde_json::to_string(&twice).unwrap()
        );
    }

    #[test]
    fn test_pretty_output() {
        let out = rewrite_to_string_pretty(&app_schema(), &json!({"name": "a", "client_id": "b"}))
            .unwrap();
        assert_eq!(out, "{\n  \"client_id\": \"b\",\n  \"name\": \"a\"\n}");
    }
}
