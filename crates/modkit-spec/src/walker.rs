//! Recursive traversal pairing a schema node with a value.
//!
//! The same traversal runs in two modes:
//!
//! - **validate** rejects malformed input and returns every structural
//!   error with its path. On success the result is the reshaped value:
//!   object keys in schema declaration order, unknown keys handled per
//!   object policy.
//! - **reshape** never fails. Values that do not match their node pass
//!   through unchanged, and object-valued fields that reshape to an empty
//!   object are pruned from their parent. This is what the rewriter uses.

use serde_json::{Map, Value};

use crate::error::{StructuralError, StructuralErrorKind};
use crate::path::FieldPath;
use crate::schema::{ObjectSchema, ScalarKind, ScalarSchema, SchemaNode, UnknownKeys};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkMode {
    Validate,
    Reshape,
}

struct Walker {
    mode: WalkMode,
    errors: Vec<StructuralError>,
}

/// Validates `value` against `node`.
///
/// # Returns
/// * `Ok(value)` with the reshaped, schema-ordered value.
/// * `Err(errors)` with every structural error found. No partial value is
///   returned on failure.
///
/// # Example
/// ```
/// use modkit_spec::schema::{ObjectSchema, SchemaNode};
/// use modkit_spec::walker::validate_value;
/// use serde_json::json;
///
/// let schema = SchemaNode::object(
///     ObjectSchema::new()
///         .field("name", SchemaNode::string())
///         .field("handle", SchemaNode::string().optional()),
/// );
///
/// let value = validate_value(&schema, &json!({"handle": "h", "name": "n"})).unwrap();
/// assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"name":"n","handle":"h"}"#);
///
/// let errors = validate_value(&schema, &json!({"handle": 3})).unwrap_err();
/// assert_eq!(errors.len(), 2);
/// ```
pub fn validate_value(node: &SchemaNode, value: &Value) -> Result<Value, Vec<StructuralError>> {
    let mut walker = Walker {
        mode: WalkMode::Validate,
        errors: Vec::new(),
    };
    let reshaped = walker.walk(node, Some(value), &FieldPath::root());
    if walker.errors.is_empty() {
        Ok(reshaped.unwrap_or(Value::Null))
    } else {
        Err(walker.errors)
    }
}

/// Reshapes `value` to the layout `node` declares without validating it.
pub fn reshape_value(node: &SchemaNode, value: &Value) -> Value {
    let mut walker = Walker {
        mode: WalkMode::Reshape,
        errors: Vec::new(),
    };
    walker
        .walk(node, Some(value), &FieldPath::root())
        .unwrap_or(Value::Null)
}

/// String under `key` of an object, if set and non-empty.
pub(crate) fn str_at<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Returns the JSON type name of a value for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Walker {
    fn report(&mut self, kind: StructuralErrorKind, message: String, path: &FieldPath) {
        if self.mode == WalkMode::Validate {
            self.errors
                .push(StructuralError::new(kind, message, path.clone()));
        }
    }

    /// Walks one node. `None` means the value is absent.
    fn walk(
        &mut self,
        node: &SchemaNode,
        value: Option<&Value>,
        path: &FieldPath,
    ) -> Option<Value> {
        match node {
            SchemaNode::Optional { inner } | SchemaNode::Nullable { inner } => match value {
                None => None,
                Some(Value::Null) => Some(Value::Null),
                Some(_) => self.walk(inner, value, path),
            },
            SchemaNode::Array { element } => {
                let value = value?;
                match value {
                    Value::Array(items) => Some(Value::Array(
                        items
                            .iter()
                            .enumerate()
                            .map(|(i, item)| {
                                self.walk(element, Some(item), &path.child(i))
                                    .unwrap_or(Value::Null)
                            })
                            .collect(),
                    )),
                    other => {
                        self.report_mismatch("array", other, path);
                        Some(other.clone())
                    }
                }
            }
            SchemaNode::Object(object) => {
                let value = value?;
                match value {
                    Value::Object(map) => Some(Value::Object(self.walk_object(object, map, path))),
                    other => {
                        self.report_mismatch("object", other, path);
                        Some(other.clone())
                    }
                }
            }
            SchemaNode::Scalar(scalar) => {
                let value = value?;
                self.check_scalar(scalar, value, path);
                Some(value.clone())
            }
        }
    }

    fn walk_object(
        &mut self,
        object: &ObjectSchema,
        map: &Map<String, Value>,
        path: &FieldPath,
    ) -> Map<String, Value> {
        let mut out = Map::new();

        for field in &object.fields {
            let field_path = path.child(field.name.as_str());
            match map.get(&field.name) {
                Some(raw) => {
                    if let Some(reshaped) = self.walk(&field.node, Some(raw), &field_path) {
                        if !self.prunes(&reshaped) {
                            out.insert(field.name.clone(), reshaped);
                        }
                    }
                }
                None if field.is_required() => self.report(
                    StructuralErrorKind::MissingField,
                    format!("field '{}' is required", field.name),
                    &field_path,
                ),
                None => {}
            }
        }

        for (key, raw) in map {
            if object.declares(key) {
                continue;
            }
            match object.unknown_keys {
                UnknownKeys::Strip => {}
                UnknownKeys::Passthrough => {
                    if !self.prunes(raw) {
                        out.insert(key.clone(), raw.clone());
                    }
                }
                UnknownKeys::Strict => self.report(
                    StructuralErrorKind::UnknownField,
                    format!("field '{}' is not allowed here", key),
                    &path.child(key.as_str()),
                ),
            }
        }

        out
    }

    /// Reshape mode drops object-valued fields that ended up empty.
    fn prunes(&self, value: &Value) -> bool {
        self.mode == WalkMode::Reshape && matches!(value, Value::Object(map) if map.is_empty())
    }

    fn check_scalar(&mut self, scalar: &ScalarSchema, value: &Value, path: &FieldPath) {
        if self.mode == WalkMode::Reshape {
            return;
        }

        let type_ok = match scalar.kind {
            ScalarKind::String => value.is_string(),
            ScalarKind::Integer => is_integral(value),
            ScalarKind::Number => value.is_number(),
            ScalarKind::Boolean => value.is_boolean(),
            ScalarKind::Any => true,
        };
        if !type_ok {
            self.report_mismatch(scalar.kind.as_str(), value, path);
            return;
        }

        for refinement in &scalar.refinements {
            if let Err(message) = refinement.check(value) {
                self.report(StructuralErrorKind::RefinementFailed, message, path);
                return;
            }
        }
    }

    fn report_mismatch(&mut self, expected: &str, found: &Value, path: &FieldPath) {
        self.report(
            StructuralErrorKind::TypeMismatch,
            format!("expected {}, found {}", expected, json_type_name(found)),
            path,
        );
    }
}

fn is_integral(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64() || n.is_u64() || n.as_f64().map_or(false, |f| f.fract() == 0.0)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Refinement;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn subscription_schema() -> SchemaNode {
        SchemaNode::object(
            ObjectSchema::new()
                .field("api_version", SchemaNode::string())
                .field(
                    "subscriptions",
                    SchemaNode::array(SchemaNode::object(
                        ObjectSchema::new()
                            .field("topic", SchemaNode::string())
                            .field(
                                "uri",
                                SchemaNode::string()
                                    .refine(Refinement::starts_with("https://"))
                                    .refine(Refinement::not_ends_with("/"))
                                    .optional(),
                            ),
                    ))
                    .optional(),
                )
                .field(
                    "privacy",
                    SchemaNode::object(
                        ObjectSchema::new().field("url", SchemaNode::string().optional()),
                    )
                    .optional(),
                ),
        )
    }

    #[test]
    fn test_validate_reorders_to_schema() {
        let value = json!({
            "subscriptions": [{"uri": "https://a.com", "topic": "orders/create"}],
            "api_version": "2024-01"
        });
        let result = validate_value(&subscription_schema(), &value).unwrap();
        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"api_version":"2024-01","subscriptions":[{"topic":"orders/create","uri":"https://a.com"}]}"#
        );
    }

    #[test]
    fn test_validate_collects_all_errors_with_paths() {
        let value = json!({
            "subscriptions": [
                {"topic": 5},
                {"uri": "http://a.com"}
            ]
        });
        let errors = validate_value(&subscription_schema(), &value).unwrap_err();
        let summary: Vec<(StructuralErrorKind, String)> = errors
            .iter()
            .map(|e| (e.kind, e.path.to_string()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (StructuralErrorKind::MissingField, "api_version".to_string()),
                (
                    StructuralErrorKind::TypeMismatch,
                    "subscriptions[0].topic".to_string()
                ),
                (
                    StructuralErrorKind::MissingField,
                    "subscriptions[1].topic".to_string()
                ),
                (
                    StructuralErrorKind::RefinementFailed,
                    "subscriptions[1].uri".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_refinements_short_circuit() {
        let value = json!({
            "api_version": "v",
            "subscriptions": [{"topic": "t", "uri": "http://x/"}]
        });
        let errors = validate_value(&subscription_schema(), &value).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "must start with https://");
    }

    #[test]
    fn test_type_mismatch_message() {
        let errors = validate_value(&SchemaNode::string(), &json!(null)).unwrap_err();
        assert_eq!(errors[0].message, "expected string, found null");
    }

    #[test]
    fn test_optional_accepts_null() {
        let value = json!({"api_version": "v", "subscriptions": null});
        let result = validate_value(&subscription_schema(), &value).unwrap();
        assert_eq!(result, json!({"api_version": "v", "subscriptions": null}));
    }

    #[test]
    fn test_nullable_field_is_still_required() {
        let schema = SchemaNode::object(
            ObjectSchema::new().field("description", SchemaNode::string().nullable()),
        );
        assert!(validate_value(&schema, &json!({"description": null})).is_ok());
        let errors = validate_value(&schema, &json!({})).unwrap_err();
        assert_eq!(errors[0].kind, StructuralErrorKind::MissingField);
    }

    #[test]
    fn test_unknown_key_policies() {
        let fields = ObjectSchema::new().field("a", SchemaNode::integer());
        let value = json!({"b": true, "a": 1});

        let stripped = validate_value(&SchemaNode::object(fields.clone()), &value).unwrap();
        assert_eq!(stripped, json!({"a": 1}));

        let kept =
            validate_value(&SchemaNode::object(fields.clone().passthrough()), &value).unwrap();
        assert_eq!(serde_json::to_string(&kept).unwrap(), r#"{"a":1,"b":true}"#);

        let errors = validate_value(&SchemaNode::object(fields.strict()), &value).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, StructuralErrorKind::UnknownField);
        assert_eq!(errors[0].path.to_string(), "b");
    }

    #[test]
    fn test_integer_accepts_integral_float() {
        assert!(validate_value(&SchemaNode::integer(), &json!(3.0)).is_ok());
        assert!(validate_value(&SchemaNode::integer(), &json!(3.5)).is_err());
    }

    #[test]
    fn test_validate_does_not_prune() {
        let value = json!({"api_version": "v", "privacy": {}});
        let result = validate_value(&subscription_schema(), &value).unwrap();
        assert_eq!(result, json!({"api_version": "v", "privacy": {}}));
    }

    #[test]
    fn test_reshape_prunes_empty_objects() {
        let value = json!({"privacy": {"unknown": 1}, "api_version": "v"});
        let result = reshape_value(&subscription_schema(), &value);
        assert_eq!(result, json!({"api_version": "v"}));
    }

    #[test]
    fn test_reshape_passes_mismatches_through() {
        let value = json!({"api_version": 7, "subscriptions": "oops"});
        let result = reshape_value(&subscription_schema(), &value);
        assert_eq!(result, json!({"api_version": 7, "subscriptions": "oops"}));
    }
}
