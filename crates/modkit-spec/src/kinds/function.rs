//! Functions: compiled Wasm modules run by the platform.
//!
//! Each `targeting` entry may name an `input_query` GraphQL file relative
//! to the extension directory. The files must exist at validation time and
//! their contents are embedded in the deploy payload.

use std::path::Path;

use futures_util::future::BoxFuture;
use serde_json::{json, Map, Value};

use super::{existing_file, object_items, read_file, str_at};
use crate::error::TransformError;
use crate::schema::{ObjectSchema, Refinement, SchemaNode};
use crate::specification::{Capability, DeployContext, Experience, Specification, UidStrategy};

/// Function API families that load as functions.
const FUNCTION_APIS: &[&str] = &[
    "product_discounts",
    "order_discounts",
    "shipping_discounts",
    "discount",
    "payment_customization",
    "delivery_customization",
    "cart_checkout_validation",
    "cart_transform",
    "fulfillment_constraints",
    "order_routing_location_rule",
];

pub(super) fn specification() -> Specification {
    Specification::builder("function")
        .additional_identifiers(FUNCTION_APIS.iter().copied())
        .external_name("Function")
        .experience(Experience::Extension)
        .uid_strategy(UidStrategy::Uuid)
        .schema(schema())
        .static_capabilities([Capability::Function])
        .validate(validate)
        .deploy_config(deploy_config)
        .build()
}

fn schema() -> SchemaNode {
    let build = ObjectSchema::new()
        .field("command", SchemaNode::string().optional())
        .field("path", SchemaNode::string().optional())
        .field("watch", SchemaNode::array(SchemaNode::string()).optional())
        .field("wasm_opt", SchemaNode::boolean().optional());

    let target = ObjectSchema::new()
        .field("target", SchemaNode::string().refine(Refinement::non_empty()))
        .field("input_query", SchemaNode::string().optional())
        .field("export", SchemaNode::string().optional());

    let variables = ObjectSchema::new()
        .field("namespace", SchemaNode::string())
        .field("key", SchemaNode::string());

    let ui_paths = ObjectSchema::new()
        .field("create", SchemaNode::string().optional())
        .field("details", SchemaNode::string().optional());

    let ui = ObjectSchema::new()
        .field("handle", SchemaNode::string().optional())
        .field("enable_create", SchemaNode::boolean().optional())
        .field("paths", SchemaNode::object(ui_paths).optional());

    SchemaNode::object(
        ObjectSchema::new()
            .field("name", SchemaNode::string().refine(Refinement::non_empty()))
            .field("handle", SchemaNode::string().optional())
            .field("uid", SchemaNode::string().optional())
            .field("type", SchemaNode::string().optional())
            .field("api_version", SchemaNode::string())
            .field("description", SchemaNode::string().optional())
            .field("build", SchemaNode::object(build).optional())
            .field("targeting", SchemaNode::array(SchemaNode::object(target)).optional())
            .field(
                "input",
                SchemaNode::object(
                    ObjectSchema::new()
                        .field("variables", SchemaNode::object(variables).optional()),
                )
                .optional(),
            )
            .field("ui", SchemaNode::object(ui).optional()),
    )
}

fn input_queries(configuration: &Value) -> Vec<&str> {
    object_items(configuration, "targeting")
        .into_iter()
        .filter_map(|target| str_at(target, "input_query"))
        .collect()
}

fn validate<'a>(
    configuration: &'a Value,
    directory: &'a Path,
) -> BoxFuture<'a, Result<(), TransformError>> {
    Box::pin(async move {
        for query in input_queries(configuration) {
            existing_file(directory, query).await?;
        }
        Ok(())
    })
}

async fn remote_config(context: DeployContext<'_>) -> Result<Value, TransformError> {
    let configuration = context.configuration;

    let mut targets = Vec::new();
    for target in object_items(configuration, "targeting") {
        let mut entry = Map::new();
        if let Some(handle) = str_at(target, "target") {
            entry.insert("handle".into(), Value::String(handle.to_string()));
        }
        if let Some(export) = str_at(target, "export") {
            entry.insert("export".into(), Value::String(export.to_string()));
        }
        if let Some(query) = str_at(target, "input_query") {
            let contents = read_file(context.directory, query).await?;
            entry.insert("input_query".into(), Value::String(contents));
        }
        targets.push(Value::Object(entry));
    }

    let mut out = Map::new();
    out.insert("title".into(), json!(str_at(configuration, "name")));
    if let Some(description) = str_at(configuration, "description") {
        out.insert("description".into(), json!(description));
    }
    out.insert("app_key".into(), json!(context.api_key));
    out.insert(
        "api_type".into(),
        json!(str_at(configuration, "type").unwrap_or("function")),
    );
    out.insert("api_version".into(), json!(str_at(configuration, "api_version")));
    if let Some(module_id) = context.module_id {
        out.insert("module_id".into(), json!(module_id));
    }
    out.insert(
        "enable_creation_ui".into(),
        json!(configuration
            .pointer("/ui/enable_create")
            .and_then(Value::as_bool)
            .unwrap_or(true)),
    );
    if let Some(ui) = configuration.get("ui") {
        out.insert(
            "ui".into(),
            json!({
                "ui_extension_handle": ui.get("handle"),
                "app_bridge": {
                    "create_path": ui.pointer("/paths/create"),
                    "details_path": ui.pointer("/paths/details"),
                }
            }),
        );
    }
    if let Some(variables) = configuration.pointer("/input/variables") {
        out.insert(
            "input_query_variables".into(),
            json!({"single_json_metafield": variables}),
        );
    }
    out.insert("targets".into(), Value::Array(targets));

    Ok(Value::Object(out))
}

fn deploy_config(
    context: DeployContext<'_>,
) -> BoxFuture<'_, Result<Option<Value>, TransformError>> {
    Box::pin(async move { remote_config(context).await.map(Some) })
}
