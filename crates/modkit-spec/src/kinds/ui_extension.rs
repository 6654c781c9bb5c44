//! UI extensions rendered by the host on one or more targets.

use std::path::Path;

use futures_util::future::BoxFuture;
use serde_json::{json, Map, Value};

use super::{existing_file, object_items, str_at};
use crate::error::TransformError;
use crate::schema::{ObjectSchema, Refinement, SchemaNode};
use crate::specification::{
    Capabilities, Capability, DeployContext, Experience, PreviewContext, PreviewLink,
    Specification, UidStrategy,
};

/// Targets under this prefix render in checkout and need a cart URL.
const CHECKOUT_TARGET_PREFIX: &str = "purchase.checkout.";

pub(super) fn specification() -> Specification {
    Specification::builder("ui_extension")
        .additional_identifiers(["checkout_ui_extension", "customer_account_ui_extension"])
        .external_name("UI extension")
        .surface("all")
        .experience(Experience::Extension)
        .uid_strategy(UidStrategy::Uuid)
        .schema(schema())
        .capabilities(capabilities)
        .validate(validate)
        .deploy_config(deploy_config)
        .preview_message(preview_links)
        .build()
}

fn schema() -> SchemaNode {
    let target = ObjectSchema::new()
        .field("target", SchemaNode::string().refine(Refinement::non_empty()))
        .field("module", SchemaNode::string().refine(Refinement::non_empty()))
        .field("default_placement", SchemaNode::string().optional())
        .field(
            "urls",
            SchemaNode::object(ObjectSchema::new().field("edit", SchemaNode::string().optional()))
                .optional(),
        );

    let extension_capabilities = ObjectSchema::new()
        .field("network_access", SchemaNode::boolean().optional())
        .field("block_progress", SchemaNode::boolean().optional())
        .field("api_access", SchemaNode::boolean().optional());

    SchemaNode::object(
        ObjectSchema::new()
            .field("name", SchemaNode::string().refine(Refinement::non_empty()))
            .field("handle", SchemaNode::string().optional())
            .field("uid", SchemaNode::string().optional())
            .field("type", SchemaNode::string().optional())
            .field("api_version", SchemaNode::string())
            .field("description", SchemaNode::string().optional())
            .field("targeting", SchemaNode::array(SchemaNode::object(target)))
            .field(
                "capabilities",
                SchemaNode::object(extension_capabilities).optional(),
            )
            .field(
                "settings",
                SchemaNode::object(ObjectSchema::new().passthrough()).optional(),
            )
            .field("localization", SchemaNode::any().optional()),
    )
}

fn targets(configuration: &Value) -> impl Iterator<Item = &str> {
    object_items(configuration, "targeting")
        .into_iter()
        .filter_map(|target| str_at(target, "target"))
}

fn capabilities(configuration: &Value) -> Capabilities {
    let mut set: Capabilities = [Capability::UiPreview, Capability::Bundling, Capability::Esbuild]
        .into_iter()
        .collect();
    if targets(configuration).any(|target| target.starts_with(CHECKOUT_TARGET_PREFIX)) {
        set.insert(Capability::CartUrl);
    }
    if configuration.get("localization").is_some_and(|v| !v.is_null()) {
        set.insert(Capability::Localization);
    }
    set
}

fn validate<'a>(
    configuration: &'a Value,
    directory: &'a Path,
) -> BoxFuture<'a, Result<(), TransformError>> {
    Box::pin(async move {
        for target in object_items(configuration, "targeting") {
            if let Some(module) = str_at(target, "module") {
                existing_file(directory, module).await?;
            }
        }
        Ok(())
    })
}

fn remote_config(configuration: &Value) -> Value {
    let extension_points: Vec<Value> = object_items(configuration, "targeting")
        .into_iter()
        .map(|target| {
            let mut entry = Map::new();
            for key in ["target", "module", "default_placement", "urls"] {
                if let Some(value) = target.get(key) {
                    entry.insert(key.into(), value.clone());
                }
            }
            Value::Object(entry)
        })
        .collect();

    let mut out = Map::new();
    out.insert("name".into(), json!(str_at(configuration, "name")));
    out.insert(
        "api_version".into(),
        json!(str_at(configuration, "api_version")),
    );
    for key in ["description", "capabilities", "settings", "localization"] {
        if let Some(value) = configuration.get(key) {
            out.insert(key.into(), value.clone());
        }
    }
    out.insert("extension_points".into(), Value::Array(extension_points));
    Value::Object(out)
}

fn deploy_config(
    context: DeployContext<'_>,
) -> BoxFuture<'_, Result<Option<Value>, TransformError>> {
    Box::pin(async move { Ok(Some(remote_config(context.configuration))) })
}

fn preview_links(configuration: &Value, context: &PreviewContext<'_>) -> Vec<PreviewLink> {
    let host = context.host.trim_end_matches('/');
    let mut links: Vec<PreviewLink> = targets(configuration)
        .map(|target| {
            PreviewLink::new(
                target,
                format!("{}/extensions/{}/{}", host, context.uuid, target),
            )
        })
        .collect();
    links.push(PreviewLink::new(
        "store",
        format!("https://{}/admin/extensions-dev-console", context.store_fqdn),
    ));
    links
}
