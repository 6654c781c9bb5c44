//! Sample configurations for the built-in kinds.

use serde_json::{json, Value};

/// Endpoint used by webhook fixtures.
pub const ENDPOINT: &str = "https://example.com/webhooks";

/// A valid webhooks section with top-level topics and one record.
pub fn webhooks_config() -> Value {
    json!({
        "webhooks": {
            "api_version": "2024-07",
            "subscription_endpoint_url": ENDPOINT,
            "topics": ["orders/create", "orders/updated"],
            "subscriptions": [
                {"topic": "products/update", "path": "/products", "include_fields": ["id", "title"]}
            ]
        }
    })
}

/// Wraps a webhooks section body in a configuration document.
pub fn webhooks(section: Value) -> Value {
    let mut section = section;
    if let Some(map) = section.as_object_mut() {
        map.entry("api_version").or_insert_with(|| json!("2024-07"));
    }
    json!({ "webhooks": section })
}

/// A valid app home section.
pub fn app_home_config() -> Value {
    json!({
        "application_url": "https://app.example.com",
        "embedded": true,
        "app_preferences": {"url": "https://app.example.com/preferences"}
    })
}

/// A function targeting the product discount API.
pub fn function_config() -> Value {
    json!({
        "name": "Volume discount",
        "handle": "volume-discount",
        "type": "product_discounts",
        "api_version": "2024-07",
        "build": {"command": "cargo build --target=wasm32-wasip1 --release"},
        "targeting": [
            {"target": "purchase.product-discount.run", "input_query": "src/run.graphql", "export": "run"}
        ]
    })
}

/// A UI extension with one checkout and one admin target.
pub fn ui_extension_config() -> Value {
    json!({
        "name": "Loyalty banner",
        "api_version": "2024-07",
        "targeting": [
            {"target": "purchase.checkout.block.render", "module": "./src/Checkout.jsx"},
            {"target": "admin.product-details.block.render", "module": "./src/Admin.jsx"}
        ],
        "capabilities": {"network_access": true}
    })
}

/// A minimal theme app extension.
pub fn theme_config() -> Value {
    json!({"name": "Reviews", "handle": "reviews"})
}
