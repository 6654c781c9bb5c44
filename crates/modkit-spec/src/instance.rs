//! Loaded extension instances and transform dispatch.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransformError;
use crate::hash::{canonical_value_hash, derive_uid};
use crate::rewrite::rewrite;
use crate::specification::{
    Capabilities, Capability, DeployContext, PreviewContext, PreviewLink, Specification,
    UidStrategy,
};

/// The payload sent to the remote platform for one instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployPayload {
    pub uid: String,
    pub handle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_id: Option<String>,
    pub api_key: String,
    pub config: Value,
}

/// A validated configuration bound to its specification.
///
/// Instances are only created by the loader, after schema and constraint
/// validation succeed. The configuration never changes afterwards; the
/// runtime uuid is the only mutable part.
#[derive(Debug, Clone)]
pub struct ExtensionInstance {
    specification: Arc<Specification>,
    configuration: Value,
    directory: PathBuf,
    configuration_path: PathBuf,
    runtime_uuid: Option<String>,
}

impl ExtensionInstance {
    pub(crate) fn new(
        specification: Arc<Specification>,
        configuration: Value,
        directory: PathBuf,
        configuration_path: PathBuf,
    ) -> Self {
        Self {
            specification,
            configuration,
            directory,
            configuration_path,
            runtime_uuid: None,
        }
    }

    pub fn specification(&self) -> &Arc<Specification> {
        &self.specification
    }

    /// The validated configuration.
    pub fn configuration(&self) -> &Value {
        &self.configuration
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn configuration_path(&self) -> &Path {
        &self.configuration_path
    }

    /// Canonical identifier of the specification.
    pub fn identifier(&self) -> &str {
        &self.specification.identifier
    }

    pub fn capabilities(&self) -> Capabilities {
        self.specification.capabilities_for(&self.configuration)
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Runs the kind's validate hook against the instance directory.
    pub async fn validate(&self) -> Result<(), TransformError> {
        self.validate_in(&self.directory).await
    }

    /// Runs the kind's validate hook against `directory`.
    ///
    /// Kinds without a validate hook succeed.
    pub async fn validate_in(&self, directory: &Path) -> Result<(), TransformError> {
        let Some(hook) = self.specification.validate_hook() else {
            return Ok(());
        };
        tracing::debug!(
            identifier = %self.specification.identifier,
            directory = %directory.display(),
            "running validate hook"
        );
        let result = hook(&self.configuration, directory).await;
        if let Err(e) = &result {
            tracing::warn!(
                identifier = %self.specification.identifier,
                error = %e,
                "validate hook failed"
            );
        }
        result
    }

    /// Builds the deploy payload. `None` if the kind has no deploy builder
    /// or the builder has nothing to send.
    pub async fn build_deploy_payload(
        &self,
        api_key: &str,
        module_id: Option<&str>,
    ) -> Result<Option<DeployPayload>, TransformError> {
        let Some(hook) = self.specification.deploy_config_hook() else {
            return Ok(None);
        };
        let context = DeployContext {
            configuration: &self.configuration,
            directory: &self.directory,
            api_key,
            module_id,
        };
        let Some(config) = hook(context).await? else {
            return Ok(None);
        };
        tracing::debug!(
            identifier = %self.specification.identifier,
            uid = %self.uid(),
            "built deploy payload"
        );
        Ok(Some(DeployPayload {
            uid: self.uid(),
            handle: self.handle(),
            module_id: module_id.map(str::to_string),
            api_key: api_key.to_string(),
            config,
        }))
    }

    /// Preview links for the local development server.
    pub fn preview_links(&self, host: &str, uuid: &str, store_fqdn: &str) -> Vec<PreviewLink> {
        match self.specification.preview_hook() {
            Some(hook) => hook(
                &self.configuration,
                &PreviewContext {
                    host,
                    uuid,
                    store_fqdn,
                },
            ),
            None => Vec::new(),
        }
    }

    /// The configured `handle`, else the slugified `name`, else the identifier.
    pub fn handle(&self) -> String {
        if let Some(handle) = self.string_field("handle") {
            return handle.to_string();
        }
        self.string_field("name")
            .map(slugify)
            .filter(|slug| !slug.is_empty())
            .unwrap_or_else(|| self.specification.identifier.clone())
    }

    /// The remote uid of this instance.
    pub fn uid(&self) -> String {
        if let Some(uuid) = &self.runtime_uuid {
            return uuid.clone();
        }
        let identifier = &self.specification.identifier;
        match self.specification.uid_strategy {
            UidStrategy::Single => identifier.clone(),
            UidStrategy::Uuid => self
                .string_field("uid")
                .map(str::to_string)
                .unwrap_or_else(|| derive_uid(identifier, &self.handle())),
            UidStrategy::Dynamic => derive_uid(identifier, &self.configuration_hash()),
        }
    }

    /// Attaches the uuid assigned by the remote platform.
    pub fn set_runtime_uuid(&mut self, uuid: impl Into<String>) {
        self.runtime_uuid = Some(uuid.into());
    }

    pub fn runtime_uuid(&self) -> Option<&str> {
        self.runtime_uuid.as_deref()
    }

    /// The configuration in schema order with empty sections removed.
    pub fn rewritten_configuration(&self) -> Value {
        rewrite(&self.specification.schema, &self.configuration)
    }

    /// Canonical BLAKE3 hash of the configuration.
    pub fn configuration_hash(&self) -> String {
        canonical_value_hash(&self.configuration)
    }

    fn string_field(&self, key: &str) -> Option<&str> {
        self.configuration
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Runs every instance's validate hook concurrently.
///
/// Results are returned in the order of `instances`.
pub async fn validate_all(instances: &[ExtensionInstance]) -> Vec<Result<(), TransformError>> {
    join_all(instances.iter().map(ExtensionInstance::validate)).await
}

/// Lowercases `name` and joins its alphanumeric runs with `-`.
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
