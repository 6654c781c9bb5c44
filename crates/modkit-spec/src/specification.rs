//! Extension specifications.
//!
//! A [`Specification`] describes one extension kind: its identifiers, the
//! schema its configuration must match, and the hooks that turn a validated
//! configuration into capabilities, deploy payloads and preview links.
//! Specifications are immutable once built; the registry hands them out as
//! `Arc<Specification>`.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ConstraintMode;
use crate::error::{ConstraintError, TransformError};
use crate::schema::{ObjectSchema, SchemaNode};

/// Registration limit for configuration modules.
pub const CONFIGURATION_REGISTRATION_LIMIT: u32 = 1;
/// Registration limit for regular extensions.
pub const EXTENSION_REGISTRATION_LIMIT: u32 = 50;

/// How an extension kind is presented to the app developer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Experience {
    /// A standalone extension living in its own directory.
    #[default]
    Extension,
    /// A section of the app configuration file.
    Configuration,
    /// Still loadable, no longer offered for new extensions.
    Deprecated,
}

impl Experience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Experience::Extension => "extension",
            Experience::Configuration => "configuration",
            Experience::Deprecated => "deprecated",
        }
    }
}

impl fmt::Display for Experience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How an instance's remote uid is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UidStrategy {
    /// One instance per app; the identifier is the uid.
    Single,
    /// Each instance carries (or derives) its own uid.
    #[default]
    Uuid,
    /// The uid follows the configuration content.
    Dynamic,
}

impl UidStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            UidStrategy::Single => "single",
            UidStrategy::Uuid => "uuid",
            UidStrategy::Dynamic => "dynamic",
        }
    }
}

/// A feature flag derived from a validated configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    UiPreview,
    Function,
    Bundling,
    Esbuild,
    SingleJsEntryPath,
    CartUrl,
    AppConfig,
    Localization,
    GeneratesSourceMaps,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::UiPreview => "ui_preview",
            Capability::Function => "function",
            Capability::Bundling => "bundling",
            Capability::Esbuild => "esbuild",
            Capability::SingleJsEntryPath => "single_js_entry_path",
            Capability::CartUrl => "cart_url",
            Capability::AppConfig => "app_config",
            Capability::Localization => "localization",
            Capability::GeneratesSourceMaps => "generates_source_maps",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered set of capabilities.
pub type Capabilities = BTreeSet<Capability>;

/// Host details used to build preview links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewContext<'a> {
    /// Base URL of the local development server.
    pub host: &'a str,
    /// Runtime uuid of the instance being previewed.
    pub uuid: &'a str,
    /// Fully qualified domain of the development store.
    pub store_fqdn: &'a str,
}

/// A labelled preview URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewLink {
    pub label: String,
    pub url: String,
}

impl PreviewLink {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Inputs to a deploy-config hook.
#[derive(Debug, Clone, Copy)]
pub struct DeployContext<'a> {
    pub configuration: &'a Value,
    pub directory: &'a Path,
    pub api_key: &'a str,
    pub module_id: Option<&'a str>,
}

/// Derives capabilities from a validated configuration.
pub type CapabilitiesFn = Arc<dyn Fn(&Value) -> Capabilities + Send + Sync>;

/// Checks cross-record rules on a validated configuration.
pub type ConstraintFn =
    Arc<dyn Fn(&Value, ConstraintMode) -> Result<(), Vec<ConstraintError>> + Send + Sync>;

/// Checks the extension directory against a validated configuration.
pub type ValidateFn = Arc<
    dyn for<'a> Fn(&'a Value, &'a Path) -> BoxFuture<'a, Result<(), TransformError>>
        + Send
        + Sync,
>;

/// Builds the remote representation of a configuration.
pub type DeployConfigFn = Arc<
    dyn for<'a> Fn(DeployContext<'a>) -> BoxFuture<'a, Result<Option<Value>, TransformError>>
        + Send
        + Sync,
>;

/// Builds preview links for a configuration.
pub type PreviewFn = Arc<dyn Fn(&Value, &PreviewContext<'_>) -> Vec<PreviewLink> + Send + Sync>;

/// One extension kind.
#[derive(Clone)]
pub struct Specification {
    /// Canonical identifier, unique across the registry.
    pub identifier: String,
    /// Identifier used by the remote platform.
    pub external_identifier: String,
    /// Further names that resolve to this specification.
    pub additional_identifiers: Vec<String>,
    /// Human-facing name.
    pub external_name: String,
    /// Where the extension surfaces (`admin`, `checkout`, `all`, ...).
    pub surface: String,
    pub experience: Experience,
    pub uid_strategy: UidStrategy,
    /// How many instances of this kind an app may register.
    pub registration_limit: u32,
    /// Shape of a valid configuration.
    pub schema: SchemaNode,
    capabilities: CapabilitiesFn,
    constraints: Option<ConstraintFn>,
    validate: Option<ValidateFn>,
    deploy_config: Option<DeployConfigFn>,
    preview_message: Option<PreviewFn>,
}

impl Specification {
    /// Creates a builder for a specification.
    pub fn builder(identifier: impl Into<String>) -> SpecificationBuilder {
        SpecificationBuilder::new(identifier)
    }

    /// Alternate names: the external identifier and the additional
    /// identifiers, without the canonical identifier and without repeats.
    pub fn aliases(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for alias in std::iter::once(&self.external_identifier).chain(&self.additional_identifiers)
        {
            if alias != &self.identifier && !out.contains(&alias.as_str()) {
                out.push(alias);
            }
        }
        out
    }

    /// Returns true if `name` is the identifier or one of the aliases.
    pub fn claims(&self, name: &str) -> bool {
        self.identifier == name || self.aliases().contains(&name)
    }

    /// Returns true for configuration-section kinds.
    pub fn is_configuration(&self) -> bool {
        self.experience == Experience::Configuration
    }

    /// Capabilities of a validated configuration.
    pub fn capabilities_for(&self, configuration: &Value) -> Capabilities {
        (self.capabilities)(configuration)
    }

    /// Runs the constraint hook. Kinds without one accept everything.
    pub fn check_constraints(
        &self,
        configuration: &Value,
        mode: ConstraintMode,
    ) -> Result<(), Vec<ConstraintError>> {
        match &self.constraints {
            Some(check) => check(configuration, mode),
            None => Ok(()),
        }
    }

    pub fn has_constraints(&self) -> bool {
        self.constraints.is_some()
    }

    pub(crate) fn validate_hook(&self) -> Option<&ValidateFn> {
        self.validate.as_ref()
    }

    pub(crate) fn deploy_config_hook(&self) -> Option<&DeployConfigFn> {
        self.deploy_config.as_ref()
    }

    pub(crate) fn preview_hook(&self) -> Option<&PreviewFn> {
        self.preview_message.as_ref()
    }

    pub fn has_deploy_config(&self) -> bool {
        self.deploy_config.is_some()
    }

    pub fn has_preview(&self) -> bool {
        self.preview_message.is_some()
    }
}

impl fmt::Debug for Specification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specification")
            .field("identifier", &self.identifier)
            .field("external_identifier", &self.external_identifier)
            .field("additional_identifiers", &self.additional_identifiers)
            .field("surface", &self.surface)
            .field("experience", &self.experience)
            .field("uid_strategy", &self.uid_strategy)
            .field("registration_limit", &self.registration_limit)
            .field("constraints", &self.constraints.is_some())
            .field("validate", &self.validate.is_some())
            .field("deploy_config", &self.deploy_config.is_some())
            .field("preview_message", &self.preview_message.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for constructing Specification instances.
#[must_use]
pub struct SpecificationBuilder {
    identifier: String,
    external_identifier: Option<String>,
    additional_identifiers: Vec<String>,
    external_name: Option<String>,
    surface: String,
    experience: Experience,
    uid_strategy: UidStrategy,
    registration_limit: Option<u32>,
    schema: SchemaNode,
    capabilities: Option<CapabilitiesFn>,
    constraints: Option<ConstraintFn>,
    validate: Option<ValidateFn>,
    deploy_config: Option<DeployConfigFn>,
    preview_message: Option<PreviewFn>,
}

impl SpecificationBuilder {
    /// Creates a new builder with the required identifier.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            external_identifier: None,
            additional_identifiers: Vec::new(),
            external_name: None,
            surface: "all".to_string(),
            experience: Experience::default(),
            uid_strategy: UidStrategy::default(),
            registration_limit: None,
            schema: SchemaNode::object(ObjectSchema::new()),
            capabilities: None,
            constraints: None,
            validate: None,
            deploy_config: None,
            preview_message: None,
        }
    }

    /// Sets the external identifier (default `<identifier>_external`).
    pub fn external_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.external_identifier = Some(identifier.into());
        self
    }

    /// Adds an alias.
    pub fn additional_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.additional_identifiers.push(identifier.into());
        self
    }

    /// Sets all additional identifiers.
    pub fn additional_identifiers<I, S>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.additional_identifiers = identifiers.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the human-facing name (default: the identifier).
    pub fn external_name(mut self, name: impl Into<String>) -> Self {
        self.external_name = Some(name.into());
        self
    }

    pub fn surface(mut self, surface: impl Into<String>) -> Self {
        self.surface = surface.into();
        self
    }

    pub fn experience(mut self, experience: Experience) -> Self {
        self.experience = experience;
        self
    }

    pub fn uid_strategy(mut self, strategy: UidStrategy) -> Self {
        self.uid_strategy = strategy;
        self
    }

    /// Overrides the registration limit derived from the experience.
    pub fn registration_limit(mut self, limit: u32) -> Self {
        self.registration_limit = Some(limit);
        self
    }

    pub fn schema(mut self, schema: SchemaNode) -> Self {
        self.schema = schema;
        self
    }

    /// Sets the capability derivation function.
    pub fn capabilities<F>(mut self, derive: F) -> Self
    where
        F: Fn(&Value) -> Capabilities + Send + Sync + 'static,
    {
        self.capabilities = Some(Arc::new(derive));
        self
    }

    /// Uses the same capabilities for every configuration.
    pub fn static_capabilities<I>(self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = Capability>,
    {
        let set: Capabilities = capabilities.into_iter().collect();
        self.capabilities(move |_| set.clone())
    }

    pub fn constraints<F>(mut self, check: F) -> Self
    where
        F: Fn(&Value, ConstraintMode) -> Result<(), Vec<ConstraintError>> + Send + Sync + 'static,
    {
        self.constraints = Some(Arc::new(check));
        self
    }

    pub fn validate<F>(mut self, validate: F) -> Self
    where
        F: for<'a> Fn(&'a Value, &'a Path) -> BoxFuture<'a, Result<(), TransformError>>
            + Send
            + Sync
            + 'static,
    {
        self.validate = Some(Arc::new(validate));
        self
    }

    pub fn deploy_config<F>(mut self, deploy: F) -> Self
    where
        F: for<'a> Fn(DeployContext<'a>) -> BoxFuture<'a, Result<Option<Value>, TransformError>>
            + Send
            + Sync
            + 'static,
    {
        self.deploy_config = Some(Arc::new(deploy));
        self
    }

    pub fn preview_message<F>(mut self, preview: F) -> Self
    where
        F: Fn(&Value, &PreviewContext<'_>) -> Vec<PreviewLink> + Send + Sync + 'static,
    {
        self.preview_message = Some(Arc::new(preview));
        self
    }

    /// Builds the specification.
    pub fn build(self) -> Specification {
        let external_identifier = self
            .external_identifier
            .unwrap_or_else(|| format!("{}_external", self.identifier));
        let registration_limit = self.registration_limit.unwrap_or(match self.experience {
            Experience::Configuration => CONFIGURATION_REGISTRATION_LIMIT,
            Experience::Extension | Experience::Deprecated => EXTENSION_REGISTRATION_LIMIT,
        });

        Specification {
            external_name: self
                .external_name
                .unwrap_or_else(|| self.identifier.clone()),
            identifier: self.identifier,
            external_identifier,
            additional_identifiers: self.additional_identifiers,
            surface: self.surface,
            experience: self.experience,
            uid_strategy: self.uid_strategy,
            registration_limit,
            schema: self.schema,
            capabilities: self
                .capabilities
                .unwrap_or_else(|| Arc::new(no_capabilities)),
            constraints: self.constraints,
            validate: self.validate,
            deploy_config: self.deploy_config,
            preview_message: self.preview_message,
        }
    }
}

fn no_capabilities(_: &Value) -> Capabilities {
    Capabilities::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_defaults() {
        let spec = Specification::builder("checkout_ui").build();
        assert_eq!(spec.external_identifier, "checkout_ui_external");
        assert_eq!(spec.external_name, "checkout_ui");
        assert_eq!(spec.surface, "all");
        assert_eq!(spec.experience, Experience::Extension);
        assert_eq!(spec.uid_strategy, UidStrategy::Uuid);
        assert_eq!(spec.registration_limit, EXTENSION_REGISTRATION_LIMIT);
        assert!(spec.capabilities_for(&json!({})).is_empty());
        assert!(spec.check_constraints(&json!({}), ConstraintMode::FailFast).is_ok());
        assert!(!spec.has_deploy_config());
        assert!(!spec.has_preview());
    }

    #[test]
    fn test_configuration_limit() {
        let spec = Specification::builder("app_home")
            .experience(Experience::Configuration)
            .build();
        assert_eq!(spec.registration_limit, CONFIGURATION_REGISTRATION_LIMIT);
        assert!(spec.is_configuration());

        let spec = Specification::builder("app_home")
            .experience(Experience::Configuration)
            .registration_limit(3)
            .build();
        assert_eq!(spec.registration_limit, 3);
    }

    #[test]
    fn test_aliases_skip_identifier_and_repeats() {
        let spec = Specification::builder("function")
            .external_identifier("function")
            .additional_identifiers(["product_discounts", "order_discounts", "product_discounts"])
            .build();
        assert_eq!(spec.aliases(), vec!["product_discounts", "order_discounts"]);
        assert!(spec.claims("function"));
        assert!(spec.claims("order_discounts"));
        assert!(!spec.claims("theme"));
    }

    #[test]
    fn test_static_capabilities() {
        let spec = Specification::builder("webhooks")
            .static_capabilities([Capability::AppConfig])
            .build();
        let caps = spec.capabilities_for(&json!({"anything": true}));
        assert!(caps.contains(&Capability::AppConfig));
        assert_eq!(caps.len(), 1);
    }

    #[test]
    fn test_capability_serde() {
        let json = serde_json::to_string(&Capability::SingleJsEntryPath).unwrap();
        assert_eq!(json, "\"single_js_entry_path\"");
        let parsed: UidStrategy = serde_json::from_str("\"dynamic\"").unwrap();
        assert_eq!(parsed, UidStrategy::Dynamic);
    }

    #[test]
    fn test_debug_hides_hooks() {
        let spec = Specification::builder("theme").build();
        let debug = format!("{:?}", spec);
        assert!(debug.contains("\"theme\""));
        assert!(debug.contains("validate: false"));
    }
}
