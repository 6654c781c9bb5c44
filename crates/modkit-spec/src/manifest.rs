//! Declarative specification manifests.
//!
//! A manifest describes an extension kind as data: identifiers, metadata,
//! static capabilities and a schema. It lets kinds be added without code,
//! at the cost of hooks: manifests can only opt into the webhook
//! subscription constraints.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::kinds::webhooks_section_constraints;
use crate::schema::SchemaNode;
use crate::specification::{Capability, Experience, Specification, UidStrategy};

/// Regex pattern for valid identifiers and aliases.
/// Lowercase, starts with a letter, 2-64 characters of `[a-z0-9_]`.
const IDENTIFIER_PATTERN: &str = r"^[a-z][a-z0-9_]{1,63}$";

static IDENTIFIER_REGEX: OnceLock<Regex> = OnceLock::new();

fn identifier_regex() -> &'static Regex {
    IDENTIFIER_REGEX.get_or_init(|| Regex::new(IDENTIFIER_PATTERN).expect("invalid regex pattern"))
}

fn default_surface() -> String {
    "all".to_string()
}

/// Manifest describing an extension kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecificationManifest {
    /// Canonical identifier.
    pub identifier: String,
    /// Remote identifier (default `<identifier>_external`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_identifier: Option<String>,
    /// Further names resolving to this kind.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_identifiers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_name: Option<String>,
    #[serde(default = "default_surface")]
    pub surface: String,
    #[serde(default)]
    pub experience: Experience,
    #[serde(default)]
    pub uid_strategy: UidStrategy,
    /// Overrides the limit derived from the experience.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_limit: Option<u32>,
    /// Capabilities every configuration of this kind has.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<Capability>,
    /// Schema of a valid configuration. Must be an object schema.
    pub schema: SchemaNode,
    /// Checks the `webhooks` section with the subscription constraints.
    #[serde(default)]
    pub webhook_constraints: bool,
}

impl SpecificationManifest {
    /// Creates a manifest with default metadata.
    pub fn new(identifier: impl Into<String>, schema: SchemaNode) -> Self {
        Self {
            identifier: identifier.into(),
            external_identifier: None,
            additional_identifiers: Vec::new(),
            external_name: None,
            surface: default_surface(),
            experience: Experience::default(),
            uid_strategy: UidStrategy::default(),
            registration_limit: None,
            capabilities: Vec::new(),
            schema,
            webhook_constraints: false,
        }
    }

    /// Parses a manifest from JSON.
    ///
    /// Invalid `pattern` refinements are rejected here.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Converts the manifest into a specification.
    ///
    /// Call [`validate_specification_manifest`] first; this does not check.
    pub fn into_specification(self) -> Specification {
        let mut builder = Specification::builder(self.identifier)
            .additional_identifiers(self.additional_identifiers)
            .surface(self.surface)
            .experience(self.experience)
            .uid_strategy(self.uid_strategy)
            .schema(self.schema)
            .static_capabilities(self.capabilities);
        if let Some(external_identifier) = self.external_identifier {
            builder = builder.external_identifier(external_identifier);
        }
        if let Some(external_name) = self.external_name {
            builder = builder.external_name(external_name);
        }
        if let Some(limit) = self.registration_limit {
            builder = builder.registration_limit(limit);
        }
        if self.webhook_constraints {
            builder = builder.constraints(webhooks_section_constraints);
        }
        builder.build()
    }
}

/// Validation errors for specification manifests.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestValidationError {
    /// Identifier or alias is not a valid identifier.
    InvalidIdentifier(String),
    /// The same name is declared twice.
    DuplicateAlias(String),
    /// Surface is empty.
    EmptySurface,
    /// Registration limit is zero.
    ZeroRegistrationLimit,
    /// Schema root is not an object.
    NonObjectSchema(&'static str),
}

impl std::fmt::Display for ManifestValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIdentifier(name) => write!(f, "Invalid identifier: {}", name),
            Self::DuplicateAlias(name) => write!(f, "Identifier declared more than once: {}", name),
            Self::EmptySurface => write!(f, "Surface is empty"),
            Self::ZeroRegistrationLimit => write!(f, "Registration limit must be at least 1"),
            Self::NonObjectSchema(found) => {
                write!(f, "Schema root must be an object, found {}", found)
            }
        }
    }
}

impl std::error::Error for ManifestValidationError {}

/// Validates a specification manifest, reporting every problem.
pub fn validate_specification_manifest(
    manifest: &SpecificationManifest,
) -> Result<(), Vec<ManifestValidationError>> {
    let mut errors = Vec::new();

    // Identifier and every alias must be well-formed and distinct
    let mut seen: HashSet<&str> = HashSet::new();
    let names = std::iter::once(&manifest.identifier)
        .chain(&manifest.external_identifier)
        .chain(&manifest.additional_identifiers);
    for name in names {
        if !identifier_regex().is_match(name) {
            errors.push(ManifestValidationError::InvalidIdentifier(name.clone()));
        }
        if !seen.insert(name.as_str()) {
            errors.push(ManifestValidationError::DuplicateAlias(name.clone()));
        }
    }

    if manifest.surface.trim().is_empty() {
        errors.push(ManifestValidationError::EmptySurface);
    }

    if manifest.registration_limit == Some(0) {
        errors.push(ManifestValidationError::ZeroRegistrationLimit);
    }

    if manifest.schema.as_object().is_none() {
        errors.push(ManifestValidationError::NonObjectSchema(
            manifest.schema.describe(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
