//! Loading raw configuration into extension instances.
//!
//! A load runs three stages and stops at the first failing one:
//!
//! 1. resolve the extension kind in the registry
//! 2. validate the configuration against the kind's schema
//! 3. run the kind's constraint hook
//!
//! No instance is produced unless every stage passes.

use std::path::PathBuf;

use serde_json::Value;

use crate::config::ValidationConfig;
use crate::error::ConfigurationError;
use crate::instance::ExtensionInstance;
use crate::registry::SpecificationRegistry;
use crate::walker::validate_value;

/// One configuration to load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    /// Identifier or alias of the extension kind.
    pub kind: String,
    /// The parsed configuration.
    pub configuration: Value,
    /// Directory the extension lives in.
    pub directory: PathBuf,
    /// File the configuration was read from.
    pub configuration_path: PathBuf,
}

impl LoadRequest {
    /// Creates a request; the configuration path defaults to the directory.
    pub fn new(
        kind: impl Into<String>,
        configuration: Value,
        directory: impl Into<PathBuf>,
    ) -> Self {
        let directory = directory.into();
        Self {
            kind: kind.into(),
            configuration,
            configuration_path: directory.clone(),
            directory,
        }
    }

    pub fn with_configuration_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.configuration_path = path.into();
        self
    }

    /// Creates a request from JSON text.
    pub fn from_json(
        kind: impl Into<String>,
        json: &str,
        directory: impl Into<PathBuf>,
    ) -> Result<Self, ConfigurationError> {
        let configuration: Value = serde_json::from_str(json)?;
        Ok(Self::new(kind, configuration, directory))
    }
}

/// Validates a configuration and binds it to its specification.
///
/// # Errors
/// - [`ConfigurationError::Lookup`] if the kind is not registered
/// - [`ConfigurationError::Structural`] with every schema violation (capped
///   by `config.max_structural_errors`)
/// - [`ConfigurationError::Constraint`] with the constraint violations
///   reported under `config.constraint_mode`
pub fn load_extension(
    registry: &SpecificationRegistry,
    request: LoadRequest,
    config: &ValidationConfig,
) -> Result<ExtensionInstance, ConfigurationError> {
    let specification = registry.resolve(&request.kind)?;
    tracing::debug!(
        kind = %request.kind,
        identifier = %specification.identifier,
        path = %request.configuration_path.display(),
        "loading extension configuration"
    );

    let configuration = validate_value(&specification.schema, &request.configuration)
        .map_err(|errors| {
            tracing::warn!(
                identifier = %specification.identifier,
                errors = errors.len(),
                "configuration failed schema validation"
            );
            ConfigurationError::Structural(config.truncate(errors))
        })?;

    specification
        .check_constraints(&configuration, config.constraint_mode)
        .map_err(|errors| {
            tracing::warn!(
                identifier = %specification.identifier,
                errors = errors.len(),
                mode = %config.constraint_mode,
                "configuration violates constraints"
            );
            ConfigurationError::Constraint(errors)
        })?;

    Ok(ExtensionInstance::new(
        specification,
        configuration,
        request.directory,
        request.configuration_path,
    ))
}

/// Loads every request, keeping each outcome.
pub fn load_all<I>(
    registry: &SpecificationRegistry,
    requests: I,
    config: &ValidationConfig,
) -> Vec<Result<ExtensionInstance, ConfigurationError>>
where
    I: IntoIterator<Item = LoadRequest>,
{
    requests
        .into_iter()
        .map(|request| load_extension(registry, request, config))
        .collect()
}
