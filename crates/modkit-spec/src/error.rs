//! Error types for schema validation, subscription constraints, registry
//! lookups and extension transforms.

use std::path::PathBuf;

use thiserror::Error;

use crate::path::FieldPath;

/// Kinds of shape mismatch reported by the schema walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructuralErrorKind {
    /// S001: Value has the wrong type for its schema node
    TypeMismatch,
    /// S002: Required field is absent
    MissingField,
    /// S003: Field is not declared by a strict object schema
    UnknownField,
    /// S004: A scalar refinement rejected the value
    RefinementFailed,
}

impl StructuralErrorKind {
    /// Returns the error code string (e.g., "S001").
    pub fn code(&self) -> &'static str {
        match self {
            StructuralErrorKind::TypeMismatch => "S001",
            StructuralErrorKind::MissingField => "S002",
            StructuralErrorKind::UnknownField => "S003",
            StructuralErrorKind::RefinementFailed => "S004",
        }
    }
}

impl std::fmt::Display for StructuralErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A shape mismatch at one location of a configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralError {
    /// What went wrong.
    pub kind: StructuralErrorKind,
    /// Human-readable error message.
    pub message: String,
    /// Location of the offending value.
    pub path: FieldPath,
}

impl StructuralError {
    /// Creates a new structural error.
    pub fn new(kind: StructuralErrorKind, message: impl Into<String>, path: FieldPath) -> Self {
        Self {
            kind,
            message: message.into(),
            path,
        }
    }
}

impl std::fmt::Display for StructuralError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} (at {})", self.kind, self.message, self.path)
    }
}

impl std::error::Error for StructuralError {}

/// Cross-record rule violations for subscription declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintErrorKind {
    /// C001: Only one half of a pubsub project/topic pair is set
    IncompletePubSubPair,
    /// C002: More than one destination form is set in one scope
    MultipleDestinations,
    /// C003: Top-level destination without any topic to deliver
    UnusedDestination,
    /// C004: Top-level topics without a top-level destination
    TopicsMissingDestination,
    /// C005: Record has no destination and no top-level default applies
    MissingDestination,
    /// C006: Relative path combined with a pubsub or ARN destination
    PathWithIncompatibleDestination,
    /// C007: Relative path without any endpoint URL in scope
    PathMissingEndpoint,
    /// C008: Two subscriptions share the same (topic, destination, path) key
    DuplicateSubscription,
}

impl ConstraintErrorKind {
    /// Returns the error code string (e.g., "C001").
    pub fn code(&self) -> &'static str {
        match self {
            ConstraintErrorKind::IncompletePubSubPair => "C001",
            ConstraintErrorKind::MultipleDestinations => "C002",
            ConstraintErrorKind::UnusedDestination => "C003",
            ConstraintErrorKind::TopicsMissingDestination => "C004",
            ConstraintErrorKind::MissingDestination => "C005",
            ConstraintErrorKind::PathWithIncompatibleDestination => "C006",
            ConstraintErrorKind::PathMissingEndpoint => "C007",
            ConstraintErrorKind::DuplicateSubscription => "C008",
        }
    }
}

impl std::fmt::Display for ConstraintErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Whether a constraint applies to document-level fields or one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintScope {
    TopLevel,
    Record,
}

impl ConstraintScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintScope::TopLevel => "top-level",
            ConstraintScope::Record => "record",
        }
    }
}

impl std::fmt::Display for ConstraintScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A cross-record rule violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintError {
    /// Which rule failed.
    pub kind: ConstraintErrorKind,
    /// Scope the rule was evaluated in.
    pub scope: ConstraintScope,
    /// Human-readable error message.
    pub message: String,
    /// Location of the offending value.
    pub path: FieldPath,
}

impl ConstraintError {
    /// Creates a new constraint error.
    pub fn new(
        kind: ConstraintErrorKind,
        scope: ConstraintScope,
        message: impl Into<String>,
        path: FieldPath,
    ) -> Self {
        Self {
            kind,
            scope,
            message: message.into(),
            path,
        }
    }

    /// Returns the same error located under `prefix`.
    pub fn prefixed(mut self, prefix: &FieldPath) -> Self {
        self.path = self.path.prefixed(prefix);
        self
    }
}

impl std::fmt::Display for ConstraintError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} [{}] (at {})",
            self.kind, self.message, self.scope, self.path
        )
    }
}

impl std::error::Error for ConstraintError {}

/// Specification registry lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// No specification declares this identifier or alias.
    #[error("no extension specification registered for '{0}'")]
    NotFound(String),

    /// Two specifications claim the same identifier or alias.
    #[error("identifier '{identifier}' is already claimed by specification '{existing}'")]
    DuplicateIdentifier {
        /// The colliding identifier.
        identifier: String,
        /// Canonical identifier of the specification that registered it first.
        existing: String,
    },
}

/// Failures raised by kind-specific transform hooks.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A file the configuration references does not exist.
    #[error("file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// Reading a file inside the extension directory failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A referenced path is absolute or climbs out of the extension directory.
    #[error("path leaves the extension directory: {0}")]
    PathOutsideDirectory(String),

    /// The configuration is valid against its schema but unusable for this transform.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Top-level error type for loading an extension configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The extension kind could not be resolved.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// The configuration does not match the specification's schema.
    #[error("configuration failed schema validation with {} error(s)", .0.len())]
    Structural(Vec<StructuralError>),

    /// The configuration violates a cross-record constraint.
    #[error("configuration violates {} constraint(s)", .0.len())]
    Constraint(Vec<ConstraintError>),

    /// JSON parse error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl ConfigurationError {
    /// Returns the structural errors, if this is a schema failure.
    pub fn structural_errors(&self) -> &[StructuralError] {
        match self {
            ConfigurationError::Structural(errors) => errors,
            _ => &[],
        }
    }

    /// Returns the constraint errors, if this is a constraint failure.
    pub fn constraint_errors(&self) -> &[ConstraintError] {
        match self {
            ConfigurationError::Constraint(errors) => errors,
            _ => &[],
        }
    }
}
