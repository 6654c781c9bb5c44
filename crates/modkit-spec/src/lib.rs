//! modkit Extension Specification Library
//!
//! This crate lets independently defined extension kinds plug into a host
//! application through declarative specifications. A specification pairs a
//! schema for the kind's configuration with hooks that derive capabilities,
//! build deploy payloads and preview links, and enforce cross-record rules.
//!
//! # Overview
//!
//! Loading a configuration runs:
//!
//! - **Resolution**: the registry maps an identifier or alias to its specification
//! - **Schema validation**: the walker checks the value and reorders it to the schema
//! - **Constraints**: the specification's hook checks rules spanning many records
//! - **Binding**: the validated value becomes an [`ExtensionInstance`]
//!
//! # Example
//!
//! ```
//! use modkit_spec::kinds::default_registry;
//! use modkit_spec::{load_extension, LoadRequest, ValidationConfig};
//! use serde_json::json;
//!
//! let registry = default_registry().unwrap();
//! let request = LoadRequest::new(
//!     "webhooks",
//!     json!({"webhooks": {
//!         "api_version": "2024-01",
//!         "subscription_endpoint_url": "https://example.com/hooks",
//!         "topics": ["orders/create"]
//!     }}),
//!     ".",
//! );
//!
//! let instance = load_extension(&registry, request, &ValidationConfig::default()).unwrap();
//! assert_eq!(instance.uid(), "webhooks");
//! ```
//!
//! # Modules
//!
//! - [`schema`]: Schema nodes and refinements
//! - [`walker`]: Validation and reshaping against a schema
//! - [`constraint`]: Webhook subscription constraints
//! - [`rewrite`]: Schema-ordered configuration output
//! - [`specification`]: Specification type and builder
//! - [`registry`]: Identifier and alias lookup
//! - [`instance`]: Validated instances and transform dispatch
//! - [`loader`]: Configuration loading
//! - [`manifest`]: Specifications described as data
//! - [`kinds`]: Built-in extension kinds
//! - [`hash`]: Canonical hashing and uid derivation

pub mod config;
pub mod constraint;
pub mod error;
pub mod hash;
pub mod instance;
pub mod kinds;
pub mod loader;
pub mod manifest;
pub mod path;
pub mod registry;
pub mod rewrite;
pub mod schema;
pub mod specification;
pub mod walker;

// Re-export commonly used types at the crate root
pub use config::{ConstraintMode, ValidationConfig};
pub use error::{
    ConfigurationError, ConstraintError, ConstraintErrorKind, ConstraintScope, LookupError,
    StructuralError, StructuralErrorKind, TransformError,
};
pub use hash::{canonical_value_hash, canonicalize_json, derive_uid};
pub use instance::{validate_all, DeployPayload, ExtensionInstance};
pub use loader::{load_all, load_extension, LoadRequest};
pub use manifest::{validate_specification_manifest, ManifestValidationError, SpecificationManifest};
pub use path::{FieldPath, PathSegment};
pub use registry::SpecificationRegistry;
pub use rewrite::{rewrite, rewrite_to_string_pretty};
pub use schema::{ObjectSchema, Refinement, ScalarKind, SchemaNode, UnknownKeys};
pub use specification::{
    Capabilities, Capability, DeployContext, Experience, PreviewContext, PreviewLink,
    Specification, SpecificationBuilder, UidStrategy,
};
pub use walker::{reshape_value, validate_value};
