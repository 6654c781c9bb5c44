//! Test harness utilities for loading configurations from real directories.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde_json::Value;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

use modkit_spec::kinds::default_registry;
use modkit_spec::{
    load_extension, ConfigurationError, ExtensionInstance, LoadRequest, SpecificationRegistry,
    ValidationConfig,
};

static TRACING: OnceLock<()> = OnceLock::new();

/// Installs a test-writer subscriber once per test binary.
///
/// The filter comes from `RUST_LOG`, defaulting to `warn`.
pub fn init_tracing() {
    TRACING.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Shared registry of built-in kinds.
pub fn registry() -> &'static SpecificationRegistry {
    static REGISTRY: OnceLock<SpecificationRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| default_registry().expect("built-in kinds must not collide"))
}

/// Loads `configuration` as `kind` with the default validation config.
pub fn load(kind: &str, configuration: Value) -> Result<ExtensionInstance, ConfigurationError> {
    init_tracing();
    load_extension(
        registry(),
        LoadRequest::new(kind, configuration, "."),
        &ValidationConfig::default(),
    )
}

/// A temporary extension directory.
pub struct ExtensionDir {
    dir: TempDir,
}

impl ExtensionDir {
    /// Creates an empty extension directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Returns the directory path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes a file, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, contents).expect("Failed to write file");
        path
    }

    /// Creates a subdirectory.
    pub fn mkdir(&self, relative: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(&path).expect("Failed to create directory");
        path
    }

    /// Loads `configuration` as `kind` from this directory.
    pub fn load(
        &self,
        kind: &str,
        configuration: Value,
    ) -> Result<ExtensionInstance, ConfigurationError> {
        init_tracing();
        let request = LoadRequest::new(kind, configuration, self.path())
            .with_configuration_path(self.path().join("modkit.extension.json"));
        load_extension(registry(), request, &ValidationConfig::default())
    }
}

impl Default for ExtensionDir {
    fn default() -> Self {
        Self::new()
    }
}
