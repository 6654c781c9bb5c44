//! Built-in extension kinds.
//!
//! | Identifier     | Experience    | Uid     | Notes                                  |
//! |----------------|---------------|---------|----------------------------------------|
//! | `webhooks`     | configuration | single  | subscription constraints               |
//! | `app_home`     | configuration | single  |                                        |
//! | `function`     | extension     | uuid    | aliases per function API family        |
//! | `ui_extension` | extension     | uuid    | previews, bundled modules              |
//! | `theme`        | extension     | uuid    | external identifier `theme_app_extension` |

mod app_home;
mod function;
mod theme;
mod ui_extension;
mod webhooks;

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use serde_json::Value;

use crate::error::{LookupError, TransformError};
use crate::registry::SpecificationRegistry;
use crate::specification::Specification;

pub use webhooks::{remote_webhooks_config, webhooks_section_constraints};

pub(crate) use crate::walker::str_at;

/// Returns every built-in specification in registration order.
pub fn builtin_specifications() -> Vec<Specification> {
    vec![
        webhooks::specification(),
        app_home::specification(),
        function::specification(),
        ui_extension::specification(),
        theme::specification(),
    ]
}

/// Builds a registry holding the built-in specifications.
///
/// # Example
/// ```
/// use modkit_spec::kinds::default_registry;
///
/// let registry = default_registry().unwrap();
/// assert!(registry.resolve("theme_app_extension").is_ok());
/// assert!(registry.resolve("product_discounts").is_ok());
/// ```
pub fn default_registry() -> Result<SpecificationRegistry, LookupError> {
    SpecificationRegistry::from_specifications(builtin_specifications())
}

/// Returns true if `relative` is absolute, has a drive prefix or climbs
/// with `..`, on either separator.
fn leaves_directory(relative: &str) -> bool {
    relative.starts_with(['/', '\\'])
        || relative.as_bytes().get(1) == Some(&b':')
        || relative.split(['/', '\\']).any(|segment| segment == "..")
        || Path::new(relative).components().any(|component| {
            matches!(
                component,
                Component::RootDir | Component::Prefix(_) | Component::ParentDir
            )
        })
}

/// Joins `relative` onto `directory`, rejecting paths that leave it.
fn resolve_inside(directory: &Path, relative: &str) -> Result<PathBuf, TransformError> {
    if leaves_directory(relative) {
        return Err(TransformError::PathOutsideDirectory(relative.to_string()));
    }
    Ok(directory.join(relative))
}

/// Returns `directory/relative` if it is an existing file inside `directory`.
pub(crate) async fn existing_file(
    directory: &Path,
    relative: &str,
) -> Result<PathBuf, TransformError> {
    let path = resolve_inside(directory, relative)?;
    match tokio::fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => Ok(path),
        Ok(_) => Err(TransformError::MissingFile(path)),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(TransformError::MissingFile(path)),
        Err(source) => Err(TransformError::Io { path, source }),
    }
}

/// Reads `directory/relative` as text.
pub(crate) async fn read_file(directory: &Path, relative: &str) -> Result<String, TransformError> {
    let path = existing_file(directory, relative).await?;
    tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| TransformError::Io { path, source })
}

/// Objects of the array under `key`.
pub(crate) fn object_items<'a>(value: &'a Value, key: &str) -> Vec<&'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter(|item| item.is_object()).collect())
        .unwrap_or_default()
}
