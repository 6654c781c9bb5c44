//! Theme app extensions: Liquid blocks, snippets and assets.

use std::io::ErrorKind;
use std::path::Path;

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::error::TransformError;
use crate::schema::{ObjectSchema, Refinement, SchemaNode};
use crate::specification::{Experience, Specification, UidStrategy};

/// Directories a theme app extension may ship.
const THEME_DIRECTORIES: &[&str] = &["blocks", "snippets", "assets", "locales"];

pub(super) fn specification() -> Specification {
    Specification::builder("theme")
        .external_identifier("theme_app_extension")
        .external_name("Theme app extension")
        .surface("online_store")
        .experience(Experience::Extension)
        .uid_strategy(UidStrategy::Uuid)
        .schema(schema())
        .validate(validate)
        .build()
}

fn schema() -> SchemaNode {
    SchemaNode::object(
        ObjectSchema::new()
            .field("name", SchemaNode::string().refine(Refinement::non_empty()))
            .field("handle", SchemaNode::string().optional())
            .field("uid", SchemaNode::string().optional())
            .field("type", SchemaNode::string().optional()),
    )
}

async fn is_directory(path: &Path) -> Result<bool, TransformError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => Ok(metadata.is_dir()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(TransformError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn validate<'a>(
    _configuration: &'a Value,
    directory: &'a Path,
) -> BoxFuture<'a, Result<(), TransformError>> {
    Box::pin(async move {
        for name in THEME_DIRECTORIES {
            if is_directory(&directory.join(name)).await? {
                return Ok(());
            }
        }
        Err(TransformError::InvalidConfiguration(format!(
            "theme app extension must contain at least one of: {}",
            THEME_DIRECTORIES.join(", ")
        )))
    })
}
