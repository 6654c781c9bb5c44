//! Validation configuration.
//!
//! Controls how much a load reports back to the caller:
//! - `constraint_mode`: stop at the first cross-record violation, or collect all
//! - `max_structural_errors`: optional cap on reported schema errors
//!
//! Pre-defined profiles: `default` (fail-fast), `collect_all`.

use serde::{Deserialize, Serialize};

/// How constraint validators report violations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintMode {
    /// Return only the first violation encountered.
    #[default]
    FailFast,
    /// Return every violation found in one pass.
    Collect,
}

impl ConstraintMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintMode::FailFast => "fail_fast",
            ConstraintMode::Collect => "collect",
        }
    }
}

impl std::fmt::Display for ConstraintMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settings applied when loading extension configurations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Reporting mode for cross-record constraints.
    pub constraint_mode: ConstraintMode,
    /// Maximum number of structural errors reported; `None` reports all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_structural_errors: Option<usize>,
}

impl ValidationConfig {
    /// Fail-fast constraints, every structural error.
    pub fn fail_fast() -> Self {
        Self::default()
    }

    /// Every violation of every kind.
    pub fn collect_all() -> Self {
        Self {
            constraint_mode: ConstraintMode::Collect,
            max_structural_errors: None,
        }
    }

    /// Returns a profile by name (`default`, `fail_fast`, `collect_all`).
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "default" | "fail_fast" => Some(Self::fail_fast()),
            "collect_all" => Some(Self::collect_all()),
            _ => None,
        }
    }

    /// Loads a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Caps `errors` at `max_structural_errors`.
    pub fn truncate<T>(&self, mut errors: Vec<T>) -> Vec<T> {
        if let Some(max) = self.max_structural_errors {
            errors.truncate(max.max(1));
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_fail_fast() {
        let config = ValidationConfig::default();
        assert_eq!(config.constraint_mode, ConstraintMode::FailFast);
        assert_eq!(config.max_structural_errors, None);
    }

    #[test]
    fn test_from_json_partial() {
        let config = ValidationConfig::from_json(r#"{"constraint_mode": "collect"}"#).unwrap();
        assert_eq!(config, ValidationConfig::collect_all());

        let config = ValidationConfig::from_json(r#"{"max_structural_errors": 2}"#).unwrap();
        assert_eq!(config.constraint_mode, ConstraintMode::FailFast);
        assert_eq!(config.max_structural_errors, Some(2));
    }

    #[test]
    fn test_by_name() {
        assert_eq!(
            ValidationConfig::by_name("collect_all"),
            Some(ValidationConfig::collect_all())
        );
        assert!(ValidationConfig::by_name("lenient").is_none());
    }

    #[test]
    fn test_truncate_keeps_at_least_one() {
        let config = ValidationConfig {
            max_structural_errors: Some(0),
            ..Default::default()
        };
        assert_eq!(config.truncate(vec![1, 2, 3]), vec![1]);
    }
}
