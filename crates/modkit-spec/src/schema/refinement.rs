//! Scalar refinements: data-described predicates with an error message.
//!
//! Refinements are data rather than closures so that plugin-supplied
//! manifests can carry them. A refinement that does not apply to the value's
//! type (e.g. `starts_with` on a number under an `any` scalar) passes.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A compiled regular expression that serializes as its source string.
#[derive(Clone)]
pub struct Pattern(Regex);

impl Pattern {
    /// Compiles a pattern.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Pattern)
    }

    /// Returns the pattern source.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns true if `text` matches.
    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.as_str()).finish()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Pattern::new(&source).map_err(serde::de::Error::custom)
    }
}

/// A predicate on a scalar value, with an optional custom message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Refinement {
    /// String must start with `prefix`.
    StartsWith {
        prefix: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// String must not end with `suffix`.
    NotEndsWith {
        suffix: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// String must match a regular expression.
    Pattern {
        pattern: Pattern,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// String must have at least `value` characters.
    MinLength {
        value: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// String must have at most `value` characters.
    MaxLength {
        value: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// String must be one of `values`.
    OneOf {
        values: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Number must be >= `value`.
    Minimum {
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Number must be <= `value`.
    Maximum {
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// String must contain a non-whitespace character.
    NonEmpty {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl Refinement {
    pub fn starts_with(prefix: impl Into<String>) -> Self {
        Refinement::StartsWith {
            prefix: prefix.into(),
            message: None,
        }
    }

    pub fn not_ends_with(suffix: impl Into<String>) -> Self {
        Refinement::NotEndsWith {
            suffix: suffix.into(),
            message: None,
        }
    }

    /// Builds a pattern refinement.
    ///
    /// # Panics
    /// Panics if `source` is not a valid regular expression. Intended for
    /// schemas written in code; manifests go through `Pattern::new`.
    pub fn pattern(source: &str) -> Self {
        Refinement::Pattern {
            pattern: Pattern::new(source).expect("invalid refinement pattern"),
            message: None,
        }
    }

    pub fn min_length(value: usize) -> Self {
        Refinement::MinLength {
            value,
            message: None,
        }
    }

    pub fn max_length(value: usize) -> Self {
        Refinement::MaxLength {
            value,
            message: None,
        }
    }

    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Refinement::OneOf {
            values: values.into_iter().map(Into::into).collect(),
            message: None,
        }
    }

    pub fn minimum(value: f64) -> Self {
        Refinement::Minimum {
            value,
            message: None,
        }
    }

    pub fn maximum(value: f64) -> Self {
        Refinement::Maximum {
            value,
            message: None,
        }
    }

    pub fn non_empty() -> Self {
        Refinement::NonEmpty { message: None }
    }

    /// Replaces the default failure message.
    pub fn with_message(mut self, text: impl Into<String>) -> Self {
        let slot = match &mut self {
            Refinement::StartsWith { message, .. }
            | Refinement::NotEndsWith { message, .. }
            | Refinement::Pattern { message, .. }
            | Refinement::MinLength { message, .. }
            | Refinement::MaxLength { message, .. }
            | Refinement::OneOf { message, .. }
            | Refinement::Minimum { message, .. }
            | Refinement::Maximum { message, .. }
            | Refinement::NonEmpty { message } => message,
        };
        *slot = Some(text.into());
        self
    }

    /// Checks `value`, returning the failure message on rejection.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        let passed = match (self, value) {
            (Refinement::StartsWith { prefix, .. }, Value::String(s)) => s.starts_with(prefix),
            (Refinement::NotEndsWith { suffix, .. }, Value::String(s)) => !s.ends_with(suffix),
            (Refinement::Pattern { pattern, .. }, Value::String(s)) => pattern.is_match(s),
            (Refinement::MinLength { value: min, .. }, Value::String(s)) => {
                s.chars().count() >= *min
            }
            (Refinement::MaxLength { value: max, .. }, Value::String(s)) => {
                s.chars().count() <= *max
            }
            (Refinement::OneOf { values, .. }, Value::String(s)) => values.contains(s),
            (Refinement::Minimum { value: min, .. }, Value::Number(n)) => {
                n.as_f64().map_or(false, |v| v >= *min)
            }
            (Refinement::Maximum { value: max, .. }, Value::Number(n)) => {
                n.as_f64().map_or(false, |v| v <= *max)
            }
            (Refinement::NonEmpty { .. }, Value::String(s)) => !s.trim().is_empty(),
            _ => true,
        };

        if passed {
            Ok(())
        } else {
            Err(self.message())
        }
    }

    /// Returns the message reported when this refinement fails.
    pub fn message(&self) -> String {
        match self {
            Refinement::StartsWith { prefix, message } => message
                .clone()
                .unwrap_or_else(|| format!("must start with {}", prefix)),
            Refinement::NotEndsWith { suffix, message } => message
                .clone()
                .unwrap_or_else(|| format!("must not end with {}", suffix)),
            Refinement::Pattern { pattern, message } => message
                .clone()
                .unwrap_or_else(|| format!("must match pattern {}", pattern.as_str())),
            Refinement::MinLength { value, message } => message
                .clone()
                .unwrap_or_else(|| format!("must be at least {} characters", value)),
            Refinement::MaxLength { value, message } => message
                .clone()
                .unwrap_or_else(|| format!("must be at most {} characters", value)),
            Refinement::OneOf { values, message } => message
                .clone()
                .unwrap_or_else(|| format!("must be one of: {}", values.join(", "))),
            Refinement::Minimum { value, message } => message
                .clone()
                .unwrap_or_else(|| format!("must be greater than or equal to {}", value)),
            Refinement::Maximum { value, message } => message
                .clone()
                .unwrap_or_else(|| format!("must be less than or equal to {}", value)),
            Refinement::NonEmpty { message } => message
                .clone()
                .unwrap_or_else(|| "must not be empty".to_string()),
        }
    }
}
