//! Schema trees describing valid configuration shapes.
//!
//! A [`SchemaNode`] is a closed sum type, so the walker handles every node
//! kind with one exhaustive match. Children are owned, which keeps every
//! tree finite and acyclic.
//!
//! # Example
//!
//! ```
//! use modkit_spec::schema::{ObjectSchema, Refinement, SchemaNode};
//!
//! let schema = SchemaNode::object(
//!     ObjectSchema::new()
//!         .field("topic", SchemaNode::string())
//!         .field(
//!             "uri",
//!             SchemaNode::string()
//!                 .refine(Refinement::starts_with("https://"))
//!                 .optional(),
//!         ),
//! );
//!
//! assert!(schema.as_object().unwrap().field_named("topic").unwrap().is_required());
//! ```

mod refinement;

use serde::{Deserialize, Serialize};

pub use refinement::{Pattern, Refinement};

/// Primitive value kinds a scalar node accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    String,
    /// Integral numbers only.
    Integer,
    /// Any JSON number.
    Number,
    Boolean,
    /// Any value, including objects and arrays, kept verbatim.
    Any,
}

impl ScalarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Integer => "integer",
            ScalarKind::Number => "number",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Any => "any",
        }
    }
}

impl std::fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Policy for object keys the schema does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownKeys {
    /// Drop undeclared keys silently.
    #[default]
    Strip,
    /// Keep undeclared keys after the declared ones, in input order.
    Passthrough,
    /// Reject undeclared keys.
    Strict,
}

/// A scalar node: a kind plus ordered refinements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarSchema {
    pub kind: ScalarKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub refinements: Vec<Refinement>,
}

/// One declared object field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub node: SchemaNode,
}

impl Field {
    /// A field is required unless its node is [`SchemaNode::Optional`].
    pub fn is_required(&self) -> bool {
        !matches!(self.node, SchemaNode::Optional { .. })
    }
}

/// An object node: fields in declaration order plus an unknown-key policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectSchema {
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub unknown_keys: UnknownKeys,
}

impl ObjectSchema {
    /// Creates an empty object schema that strips unknown keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field. Declaration order is the canonical output order.
    pub fn field(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        self.fields.push(Field {
            name: name.into(),
            node,
        });
        self
    }

    /// Rejects undeclared keys.
    pub fn strict(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Strict;
        self
    }

    /// Keeps undeclared keys.
    pub fn passthrough(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Passthrough;
        self
    }

    /// Looks up a declared field by name.
    pub fn field_named(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns true if `name` is declared.
    pub fn declares(&self, name: &str) -> bool {
        self.field_named(name).is_some()
    }
}

/// A node in a schema tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchemaNode {
    /// A primitive value with refinements.
    Scalar(ScalarSchema),
    /// The value may be absent (or null); otherwise it must match `inner`.
    Optional { inner: Box<SchemaNode> },
    /// The value may be null; otherwise it must match `inner`.
    Nullable { inner: Box<SchemaNode> },
    /// A sequence whose elements match `element`.
    Array { element: Box<SchemaNode> },
    /// A mapping with declared fields.
    Object(ObjectSchema),
}

impl SchemaNode {
    pub fn scalar(kind: ScalarKind) -> Self {
        SchemaNode::Scalar(ScalarSchema {
            kind,
            refinements: Vec::new(),
        })
    }

    pub fn string() -> Self {
        Self::scalar(ScalarKind::String)
    }

    pub fn integer() -> Self {
        Self::scalar(ScalarKind::Integer)
    }

    pub fn number() -> Self {
        Self::scalar(ScalarKind::Number)
    }

    pub fn boolean() -> Self {
        Self::scalar(ScalarKind::Boolean)
    }

    pub fn any() -> Self {
        Self::scalar(ScalarKind::Any)
    }

    pub fn array(element: SchemaNode) -> Self {
        SchemaNode::Array {
            element: Box::new(element),
        }
    }

    pub fn object(schema: ObjectSchema) -> Self {
        SchemaNode::Object(schema)
    }

    /// Wraps this node in [`SchemaNode::Optional`].
    pub fn optional(self) -> Self {
        SchemaNode::Optional {
            inner: Box::new(self),
        }
    }

    /// Wraps this node in [`SchemaNode::Nullable`].
    pub fn nullable(self) -> Self {
        SchemaNode::Nullable {
            inner: Box::new(self),
        }
    }

    /// Adds a refinement to the scalar at the core of this node.
    ///
    /// Optional and nullable wrappers are looked through. Refinements on
    /// arrays and objects are ignored.
    pub fn refine(mut self, refinement: Refinement) -> Self {
        match &mut self {
            SchemaNode::Scalar(scalar) => scalar.refinements.push(refinement),
            SchemaNode::Optional { inner } | SchemaNode::Nullable { inner } => {
                let node = std::mem::replace(inner.as_mut(), SchemaNode::any());
                **inner = node.refine(refinement);
            }
            SchemaNode::Array { .. } | SchemaNode::Object(_) => {}
        }
        self
    }

    /// Returns the node with optional/nullable wrappers removed.
    pub fn unwrapped(&self) -> &SchemaNode {
        match self {
            SchemaNode::Optional { inner } | SchemaNode::Nullable { inner } => inner.unwrapped(),
            other => other,
        }
    }

    /// Returns the object schema at the core of this node, if any.
    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match self.unwrapped() {
            SchemaNode::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Short type description used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            SchemaNode::Scalar(scalar) => scalar.kind.as_str(),
            SchemaNode::Optional { inner } | SchemaNode::Nullable { inner } => inner.describe(),
            SchemaNode::Array { .. } => "array",
            SchemaNode::Object(_) => "object",
        }
    }

    /// Parses a schema from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
