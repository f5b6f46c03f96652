//! The frozen attribute schema tree.
//!
//! A schema is authored with the builder values in [`builder`], then frozen
//! exactly once by [`Schema::freeze`] into an immutable, validated, indexed
//! tree. The frozen tree is shared read-only by any number of compiler and
//! formatter instances and is never mutated afterward.

pub mod builder;
mod freeze;

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde_json::Value as Json;

use dynatable_model::Item;

// ---------------------------------------------------------------------------
// Leaf vocabulary
// ---------------------------------------------------------------------------

/// Scalar type of a primitive attribute or set element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    /// UTF-8 string.
    String,
    /// Arbitrary-precision number (string-encoded on the wire).
    Number,
    /// Boolean.
    Boolean,
    /// Binary blob (base64-encoded at the user-facing boundary).
    Binary,
}

impl PrimitiveType {
    /// Human-readable type label used in error messages.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Binary => "binary",
        }
    }
}

/// How strongly an attribute is required to be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequiredLevel {
    /// Must be present in every representation of the item.
    Always,
    /// Must be present at least when the item is first written.
    #[default]
    AtLeastOnce,
    /// May be written once, never updated afterward.
    OnlyOnce,
    /// Optional.
    Never,
}

impl RequiredLevel {
    /// Returns `true` for levels that demand presence when formatting.
    #[must_use]
    pub fn is_required(self) -> bool {
        matches!(self, Self::Always | Self::AtLeastOnce)
    }
}

/// Default value for an attribute: a literal, or a generator invoked at
/// write time.
#[derive(Clone)]
pub enum DefaultValue {
    /// A fixed literal.
    Literal(Json),
    /// A generator producing a fresh value per invocation.
    Generator(Arc<dyn Fn() -> Json + Send + Sync>),
}

impl DefaultValue {
    /// Produces the default value.
    #[must_use]
    pub fn resolve(&self) -> Json {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Generator(generate) => generate(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Frozen attribute tree
// ---------------------------------------------------------------------------

/// One frozen attribute node: common options plus a typed variant.
#[derive(Debug, Clone)]
pub struct Attribute {
    /// Declared name (the name used in paths and user-facing values).
    pub name: String,
    /// Dotted path from the root, computed at freeze time.
    pub path: String,
    /// Required level.
    pub required: RequiredLevel,
    /// Hidden attributes are stored but dropped from formatted output.
    pub hidden: bool,
    /// Key attributes are always required and immutable.
    pub key: bool,
    /// Physical persisted name, when it differs from the declared name.
    pub saved_as: Option<String>,
    /// Default value, if declared.
    pub default: Option<DefaultValue>,
    /// The typed variant.
    pub kind: AttributeKind,
}

impl Attribute {
    /// The physical persisted name: `saved_as` when set, the declared name
    /// otherwise.
    #[must_use]
    pub fn physical_name(&self) -> &str {
        self.saved_as.as_deref().unwrap_or(&self.name)
    }

    /// Human-readable type label used in error messages.
    #[must_use]
    pub fn type_label(&self) -> &'static str {
        match &self.kind {
            AttributeKind::Primitive(p) => p.label(),
            AttributeKind::Set { .. } => "set",
            AttributeKind::List { .. } => "list",
            AttributeKind::Map(_) => "map",
            AttributeKind::Record { .. } => "record",
            AttributeKind::AnyOf(_) => "anyOf",
            AttributeKind::Any => "any",
        }
    }
}

/// The typed variant of an attribute. A closed sum: compilers and the
/// formatter match exhaustively over these shapes.
#[derive(Debug, Clone)]
pub enum AttributeKind {
    /// A scalar leaf.
    Primitive(PrimitiveType),
    /// An unordered collection of unique primitive elements.
    Set {
        /// Element scalar type.
        element: PrimitiveType,
    },
    /// An ordered collection of elements of one attribute shape.
    List {
        /// Element attribute.
        element: Box<Attribute>,
    },
    /// A closed (or explicitly open) mapping of declared names to attributes.
    Map(MapAttributes),
    /// A dynamic-key mapping: one key shape, one element shape.
    Record {
        /// Key scalar type (keys are strings on the wire).
        key: PrimitiveType,
        /// Element attribute.
        element: Box<Attribute>,
    },
    /// Ordered union of candidate shapes; the first structural match
    /// commits, with no backtracking.
    AnyOf(Vec<Attribute>),
    /// Untyped escape hatch: admits any value and any sub-path.
    Any,
}

/// Frozen children of a map attribute (or of the schema root), with the
/// freeze-time indexes.
#[derive(Debug, Clone, Default)]
pub struct MapAttributes {
    /// Children in declaration order.
    pub entries: Vec<Attribute>,
    /// Whether undeclared extra keys are permitted.
    pub open: bool,
    /// Names of key attributes among the children.
    pub key_attribute_names: BTreeSet<String>,
    /// Partition of child names by required level; disjoint and exhaustive.
    pub required_partition: RequiredPartition,
}

impl MapAttributes {
    /// Looks up a child by its declared name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.entries.iter().find(|attr| attr.name == name)
    }
}

/// Child names partitioned by required level.
#[derive(Debug, Clone, Default)]
pub struct RequiredPartition {
    /// Children required always.
    pub always: BTreeSet<String>,
    /// Children required at least once.
    pub at_least_once: BTreeSet<String>,
    /// Children writable only once.
    pub only_once: BTreeSet<String>,
    /// Optional children.
    pub never: BTreeSet<String>,
}

impl RequiredPartition {
    pub(crate) fn insert(&mut self, level: RequiredLevel, name: &str) {
        let set = match level {
            RequiredLevel::Always => &mut self.always,
            RequiredLevel::AtLeastOnce => &mut self.at_least_once,
            RequiredLevel::OnlyOnce => &mut self.only_once,
            RequiredLevel::Never => &mut self.never,
        };
        set.insert(name.to_owned());
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Hook computing derived key attributes from an item.
pub type KeyHook = Arc<dyn Fn(&Item) -> Item + Send + Sync>;

/// A frozen entity schema: the root attribute collection plus entity
/// metadata.
#[derive(Clone)]
pub struct Schema {
    /// Entity name.
    pub entity: String,
    /// Root attribute collection.
    pub root: MapAttributes,
    key_hook: Option<KeyHook>,
}

impl Schema {
    /// Attaches a key-computation hook to the frozen schema.
    #[must_use]
    pub fn with_key_hook(mut self, hook: KeyHook) -> Self {
        self.key_hook = Some(hook);
        self
    }

    /// Runs the key-computation hook against an item, if one is attached.
    #[must_use]
    pub fn compute_key(&self, item: &Item) -> Option<Item> {
        self.key_hook.as_ref().map(|hook| hook(item))
    }

    pub(crate) fn from_root(entity: String, root: MapAttributes) -> Self {
        Self {
            entity,
            root,
            key_hook: None,
        }
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("entity", &self.entity)
            .field("root", &self.root)
            .field("key_hook", &self.key_hook.as_ref().map(|_| ".."))
            .finish()
    }
}
