//! Attribute declaration builder.
//!
//! Builder values are plain declarations; nothing is validated until
//! [`Schema::freeze`](super::Schema::freeze) consumes them. The builder
//! mirrors the frozen tree variant for variant: `string()`, `number()`,
//! `boolean()`, `binary()`, `set()`, `list()`, `map()`, `record()`,
//! `any_of()`, `any()`.

use std::sync::Arc;

use serde_json::Value as Json;

use super::{DefaultValue, PrimitiveType, RequiredLevel};

/// An unfrozen attribute declaration.
#[derive(Debug, Clone)]
pub struct AttributeDef {
    pub(crate) kind: DefKind,
    pub(crate) required: Option<RequiredLevel>,
    pub(crate) hidden: bool,
    pub(crate) key: bool,
    pub(crate) saved_as: Option<String>,
    pub(crate) default: Option<DefaultValue>,
    pub(crate) open: bool,
}

#[derive(Debug, Clone)]
pub(crate) enum DefKind {
    Primitive(PrimitiveType),
    Set(PrimitiveType),
    List(Box<AttributeDef>),
    Map(Vec<(String, AttributeDef)>),
    Record {
        key: PrimitiveType,
        element: Box<AttributeDef>,
    },
    AnyOf(Vec<AttributeDef>),
    Any,
}

impl AttributeDef {
    fn new(kind: DefKind) -> Self {
        Self {
            kind,
            required: None,
            hidden: false,
            key: false,
            saved_as: None,
            default: None,
            open: false,
        }
    }

    /// Sets the required level explicitly.
    #[must_use]
    pub fn required(mut self, level: RequiredLevel) -> Self {
        self.required = Some(level);
        self
    }

    /// Marks the attribute optional (`RequiredLevel::Never`).
    #[must_use]
    pub fn optional(self) -> Self {
        self.required(RequiredLevel::Never)
    }

    /// Marks the attribute as part of the entity key. Key attributes are
    /// always required; declaring a weaker level is a freeze error.
    #[must_use]
    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    /// Hides the attribute from formatted output.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Persists the attribute under a different physical name.
    #[must_use]
    pub fn saved_as(mut self, name: impl Into<String>) -> Self {
        self.saved_as = Some(name.into());
        self
    }

    /// Declares a literal default value.
    #[must_use]
    pub fn default_value(mut self, value: Json) -> Self {
        self.default = Some(DefaultValue::Literal(value));
        self
    }

    /// Declares a generated default value.
    #[must_use]
    pub fn default_with(mut self, generate: impl Fn() -> Json + Send + Sync + 'static) -> Self {
        self.default = Some(DefaultValue::Generator(Arc::new(generate)));
        self
    }

    /// Permits undeclared extra keys (map attributes only).
    #[must_use]
    pub fn open(mut self) -> Self {
        self.open = true;
        self
    }
}

/// Declares a string attribute.
#[must_use]
pub fn string() -> AttributeDef {
    AttributeDef::new(DefKind::Primitive(PrimitiveType::String))
}

/// Declares a number attribute.
#[must_use]
pub fn number() -> AttributeDef {
    AttributeDef::new(DefKind::Primitive(PrimitiveType::Number))
}

/// Declares a boolean attribute.
#[must_use]
pub fn boolean() -> AttributeDef {
    AttributeDef::new(DefKind::Primitive(PrimitiveType::Boolean))
}

/// Declares a binary attribute.
#[must_use]
pub fn binary() -> AttributeDef {
    AttributeDef::new(DefKind::Primitive(PrimitiveType::Binary))
}

/// Declares a set attribute. Set elements are restricted to primitive
/// scalars by construction.
#[must_use]
pub fn set(element: PrimitiveType) -> AttributeDef {
    AttributeDef::new(DefKind::Set(element))
}

/// Declares a list attribute with an arbitrary element shape.
#[must_use]
pub fn list(element: AttributeDef) -> AttributeDef {
    AttributeDef::new(DefKind::List(Box::new(element)))
}

/// Declares a map attribute with named children in declaration order.
#[must_use]
pub fn map<N: Into<String>>(entries: impl IntoIterator<Item = (N, AttributeDef)>) -> AttributeDef {
    AttributeDef::new(DefKind::Map(
        entries
            .into_iter()
            .map(|(name, def)| (name.into(), def))
            .collect(),
    ))
}

/// Declares a record attribute: a dynamic-key mapping.
#[must_use]
pub fn record(key: PrimitiveType, element: AttributeDef) -> AttributeDef {
    AttributeDef::new(DefKind::Record {
        key,
        element: Box::new(element),
    })
}

/// Declares an ordered union of candidate shapes. Candidates are evaluated
/// in declaration order; the first structural match commits.
#[must_use]
pub fn any_of(candidates: impl IntoIterator<Item = AttributeDef>) -> AttributeDef {
    AttributeDef::new(DefKind::AnyOf(candidates.into_iter().collect()))
}

/// Declares an untyped attribute.
#[must_use]
pub fn any() -> AttributeDef {
    AttributeDef::new(DefKind::Any)
}
