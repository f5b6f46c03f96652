//! Bidirectional value formatting.
//!
//! [`Formatter::format`] maps stored wire values to user-facing JSON:
//! physical (savedAs) keys back to declared names, hidden attributes
//! dropped, sets to arrays, numbers to JSON numbers, binary to base64
//! strings. [`Formatter::unformat`] is the inverse, and its per-attribute
//! conversion ([`literal_to_wire`]) is also what the compilers use to
//! pre-process condition and update literals, so a formatted value used as a
//! literal compiles exactly like the raw literal.
//!
//! `AnyOf` attributes try their candidates in declaration order; the first
//! structural match commits, with no backtracking.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Map as JsonMap, Value as Json};

use dynatable_model::{AttributeValue, Item};

use crate::error::FormatError;
use crate::schema::{Attribute, AttributeKind, MapAttributes, PrimitiveType, Schema};

/// Options controlling a format or unformat walk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// When set, missing required attributes are skipped instead of failing.
    pub partial: bool,
}

/// Walks the frozen schema tree to convert whole items in either direction.
///
/// Holds only a shared reference to the schema; formatters are cheap to
/// construct and independent of any compiler instance.
#[derive(Debug, Clone, Copy)]
pub struct Formatter<'s> {
    schema: &'s Schema,
}

impl<'s> Formatter<'s> {
    /// Creates a formatter over a frozen schema.
    #[must_use]
    pub fn new(schema: &'s Schema) -> Self {
        Self { schema }
    }

    /// Formats a stored item into its user-facing JSON object.
    ///
    /// # Errors
    ///
    /// Fails with [`FormatError::MissingAttribute`] when a required
    /// attribute is absent and `partial` is not set, and with
    /// [`FormatError::InvalidAttributeInput`] when a stored value does not
    /// match its declared shape.
    pub fn format(&self, item: &Item, options: FormatOptions) -> Result<Json, FormatError> {
        format_entries(&self.schema.root, item, options)
    }

    /// Converts a user-facing JSON object into a stored item keyed by
    /// physical names.
    ///
    /// # Errors
    ///
    /// Fails with [`FormatError::MissingAttribute`] when a required
    /// attribute is absent and `partial` is not set, and with
    /// [`FormatError::InvalidAttributeInput`] for values that do not match
    /// the schema (including undeclared keys on closed maps).
    pub fn unformat(&self, value: &Json, options: FormatOptions) -> Result<Item, FormatError> {
        let Json::Object(object) = value else {
            return Err(invalid("", "expected an object", value));
        };
        let wire = unformat_entries(&self.schema.root, object, "", options)?;
        Ok(wire.into_iter().collect())
    }
}

fn invalid(path: &str, message: &str, received: &Json) -> FormatError {
    FormatError::InvalidAttributeInput {
        path: path.to_owned(),
        message: message.to_owned(),
        received: received.clone(),
    }
}

fn invalid_wire(path: &str, message: &str, received: &AttributeValue) -> FormatError {
    FormatError::InvalidAttributeInput {
        path: path.to_owned(),
        message: message.to_owned(),
        received: serde_json::to_value(received).unwrap_or(Json::Null),
    }
}

// ---------------------------------------------------------------------------
// Stored -> user-facing
// ---------------------------------------------------------------------------

fn format_entries(
    children: &MapAttributes,
    stored: &BTreeMap<String, AttributeValue>,
    options: FormatOptions,
) -> Result<Json, FormatError> {
    let mut object = JsonMap::new();

    for attr in &children.entries {
        let raw = stored.get(attr.physical_name());
        match raw {
            None => {
                if attr.required.is_required() && !options.partial {
                    return Err(FormatError::MissingAttribute {
                        path: attr.path.clone(),
                    });
                }
            }
            Some(value) => {
                if !attr.hidden {
                    object.insert(attr.name.clone(), format_attribute(attr, value, options)?);
                }
            }
        }
    }

    if children.open {
        let declared: Vec<&str> = children.entries.iter().map(|a| a.physical_name()).collect();
        for (key, value) in stored {
            if !declared.contains(&key.as_str()) {
                object.insert(key.clone(), wire_to_json(value));
            }
        }
    }

    Ok(Json::Object(object))
}

/// Formats one stored value against its attribute.
pub(crate) fn format_attribute(
    attr: &Attribute,
    raw: &AttributeValue,
    options: FormatOptions,
) -> Result<Json, FormatError> {
    match &attr.kind {
        AttributeKind::Primitive(primitive) => primitive_to_json(*primitive, raw, &attr.path),
        AttributeKind::Set { element } => set_to_json(*element, raw, &attr.path),
        AttributeKind::List { element } => {
            let AttributeValue::L(items) = raw else {
                return Err(invalid_wire(&attr.path, "expected a list", raw));
            };
            let formatted: Result<Vec<Json>, FormatError> = items
                .iter()
                .map(|item| format_attribute(element, item, options))
                .collect();
            Ok(Json::Array(formatted?))
        }
        AttributeKind::Map(children) => {
            let AttributeValue::M(stored) = raw else {
                return Err(invalid_wire(&attr.path, "expected a map", raw));
            };
            format_entries(children, stored, options)
        }
        AttributeKind::Record { element, .. } => {
            let AttributeValue::M(stored) = raw else {
                return Err(invalid_wire(&attr.path, "expected a map", raw));
            };
            let mut object = JsonMap::new();
            for (key, value) in stored {
                object.insert(key.clone(), format_attribute(element, value, options)?);
            }
            Ok(Json::Object(object))
        }
        AttributeKind::AnyOf(candidates) => candidates
            .iter()
            .find_map(|candidate| format_attribute(candidate, raw, options).ok())
            .ok_or_else(|| invalid_wire(&attr.path, "no anyOf candidate matches", raw)),
        AttributeKind::Any => Ok(wire_to_json(raw)),
    }
}

fn primitive_to_json(
    primitive: PrimitiveType,
    raw: &AttributeValue,
    path: &str,
) -> Result<Json, FormatError> {
    match (primitive, raw) {
        (PrimitiveType::String, AttributeValue::S(s)) => Ok(Json::String(s.clone())),
        (PrimitiveType::Number, AttributeValue::N(n)) => number_to_json(n, path),
        (PrimitiveType::Boolean, AttributeValue::Bool(b)) => Ok(Json::Bool(*b)),
        (PrimitiveType::Binary, AttributeValue::B(b)) => Ok(Json::String(BASE64.encode(b))),
        _ => Err(invalid_wire(
            path,
            &format!("expected a {} value", primitive.label()),
            raw,
        )),
    }
}

fn number_to_json(encoded: &str, path: &str) -> Result<Json, FormatError> {
    if let Ok(int) = encoded.parse::<i64>() {
        return Ok(Json::Number(int.into()));
    }
    if let Ok(uint) = encoded.parse::<u64>() {
        return Ok(Json::Number(uint.into()));
    }
    encoded
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Json::Number)
        .ok_or_else(|| FormatError::InvalidAttributeInput {
            path: path.to_owned(),
            message: "stored number is not numeric".to_owned(),
            received: Json::String(encoded.to_owned()),
        })
}

fn set_to_json(
    element: PrimitiveType,
    raw: &AttributeValue,
    path: &str,
) -> Result<Json, FormatError> {
    match (element, raw) {
        (PrimitiveType::String, AttributeValue::Ss(items)) => Ok(Json::Array(
            items.iter().cloned().map(Json::String).collect(),
        )),
        (PrimitiveType::Number, AttributeValue::Ns(items)) => {
            let numbers: Result<Vec<Json>, FormatError> =
                items.iter().map(|n| number_to_json(n, path)).collect();
            Ok(Json::Array(numbers?))
        }
        (PrimitiveType::Binary, AttributeValue::Bs(items)) => Ok(Json::Array(
            items
                .iter()
                .map(|b| Json::String(BASE64.encode(b)))
                .collect(),
        )),
        _ => Err(invalid_wire(
            path,
            &format!("expected a set of {} elements", element.label()),
            raw,
        )),
    }
}

/// Generic wire-to-JSON conversion for untyped (`any`) values.
fn wire_to_json(value: &AttributeValue) -> Json {
    match value {
        AttributeValue::S(s) => Json::String(s.clone()),
        AttributeValue::N(n) => number_to_json(n, "").unwrap_or(Json::String(n.clone())),
        AttributeValue::B(b) => Json::String(BASE64.encode(b)),
        AttributeValue::Bool(b) => Json::Bool(*b),
        AttributeValue::Null(_) => Json::Null,
        AttributeValue::Ss(items) => {
            Json::Array(items.iter().cloned().map(Json::String).collect())
        }
        AttributeValue::Ns(items) => Json::Array(
            items
                .iter()
                .map(|n| number_to_json(n, "").unwrap_or(Json::String(n.clone())))
                .collect(),
        ),
        AttributeValue::Bs(items) => Json::Array(
            items
                .iter()
                .map(|b| Json::String(BASE64.encode(b)))
                .collect(),
        ),
        AttributeValue::L(items) => Json::Array(items.iter().map(wire_to_json).collect()),
        AttributeValue::M(entries) => Json::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), wire_to_json(v)))
                .collect(),
        ),
    }
}

// ---------------------------------------------------------------------------
// User-facing -> stored
// ---------------------------------------------------------------------------

fn unformat_entries(
    children: &MapAttributes,
    object: &JsonMap<String, Json>,
    path: &str,
    options: FormatOptions,
) -> Result<BTreeMap<String, AttributeValue>, FormatError> {
    let mut stored = BTreeMap::new();

    for attr in &children.entries {
        match object.get(&attr.name) {
            None => {
                if attr.required.is_required() && !options.partial {
                    return Err(FormatError::MissingAttribute {
                        path: attr.path.clone(),
                    });
                }
            }
            Some(value) => {
                stored.insert(
                    attr.physical_name().to_owned(),
                    literal_to_wire(attr, value, options)?,
                );
            }
        }
    }

    for (key, value) in object {
        if children.get(key).is_none() {
            if children.open {
                stored.insert(key.clone(), json_to_wire(value));
            } else {
                return Err(invalid(path, &format!("undeclared attribute '{key}'"), value));
            }
        }
    }

    Ok(stored)
}

/// Converts one user-facing literal to its wire value against an attribute.
///
/// This is the literal pre-processing step shared by the condition and
/// update compilers (which always convert with `partial` set).
pub(crate) fn literal_to_wire(
    attr: &Attribute,
    value: &Json,
    options: FormatOptions,
) -> Result<AttributeValue, FormatError> {
    match &attr.kind {
        AttributeKind::Primitive(primitive) => primitive_to_wire(*primitive, value, &attr.path),
        AttributeKind::Set { element } => set_to_wire(*element, value, &attr.path),
        AttributeKind::List { element } => {
            let Json::Array(items) = value else {
                return Err(invalid(&attr.path, "expected an array", value));
            };
            let converted: Result<Vec<AttributeValue>, FormatError> = items
                .iter()
                .map(|item| literal_to_wire(element, item, options))
                .collect();
            Ok(AttributeValue::L(converted?))
        }
        AttributeKind::Map(children) => {
            let Json::Object(object) = value else {
                return Err(invalid(&attr.path, "expected an object", value));
            };
            let stored = unformat_entries(children, object, &attr.path, options)?;
            Ok(AttributeValue::M(stored))
        }
        AttributeKind::Record { element, .. } => {
            let Json::Object(object) = value else {
                return Err(invalid(&attr.path, "expected an object", value));
            };
            let mut stored = BTreeMap::new();
            for (key, item) in object {
                stored.insert(key.clone(), literal_to_wire(element, item, options)?);
            }
            Ok(AttributeValue::M(stored))
        }
        AttributeKind::AnyOf(candidates) => candidates
            .iter()
            .find_map(|candidate| literal_to_wire(candidate, value, options).ok())
            .ok_or_else(|| invalid(&attr.path, "no anyOf candidate matches", value)),
        AttributeKind::Any => Ok(json_to_wire(value)),
    }
}

/// Converts one literal against a bare primitive type.
pub(crate) fn primitive_to_wire(
    primitive: PrimitiveType,
    value: &Json,
    path: &str,
) -> Result<AttributeValue, FormatError> {
    match (primitive, value) {
        (PrimitiveType::String, Json::String(s)) => Ok(AttributeValue::S(s.clone())),
        (PrimitiveType::Number, Json::Number(n)) => Ok(AttributeValue::N(n.to_string())),
        (PrimitiveType::Boolean, Json::Bool(b)) => Ok(AttributeValue::Bool(*b)),
        (PrimitiveType::Binary, Json::String(encoded)) => BASE64
            .decode(encoded)
            .map(|decoded| AttributeValue::B(bytes::Bytes::from(decoded)))
            .map_err(|_| invalid(path, "expected a base64 string", value)),
        _ => Err(invalid(
            path,
            &format!("expected a {} value", primitive.label()),
            value,
        )),
    }
}

fn set_to_wire(
    element: PrimitiveType,
    value: &Json,
    path: &str,
) -> Result<AttributeValue, FormatError> {
    let Json::Array(items) = value else {
        return Err(invalid(path, "expected an array of set elements", value));
    };

    match element {
        PrimitiveType::String => {
            let mut elements = Vec::new();
            for item in items {
                let Json::String(s) = item else {
                    return Err(invalid(path, "expected a string set element", item));
                };
                if !elements.contains(s) {
                    elements.push(s.clone());
                }
            }
            Ok(AttributeValue::Ss(elements))
        }
        PrimitiveType::Number => {
            let mut elements: Vec<String> = Vec::new();
            for item in items {
                let Json::Number(n) = item else {
                    return Err(invalid(path, "expected a number set element", item));
                };
                let encoded = n.to_string();
                if !elements.contains(&encoded) {
                    elements.push(encoded);
                }
            }
            Ok(AttributeValue::Ns(elements))
        }
        PrimitiveType::Binary => {
            let mut elements: Vec<bytes::Bytes> = Vec::new();
            for item in items {
                let Json::String(encoded) = item else {
                    return Err(invalid(path, "expected a base64 set element", item));
                };
                let decoded = BASE64
                    .decode(encoded)
                    .map_err(|_| invalid(path, "expected a base64 set element", item))?;
                let decoded = bytes::Bytes::from(decoded);
                if !elements.contains(&decoded) {
                    elements.push(decoded);
                }
            }
            Ok(AttributeValue::Bs(elements))
        }
        PrimitiveType::Boolean => Err(invalid(
            path,
            "boolean sets are not representable on the wire",
            value,
        )),
    }
}

/// Generic JSON-to-wire conversion for untyped (`any`) values.
fn json_to_wire(value: &Json) -> AttributeValue {
    match value {
        Json::Null => AttributeValue::Null(true),
        Json::Bool(b) => AttributeValue::Bool(*b),
        Json::Number(n) => AttributeValue::N(n.to_string()),
        Json::String(s) => AttributeValue::S(s.clone()),
        Json::Array(items) => AttributeValue::L(items.iter().map(json_to_wire).collect()),
        Json::Object(entries) => AttributeValue::M(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), json_to_wire(v)))
                .collect(),
        ),
    }
}
