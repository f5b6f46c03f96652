//! The freeze pass: declaration values in, validated immutable tree out.
//!
//! Freezing computes attribute paths, checks savedAs uniqueness among
//! siblings, forces key attributes to `Always`-required, and builds the
//! per-map indexes (key names, required-level partition). Freeze failure is
//! fatal at construction time.

use std::collections::BTreeSet;

use tracing::debug;

use super::builder::{AttributeDef, DefKind};
use super::{Attribute, AttributeKind, MapAttributes, RequiredLevel, Schema};
use crate::error::SchemaError;

impl Schema {
    /// Validates and freezes a declaration set into an immutable schema.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] when two siblings share a physical name or
    /// a key attribute is declared with a weaker level than `Always`.
    pub fn freeze(
        entity: impl Into<String>,
        attributes: Vec<(String, AttributeDef)>,
    ) -> Result<Self, SchemaError> {
        let entity = entity.into();
        let root = freeze_entries(attributes, "", false)?;
        debug!(entity, attributes = root.entries.len(), "froze schema");
        Ok(Self::from_root(entity, root))
    }
}

/// Freezes the children of a map (or the root), building its indexes.
fn freeze_entries(
    entries: Vec<(String, AttributeDef)>,
    parent_path: &str,
    open: bool,
) -> Result<MapAttributes, SchemaError> {
    let mut frozen = MapAttributes {
        open,
        ..MapAttributes::default()
    };
    let mut seen_physical = BTreeSet::new();

    for (name, def) in entries {
        let path = join_path(parent_path, &name);
        let physical = def.saved_as.clone().unwrap_or_else(|| name.clone());
        if !seen_physical.insert(physical.clone()) {
            return Err(SchemaError::DuplicateSavedAs {
                path: parent_path.to_owned(),
                saved_as: physical,
            });
        }

        let attribute = freeze_attribute(name.clone(), def, path)?;
        if attribute.key {
            frozen.key_attribute_names.insert(name.clone());
        }
        frozen.required_partition.insert(attribute.required, &name);
        frozen.entries.push(attribute);
    }

    Ok(frozen)
}

/// Freezes one attribute declaration at its computed path.
fn freeze_attribute(name: String, def: AttributeDef, path: String) -> Result<Attribute, SchemaError> {
    let required = resolve_required(&def, &path)?;

    let kind = match def.kind {
        DefKind::Primitive(primitive) => AttributeKind::Primitive(primitive),
        DefKind::Set(element) => AttributeKind::Set { element },
        DefKind::List(element) => {
            let element_path = format!("{path}[*]");
            AttributeKind::List {
                element: Box::new(freeze_attribute("*".to_owned(), *element, element_path)?),
            }
        }
        DefKind::Map(entries) => AttributeKind::Map(freeze_entries(entries, &path, def.open)?),
        DefKind::Record { key, element } => {
            let element_path = format!("{path}.*");
            AttributeKind::Record {
                key,
                element: Box::new(freeze_attribute("*".to_owned(), *element, element_path)?),
            }
        }
        DefKind::AnyOf(candidates) => AttributeKind::AnyOf(
            candidates
                .into_iter()
                .map(|candidate| freeze_attribute(name.clone(), candidate, path.clone()))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        DefKind::Any => AttributeKind::Any,
    };

    Ok(Attribute {
        name,
        path,
        required,
        hidden: def.hidden,
        key: def.key,
        saved_as: def.saved_as,
        default: def.default,
        kind,
    })
}

/// Resolves the effective required level, forcing key attributes to
/// `Always`.
fn resolve_required(def: &AttributeDef, path: &str) -> Result<RequiredLevel, SchemaError> {
    if def.key {
        return match def.required {
            None | Some(RequiredLevel::Always) => Ok(RequiredLevel::Always),
            Some(_) => Err(SchemaError::OptionalKeyAttribute {
                path: path.to_owned(),
            }),
        };
    }
    Ok(def.required.unwrap_or_default())
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_owned()
    } else {
        format!("{parent}.{name}")
    }
}
