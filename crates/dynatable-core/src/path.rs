//! Attribute path lexing and schema resolution.
//!
//! The path grammar is `identifier(\.identifier|\[nonNegativeInteger\])*`.
//! The root identifier must match a declared top-level attribute's own name
//! (never its savedAs); each dotted identifier must match a map child's
//! declared name; a bracket index is accepted only on list attributes and is
//! not range-checked. Record attributes accept any identifier (resolving to
//! the record's element) and `any` attributes accept any further path.
//! Resolution is pure, stateless, and deterministic.

use crate::error::PathError;
use crate::schema::{Attribute, AttributeKind, Schema};

/// One resolved path segment: the attribute it landed on, trailing bracket
/// indexes, and the physical name to emit on the wire.
#[derive(Debug, Clone)]
pub struct ResolvedSegment<'s> {
    /// The frozen attribute this segment resolved to.
    pub attribute: &'s Attribute,
    /// The identifier as written in the path (declared name, or the dynamic
    /// key for record children).
    pub name: String,
    /// The physical name to emit: savedAs when declared, the identifier
    /// otherwise.
    pub saved_as: String,
    /// Bracket indexes attached to this segment, in order.
    pub indexes: Vec<usize>,
}

// ---------------------------------------------------------------------------
// Lexing
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
enum PathToken {
    Identifier(String),
    Index(usize),
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn lex(path: &str) -> Result<Vec<PathToken>, PathError> {
    let syntax_error = |message: &str| PathError::InvalidPathSyntax {
        path: path.to_owned(),
        message: message.to_owned(),
    };

    let mut tokens = Vec::new();
    let mut chars = path.chars().peekable();

    // The root element must be a bare identifier.
    let mut expect_identifier = true;

    while let Some(&c) = chars.peek() {
        if expect_identifier {
            if !is_identifier_start(c) {
                return Err(syntax_error(&format!("expected identifier, found '{c}'")));
            }
            let mut identifier = String::new();
            while let Some(&c) = chars.peek() {
                if !is_identifier_char(c) {
                    break;
                }
                identifier.push(c);
                chars.next();
            }
            tokens.push(PathToken::Identifier(identifier));
            expect_identifier = false;
        } else if c == '.' {
            chars.next();
            expect_identifier = true;
        } else if c == '[' {
            chars.next();
            let mut digits = String::new();
            while let Some(&d) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                digits.push(d);
                chars.next();
            }
            if digits.is_empty() {
                return Err(syntax_error("expected a non-negative integer index"));
            }
            if chars.next() != Some(']') {
                return Err(syntax_error("unclosed bracket index"));
            }
            let index = digits
                .parse::<usize>()
                .map_err(|_| syntax_error("index out of range"))?;
            tokens.push(PathToken::Index(index));
        } else {
            return Err(syntax_error(&format!("unexpected character '{c}'")));
        }
    }

    if expect_identifier {
        return Err(syntax_error("expected identifier"));
    }

    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolves a path string against a frozen schema into typed segments.
///
/// # Errors
///
/// Returns [`PathError::InvalidPathSyntax`] for malformed tokens,
/// [`PathError::PathNotFound`] when an identifier is unmatched at its depth,
/// and [`PathError::UnexpectedIndexing`] when a bracket index lands on a
/// non-list attribute.
pub fn resolve_path<'s>(
    schema: &'s Schema,
    path: &str,
) -> Result<Vec<ResolvedSegment<'s>>, PathError> {
    let tokens = lex(path)?;
    let mut segments: Vec<ResolvedSegment<'s>> = Vec::new();
    // The attribute a bracket index or dotted identifier applies to next.
    let mut current: Option<&'s Attribute> = None;

    for token in tokens {
        match token {
            PathToken::Identifier(identifier) => {
                let resolved = match current {
                    None => schema
                        .root
                        .get(&identifier)
                        .map(|attr| (attr, attr.physical_name().to_owned())),
                    Some(attr) => child_of(attr, &identifier),
                };
                let Some((attribute, saved_as)) = resolved else {
                    return Err(PathError::PathNotFound {
                        path: path.to_owned(),
                        identifier,
                    });
                };
                segments.push(ResolvedSegment {
                    attribute,
                    name: identifier,
                    saved_as,
                    indexes: Vec::new(),
                });
                current = Some(attribute);
            }
            PathToken::Index(index) => {
                let attr = current.unwrap_or_else(|| unreachable!("lexer rejects a leading index"));
                let Some(element) = element_of(attr) else {
                    return Err(PathError::UnexpectedIndexing {
                        path: path.to_owned(),
                        identifier: segments
                            .last()
                            .map(|s| s.name.clone())
                            .unwrap_or_default(),
                    });
                };
                segments
                    .last_mut()
                    .unwrap_or_else(|| unreachable!("an identifier precedes every index"))
                    .indexes
                    .push(index);
                current = Some(element);
            }
        }
    }

    Ok(segments)
}

/// Looks up the child an identifier resolves to under an attribute, with the
/// physical name to emit.
fn child_of<'s>(attr: &'s Attribute, identifier: &str) -> Option<(&'s Attribute, String)> {
    match &attr.kind {
        AttributeKind::Map(children) => children
            .get(identifier)
            .map(|child| (child, child.physical_name().to_owned())),
        // Record keys are dynamic: the identifier itself is the physical name.
        AttributeKind::Record { element, .. } => Some((element, identifier.to_owned())),
        AttributeKind::Any => Some((attr, identifier.to_owned())),
        AttributeKind::AnyOf(candidates) => candidates
            .iter()
            .find_map(|candidate| child_of(candidate, identifier)),
        _ => None,
    }
}

/// Looks up the element a bracket index resolves to under an attribute.
fn element_of(attr: &Attribute) -> Option<&Attribute> {
    match &attr.kind {
        AttributeKind::List { element } => Some(element),
        AttributeKind::Any => Some(attr),
        AttributeKind::AnyOf(candidates) => candidates.iter().find_map(element_of),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::builder::{any, list, map, number, record, string};
    use crate::schema::PrimitiveType;

    fn test_schema() -> Schema {
        Schema::freeze(
            "Entity",
            vec![
                ("num".to_owned(), number()),
                ("renamed".to_owned(), string().saved_as("_r")),
                (
                    "deep".to_owned(),
                    map(vec![("nested", map(vec![("leaf", number())]))]),
                ),
                ("matrix".to_owned(), list(list(number()))),
                (
                    "rows".to_owned(),
                    list(map(vec![("value", number())])),
                ),
                ("tags".to_owned(), record(PrimitiveType::String, number())),
                ("blob".to_owned(), any()),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_should_resolve_top_level_attribute() {
        let schema = test_schema();
        let segments = resolve_path(&schema, "num").unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].saved_as, "num");
        assert!(segments[0].indexes.is_empty());
    }

    #[test]
    fn test_should_resolve_saved_as_physical_name() {
        let schema = test_schema();
        let segments = resolve_path(&schema, "renamed").unwrap();
        assert_eq!(segments[0].saved_as, "_r");
    }

    #[test]
    fn test_should_not_match_root_by_saved_as() {
        let schema = test_schema();
        let err = resolve_path(&schema, "_r").unwrap_err();
        assert!(matches!(err, PathError::PathNotFound { identifier, .. } if identifier == "_r"));
    }

    #[test]
    fn test_should_resolve_nested_map_path() {
        let schema = test_schema();
        let segments = resolve_path(&schema, "deep.nested.leaf").unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[2].attribute.path, "deep.nested.leaf");
    }

    #[test]
    fn test_should_attach_consecutive_indexes_to_one_segment() {
        let schema = test_schema();
        let segments = resolve_path(&schema, "matrix[1][2]").unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].indexes, vec![1, 2]);
    }

    #[test]
    fn test_should_resolve_through_list_elements() {
        let schema = test_schema();
        let segments = resolve_path(&schema, "rows[3].value").unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].indexes, vec![3]);
        assert_eq!(segments[1].saved_as, "value");
    }

    #[test]
    fn test_should_resolve_record_dynamic_keys() {
        let schema = test_schema();
        let segments = resolve_path(&schema, "tags.anything").unwrap();
        assert_eq!(segments[1].saved_as, "anything");
    }

    #[test]
    fn test_should_resolve_free_paths_under_any() {
        let schema = test_schema();
        let segments = resolve_path(&schema, "blob.free[0].form").unwrap();
        assert_eq!(segments.len(), 3);
    }

    #[test]
    fn test_should_fail_unknown_identifier_at_depth() {
        let schema = test_schema();
        let err = resolve_path(&schema, "deep.missing").unwrap_err();
        assert!(
            matches!(err, PathError::PathNotFound { identifier, .. } if identifier == "missing")
        );
    }

    #[test]
    fn test_should_reject_index_on_non_list() {
        let schema = test_schema();
        let err = resolve_path(&schema, "num[0]").unwrap_err();
        assert_eq!(err.code(), "path.unexpectedIndexing");
    }

    #[test]
    fn test_should_reject_malformed_syntax() {
        let schema = test_schema();
        for bad in ["", ".num", "num.", "num[", "num[]", "num[a]", "num[0", "1num"] {
            let err = resolve_path(&schema, bad).unwrap_err();
            assert_eq!(err.code(), "path.invalidSyntax", "path: {bad:?}");
        }
    }
}
