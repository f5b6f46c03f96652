//! Typed errors for schema freezing, path resolution, compilation, and
//! formatting.
//!
//! Every error carries a stable machine-readable code (see the `code`
//! methods)
//! alongside a human-readable message, the offending attribute path where one
//! applies, and the received value as a diagnostic payload. All errors are
//! synchronous; a failed compile call aborts immediately and is never
//! retried.

use serde_json::Value as Json;
use thiserror::Error;

/// Freeze-time schema validation errors. Fatal: the schema cannot be
/// constructed.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Two sibling attributes persist under the same physical name.
    #[error("duplicate savedAs name '{saved_as}' among attributes at '{path}'")]
    DuplicateSavedAs {
        /// Path of the enclosing map (empty for the root).
        path: String,
        /// The colliding physical name.
        saved_as: String,
    },
    /// A key attribute was declared with a required level other than
    /// `Always`. Key attributes are always required and immutable.
    #[error("key attribute '{path}' must be always-required")]
    OptionalKeyAttribute {
        /// Path of the offending attribute.
        path: String,
    },
}

impl SchemaError {
    /// Stable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateSavedAs { .. } => "schema.duplicateSavedAs",
            Self::OptionalKeyAttribute { .. } => "schema.optionalKeyAttribute",
        }
    }
}

/// Errors produced while resolving an attribute path string against a frozen
/// schema.
#[derive(Debug, Error)]
pub enum PathError {
    /// An identifier did not match any attribute at its depth.
    #[error("no attribute matches '{identifier}' in path '{path}'")]
    PathNotFound {
        /// The full path string being resolved.
        path: String,
        /// The identifier that failed to match.
        identifier: String,
    },
    /// The path string is not valid under the path grammar.
    #[error("invalid path syntax in '{path}': {message}")]
    InvalidPathSyntax {
        /// The full path string being resolved.
        path: String,
        /// What was malformed.
        message: String,
    },
    /// A bracket index was applied to an attribute that is not a list.
    #[error("unexpected index in path '{path}': '{identifier}' is not a list")]
    UnexpectedIndexing {
        /// The full path string being resolved.
        path: String,
        /// The identifier of the non-list attribute.
        identifier: String,
    },
}

impl PathError {
    /// Stable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::PathNotFound { .. } => "path.notFound",
            Self::InvalidPathSyntax { .. } => "path.invalidSyntax",
            Self::UnexpectedIndexing { .. } => "path.unexpectedIndexing",
        }
    }
}

/// Errors produced while formatting stored values or converting user-facing
/// literals to wire values.
#[derive(Debug, Error)]
pub enum FormatError {
    /// A required attribute was absent and the `partial` option was not set.
    #[error("missing required attribute '{path}'")]
    MissingAttribute {
        /// Path of the missing attribute.
        path: String,
    },
    /// A value did not match the attribute's declared shape.
    #[error("invalid value for attribute '{path}': {message}")]
    InvalidAttributeInput {
        /// Path of the offending attribute.
        path: String,
        /// What was wrong with the value.
        message: String,
        /// The received value.
        received: Json,
    },
}

impl FormatError {
    /// Stable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingAttribute { .. } => "format.missingAttribute",
            Self::InvalidAttributeInput { .. } => "parsing.invalidAttributeInput",
        }
    }
}

/// Errors produced by the condition and update compilers.
///
/// A failed compile leaves the compiler's alias counters where the partial
/// work advanced them; numbering is at-least-once, never rolled back.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A condition or update referenced a path that does not resolve.
    #[error("unknown attribute '{path}': {source}")]
    UnknownAttribute {
        /// The path string that failed to resolve.
        path: String,
        /// The underlying resolution failure.
        #[source]
        source: PathError,
    },
    /// The operator is not valid for the resolved attribute's type.
    #[error("operator '{operator}' is not supported by {attribute_type} attribute '{path}'")]
    IncompatibleOperator {
        /// Path of the subject attribute.
        path: String,
        /// The rejected operator.
        operator: String,
        /// The attribute's type label.
        attribute_type: &'static str,
    },
    /// A condition node is structurally invalid for its variant.
    #[error("invalid condition: {message}")]
    InvalidConditionShape {
        /// What was malformed.
        message: String,
    },
    /// An update extension received input of the wrong arity or shape.
    #[error("invalid input for attribute '{path}': {message}")]
    InvalidAttributeInput {
        /// Path of the target attribute.
        path: String,
        /// What was wrong with the input.
        message: String,
        /// The received value.
        received: Json,
    },
    /// An update operation was applied to an attribute type that does not
    /// support it.
    #[error("operation '{operation}' is not supported by {attribute_type} attribute '{path}'")]
    UnsupportedOperation {
        /// Path of the target attribute.
        path: String,
        /// The rejected operation.
        operation: String,
        /// The attribute's type label.
        attribute_type: &'static str,
    },
    /// A literal failed conversion to its wire value.
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl CompileError {
    /// Stable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownAttribute { .. } => "compile.unknownAttribute",
            Self::IncompatibleOperator { .. } => "compile.incompatibleOperator",
            Self::InvalidConditionShape { .. } => "compile.invalidConditionShape",
            Self::InvalidAttributeInput { .. } => "parsing.invalidAttributeInput",
            Self::UnsupportedOperation { .. } => "compile.unsupportedOperation",
            Self::Format(e) => e.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_expose_stable_codes() {
        let err = PathError::PathNotFound {
            path: "a.b".to_owned(),
            identifier: "b".to_owned(),
        };
        assert_eq!(err.code(), "path.notFound");

        let err = CompileError::UnknownAttribute {
            path: "a.b".to_owned(),
            source: err,
        };
        assert_eq!(err.code(), "compile.unknownAttribute");
    }

    #[test]
    fn test_should_share_invalid_input_code_across_concerns() {
        let fmt = FormatError::InvalidAttributeInput {
            path: "n".to_owned(),
            message: "expected number".to_owned(),
            received: Json::Bool(true),
        };
        let compile = CompileError::from(fmt);
        assert_eq!(compile.code(), "parsing.invalidAttributeInput");
    }
}
