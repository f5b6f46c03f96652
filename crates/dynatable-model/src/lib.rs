//! Wire-level types shared by the dynatable expression compiler and its
//! consumers.
//!
//! This crate defines the tagged-union [`AttributeValue`] used on the wire
//! (single-key JSON objects like `{"S": "hello"}`) and the structured
//! expression output ([`ExpressionParams`]) that the compiler produces and a
//! request builder consumes verbatim.

pub mod attribute_value;
pub mod expression;

pub use attribute_value::AttributeValue;
pub use expression::{ExpressionParams, UpdateExpressionClauses};

/// A stored item: top-level attribute names mapped to wire values.
pub type Item = std::collections::BTreeMap<String, AttributeValue>;
