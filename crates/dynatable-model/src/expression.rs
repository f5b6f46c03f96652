//! Structured expression output consumed as request parameters.
//!
//! A compiler produces these fragments; a request builder copies them into
//! the wire request without further interpretation. Placeholder syntax is
//! fixed: name aliases are `#c_<n>`, value aliases `:c_<n>`, `n` starting at
//! 1 per compiler instance.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::attribute_value::AttributeValue;

/// Compiled expression fragments for one request.
///
/// `expression_attribute_values` is always populated in compiler output,
/// even when empty, so callers can merge fragments without null checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpressionParams {
    /// Compiled condition (filter) expression, if a condition was compiled.
    #[serde(rename = "ConditionExpression", skip_serializing_if = "Option::is_none")]
    pub condition_expression: Option<String>,
    /// Compiled update clauses, if an update was compiled.
    #[serde(rename = "UpdateExpression", skip_serializing_if = "Option::is_none")]
    pub update_expression: Option<UpdateExpressionClauses>,
    /// Name alias table: `#c_<n>` to physical attribute name.
    #[serde(rename = "ExpressionAttributeNames")]
    pub expression_attribute_names: BTreeMap<String, String>,
    /// Value alias table: `:c_<n>` to wire value.
    #[serde(rename = "ExpressionAttributeValues")]
    pub expression_attribute_values: BTreeMap<String, AttributeValue>,
}

/// The four update expression clauses, each already rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateExpressionClauses {
    /// `SET` actions, comma-joined, without the leading keyword.
    #[serde(rename = "Set", skip_serializing_if = "Option::is_none")]
    pub set: Option<String>,
    /// `REMOVE` paths, comma-joined.
    #[serde(rename = "Remove", skip_serializing_if = "Option::is_none")]
    pub remove: Option<String>,
    /// `ADD` actions, comma-joined.
    #[serde(rename = "Add", skip_serializing_if = "Option::is_none")]
    pub add: Option<String>,
    /// `DELETE` actions, comma-joined.
    #[serde(rename = "Delete", skip_serializing_if = "Option::is_none")]
    pub delete: Option<String>,
}

impl UpdateExpressionClauses {
    /// Returns `true` when no clause holds any action.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_none() && self.remove.is_none() && self.add.is_none() && self.delete.is_none()
    }

    /// Renders the full `UpdateExpression` string with clause keywords.
    #[must_use]
    pub fn render(&self) -> String {
        let mut parts = Vec::new();
        if let Some(set) = &self.set {
            parts.push(format!("SET {set}"));
        }
        if let Some(remove) = &self.remove {
            parts.push(format!("REMOVE {remove}"));
        }
        if let Some(add) = &self.add {
            parts.push(format!("ADD {add}"));
        }
        if let Some(delete) = &self.delete {
            parts.push(format!("DELETE {delete}"));
        }
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_render_clauses_in_canonical_order() {
        let clauses = UpdateExpressionClauses {
            set: Some("#c_1 = :c_1".to_owned()),
            remove: Some("#c_2".to_owned()),
            add: None,
            delete: Some("#c_3 :c_2".to_owned()),
        };
        assert_eq!(
            clauses.render(),
            "SET #c_1 = :c_1 REMOVE #c_2 DELETE #c_3 :c_2"
        );
    }

    #[test]
    fn test_should_report_empty_clauses() {
        assert!(UpdateExpressionClauses::default().is_empty());
    }

    #[test]
    fn test_should_serialize_values_map_even_when_empty() {
        let params = ExpressionParams {
            condition_expression: Some("attribute_exists(#c_1)".to_owned()),
            ..ExpressionParams::default()
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["ExpressionAttributeValues"], serde_json::json!({}));
    }
}
