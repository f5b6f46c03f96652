//! Condition tree compilation.
//!
//! Turns a caller-supplied [`Condition`] tree into a condition expression
//! string plus the accumulated placeholder maps. Literal values are always
//! replaced by value placeholders, never inlined, so reserved words and
//! hostile input can never leak into the expression text. Operator/type
//! compatibility is checked at compile time against the resolved attribute.

use std::fmt;

use serde_json::Value as Json;
use tracing::debug;

use dynatable_model::{AttributeValue, ExpressionParams};

use crate::compile::CompilationState;
use crate::error::CompileError;
use crate::format::{FormatOptions, literal_to_wire, primitive_to_wire};
use crate::path::resolve_path;
use crate::schema::{Attribute, AttributeKind, PrimitiveType, Schema};

// ---------------------------------------------------------------------------
// Condition tree
// ---------------------------------------------------------------------------

/// Comparison operators between a subject and a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    /// Equal (`=`).
    Eq,
    /// Not equal (`<>`).
    Ne,
    /// Less than (`<`).
    Lt,
    /// Less than or equal (`<=`).
    Lte,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal (`>=`).
    Gte,
}

impl ComparisonOperator {
    fn is_ordering(self) -> bool {
        !matches!(self, Self::Eq | Self::Ne)
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Ne => write!(f, "<>"),
            Self::Lt => write!(f, "<"),
            Self::Lte => write!(f, "<="),
            Self::Gt => write!(f, ">"),
            Self::Gte => write!(f, ">="),
        }
    }
}

/// The left-hand side of a comparison: an attribute path, or its size.
#[derive(Debug, Clone)]
pub enum ConditionSubject {
    /// An attribute path.
    Attr(String),
    /// `size(path)`, usable wherever a number is.
    Size(String),
}

/// The right-hand side of a comparison: a literal, another attribute path,
/// or the size of one.
#[derive(Debug, Clone)]
pub enum ConditionTarget {
    /// A literal, converted to a wire value against the subject's attribute.
    Value(Json),
    /// A reference to another attribute's path.
    Attr(String),
    /// `size(path)`.
    Size(String),
}

impl From<Json> for ConditionTarget {
    fn from(value: Json) -> Self {
        Self::Value(value)
    }
}

/// Wire type codes accepted by `attribute_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum AttributeTypeCode {
    S,
    Ss,
    N,
    Ns,
    B,
    Bs,
    Bool,
    Null,
    L,
    M,
}

impl AttributeTypeCode {
    /// The wire spelling of the type code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::S => "S",
            Self::Ss => "SS",
            Self::N => "N",
            Self::Ns => "NS",
            Self::B => "B",
            Self::Bs => "BS",
            Self::Bool => "BOOL",
            Self::Null => "NULL",
            Self::L => "L",
            Self::M => "M",
        }
    }
}

/// A caller-supplied condition tree. Transient and schema-independent; the
/// schema is only consulted at compile time.
#[derive(Debug, Clone)]
pub enum Condition {
    /// N-ary conjunction (n >= 1).
    And(Vec<Condition>),
    /// N-ary disjunction (n >= 1).
    Or(Vec<Condition>),
    /// Negation.
    Not(Box<Condition>),
    /// `subject op target`.
    Comparison {
        /// Left-hand side.
        subject: ConditionSubject,
        /// Operator.
        operator: ComparisonOperator,
        /// Right-hand side.
        target: ConditionTarget,
    },
    /// `subject BETWEEN low AND high` (bounds inclusive).
    Between {
        /// Value under test.
        subject: ConditionSubject,
        /// Lower bound.
        low: ConditionTarget,
        /// Upper bound.
        high: ConditionTarget,
    },
    /// `subject IN (v1, v2, ...)` over an ordered, non-empty literal list.
    In {
        /// Value under test.
        subject: ConditionSubject,
        /// Candidate literals.
        values: Vec<Json>,
    },
    /// `contains(path, value)`.
    Contains {
        /// Attribute path.
        attr: String,
        /// Element or substring literal.
        value: Json,
    },
    /// `begins_with(path, value)`.
    BeginsWith {
        /// Attribute path.
        attr: String,
        /// Prefix literal.
        value: Json,
    },
    /// `attribute_exists(path)` / `attribute_not_exists(path)`.
    Exists {
        /// Attribute path.
        attr: String,
        /// `true` for existence, `false` for absence.
        exists: bool,
    },
    /// `attribute_type(path, :type)`.
    TypeIs {
        /// Attribute path.
        attr: String,
        /// Expected wire type.
        type_code: AttributeTypeCode,
    },
}

impl Condition {
    /// `attribute_exists(path)`.
    #[must_use]
    pub fn exists(attr: impl Into<String>) -> Self {
        Self::Exists {
            attr: attr.into(),
            exists: true,
        }
    }

    /// `attribute_not_exists(path)`.
    #[must_use]
    pub fn not_exists(attr: impl Into<String>) -> Self {
        Self::Exists {
            attr: attr.into(),
            exists: false,
        }
    }

    /// Equality against a literal or reference target.
    #[must_use]
    pub fn eq(attr: impl Into<String>, target: impl Into<ConditionTarget>) -> Self {
        Self::comparison(attr, ComparisonOperator::Eq, target)
    }

    /// Comparison with an explicit operator.
    #[must_use]
    pub fn comparison(
        attr: impl Into<String>,
        operator: ComparisonOperator,
        target: impl Into<ConditionTarget>,
    ) -> Self {
        Self::Comparison {
            subject: ConditionSubject::Attr(attr.into()),
            operator,
            target: target.into(),
        }
    }

    /// Conjunction of the given conditions.
    #[must_use]
    pub fn and(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::And(conditions.into_iter().collect())
    }

    /// Disjunction of the given conditions.
    #[must_use]
    pub fn or(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::Or(conditions.into_iter().collect())
    }

    /// Negation.
    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }
}

// ---------------------------------------------------------------------------
// Compiler
// ---------------------------------------------------------------------------

/// Compiles condition trees against one frozen schema, accumulating aliases
/// across calls.
#[derive(Debug)]
pub struct ConditionCompiler<'s> {
    schema: &'s Schema,
    state: CompilationState,
}

const LITERAL_OPTIONS: FormatOptions = FormatOptions { partial: true };

impl<'s> ConditionCompiler<'s> {
    /// Creates a compiler with fresh alias counters.
    #[must_use]
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            state: CompilationState::new(),
        }
    }

    /// Compiles one condition tree. The returned placeholder maps hold
    /// everything accumulated on this instance so far; the values map is
    /// always present, even when empty.
    ///
    /// # Errors
    ///
    /// Fails with [`CompileError::UnknownAttribute`] when a path does not
    /// resolve, [`CompileError::IncompatibleOperator`] when an operator is
    /// not valid for the resolved attribute's type, and
    /// [`CompileError::InvalidConditionShape`] for structurally invalid
    /// nodes. A failed call does not roll back aliases its partial work
    /// allocated.
    pub fn compile(&mut self, condition: &Condition) -> Result<ExpressionParams, CompileError> {
        debug!(entity = %self.schema.entity, "compiling condition");
        let expression = self.compile_condition(condition)?;
        let (names, values) = self.state.export();
        Ok(ExpressionParams {
            condition_expression: Some(expression),
            update_expression: None,
            expression_attribute_names: names,
            expression_attribute_values: values,
        })
    }

    /// The accumulated alias state.
    #[must_use]
    pub fn state(&self) -> &CompilationState {
        &self.state
    }

    fn compile_condition(&mut self, condition: &Condition) -> Result<String, CompileError> {
        match condition {
            Condition::And(children) => self.compile_logical(children, "AND"),
            Condition::Or(children) => self.compile_logical(children, "OR"),
            Condition::Not(inner) => {
                let inner = self.compile_condition(inner)?;
                Ok(format!("NOT ({inner})"))
            }
            Condition::Comparison {
                subject,
                operator,
                target,
            } => {
                let (rendered, attribute, is_size) = self.compile_subject(subject)?;
                if operator.is_ordering() && !is_size && !supports_ordering(attribute) {
                    return Err(incompatible(attribute, &operator.to_string()));
                }
                let target = self.compile_target(target, attribute, is_size)?;
                Ok(format!("{rendered} {operator} {target}"))
            }
            Condition::Between { subject, low, high } => {
                let (rendered, attribute, is_size) = self.compile_subject(subject)?;
                if !is_size && !supports_ordering(attribute) {
                    return Err(incompatible(attribute, "between"));
                }
                let low = self.compile_target(low, attribute, is_size)?;
                let high = self.compile_target(high, attribute, is_size)?;
                Ok(format!("{rendered} BETWEEN {low} AND {high}"))
            }
            Condition::In { subject, values } => {
                if values.is_empty() {
                    return Err(CompileError::InvalidConditionShape {
                        message: "'in' requires at least one candidate value".to_owned(),
                    });
                }
                let (rendered, attribute, is_size) = self.compile_subject(subject)?;
                if !is_size && !is_primitive(attribute) {
                    return Err(incompatible(attribute, "in"));
                }
                let mut aliases = Vec::with_capacity(values.len());
                for value in values {
                    let wire = self.subject_literal(value, attribute, is_size)?;
                    aliases.push(self.state.alias_value(wire));
                }
                Ok(format!("{rendered} IN ({})", aliases.join(", ")))
            }
            Condition::Contains { attr, value } => {
                let (rendered, attribute) = self.alias_attr(attr)?;
                let wire = contains_element(attribute, value)?;
                let alias = self.state.alias_value(wire);
                Ok(format!("contains({rendered}, {alias})"))
            }
            Condition::BeginsWith { attr, value } => {
                let (rendered, attribute) = self.alias_attr(attr)?;
                if !supports_begins_with(attribute) {
                    return Err(incompatible(attribute, "beginsWith"));
                }
                let wire = literal_to_wire(attribute, value, LITERAL_OPTIONS)?;
                let alias = self.state.alias_value(wire);
                Ok(format!("begins_with({rendered}, {alias})"))
            }
            Condition::Exists { attr, exists } => {
                let (rendered, _) = self.alias_attr(attr)?;
                let function = if *exists {
                    "attribute_exists"
                } else {
                    "attribute_not_exists"
                };
                Ok(format!("{function}({rendered})"))
            }
            Condition::TypeIs { attr, type_code } => {
                let (rendered, _) = self.alias_attr(attr)?;
                let alias = self
                    .state
                    .alias_value(AttributeValue::S(type_code.as_str().to_owned()));
                Ok(format!("attribute_type({rendered}, {alias})"))
            }
        }
    }

    fn compile_logical(
        &mut self,
        children: &[Condition],
        connective: &str,
    ) -> Result<String, CompileError> {
        if children.is_empty() {
            return Err(CompileError::InvalidConditionShape {
                message: format!("'{}' requires at least one condition", connective.to_lowercase()),
            });
        }
        let compiled: Result<Vec<String>, CompileError> = children
            .iter()
            .map(|child| Ok(format!("({})", self.compile_condition(child)?)))
            .collect();
        Ok(compiled?.join(&format!(" {connective} ")))
    }

    /// Resolves and renders a path, returning the leaf attribute.
    fn alias_attr(&mut self, path: &str) -> Result<(String, &'s Attribute), CompileError> {
        let segments =
            resolve_path(self.schema, path).map_err(|source| CompileError::UnknownAttribute {
                path: path.to_owned(),
                source,
            })?;
        let attribute = segments
            .last()
            .map(|segment| segment.attribute)
            .ok_or_else(|| CompileError::UnknownAttribute {
                path: path.to_owned(),
                source: crate::error::PathError::InvalidPathSyntax {
                    path: path.to_owned(),
                    message: "empty path".to_owned(),
                },
            })?;
        let rendered = self.state.alias_path(&segments);
        Ok((rendered, attribute))
    }

    fn compile_subject(
        &mut self,
        subject: &ConditionSubject,
    ) -> Result<(String, &'s Attribute, bool), CompileError> {
        match subject {
            ConditionSubject::Attr(path) => {
                let (rendered, attribute) = self.alias_attr(path)?;
                Ok((rendered, attribute, false))
            }
            ConditionSubject::Size(path) => {
                let (rendered, attribute) = self.alias_attr(path)?;
                Ok((format!("size({rendered})"), attribute, true))
            }
        }
    }

    fn compile_target(
        &mut self,
        target: &ConditionTarget,
        subject_attribute: &Attribute,
        subject_is_size: bool,
    ) -> Result<String, CompileError> {
        match target {
            ConditionTarget::Value(value) => {
                let wire = self.subject_literal(value, subject_attribute, subject_is_size)?;
                Ok(self.state.alias_value(wire))
            }
            ConditionTarget::Attr(path) => {
                let (rendered, _) = self.alias_attr(path)?;
                Ok(rendered)
            }
            ConditionTarget::Size(path) => {
                let (rendered, _) = self.alias_attr(path)?;
                Ok(format!("size({rendered})"))
            }
        }
    }

    /// Converts a literal against the comparison subject: the attribute
    /// itself, or a plain number when the subject is a `size(..)`.
    fn subject_literal(
        &self,
        value: &Json,
        attribute: &Attribute,
        is_size: bool,
    ) -> Result<AttributeValue, CompileError> {
        let wire = if is_size {
            primitive_to_wire(PrimitiveType::Number, value, &attribute.path)?
        } else {
            literal_to_wire(attribute, value, LITERAL_OPTIONS)?
        };
        Ok(wire)
    }
}

fn incompatible(attribute: &Attribute, operator: &str) -> CompileError {
    CompileError::IncompatibleOperator {
        path: attribute.path.clone(),
        operator: operator.to_owned(),
        attribute_type: attribute.type_label(),
    }
}

// ---------------------------------------------------------------------------
// Operator/type compatibility
// ---------------------------------------------------------------------------

fn supports_ordering(attribute: &Attribute) -> bool {
    match &attribute.kind {
        AttributeKind::Primitive(
            PrimitiveType::String | PrimitiveType::Number | PrimitiveType::Binary,
        )
        | AttributeKind::Any => true,
        AttributeKind::AnyOf(candidates) => candidates.iter().any(supports_ordering),
        _ => false,
    }
}

fn is_primitive(attribute: &Attribute) -> bool {
    match &attribute.kind {
        AttributeKind::Primitive(_) | AttributeKind::Any => true,
        AttributeKind::AnyOf(candidates) => candidates.iter().any(is_primitive),
        _ => false,
    }
}

fn supports_begins_with(attribute: &Attribute) -> bool {
    match &attribute.kind {
        AttributeKind::Primitive(PrimitiveType::String | PrimitiveType::Binary)
        | AttributeKind::Any => true,
        AttributeKind::AnyOf(candidates) => candidates.iter().any(supports_begins_with),
        _ => false,
    }
}

/// Converts a `contains` element literal against the container's element
/// type.
fn contains_element(attribute: &Attribute, value: &Json) -> Result<AttributeValue, CompileError> {
    match &attribute.kind {
        AttributeKind::Primitive(PrimitiveType::String) => {
            Ok(primitive_to_wire(PrimitiveType::String, value, &attribute.path)?)
        }
        AttributeKind::Set { element } => Ok(primitive_to_wire(*element, value, &attribute.path)?),
        AttributeKind::List { element } => {
            Ok(literal_to_wire(element, value, LITERAL_OPTIONS)?)
        }
        AttributeKind::Any => Ok(literal_to_wire(attribute, value, LITERAL_OPTIONS)?),
        AttributeKind::AnyOf(candidates) => candidates
            .iter()
            .find_map(|candidate| contains_element(candidate, value).ok())
            .ok_or_else(|| incompatible(attribute, "contains")),
        _ => Err(incompatible(attribute, "contains")),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::builder::{list, map, number, set, string};

    fn simple_schema() -> Schema {
        Schema::freeze("Entity", vec![("num".to_owned(), number())]).unwrap()
    }

    fn rich_schema() -> Schema {
        Schema::freeze(
            "Entity",
            vec![
                ("name".to_owned(), string()),
                ("level".to_owned(), number()),
                ("tags".to_owned(), set(PrimitiveType::String)),
                (
                    "history".to_owned(),
                    list(map(vec![("score", number())])),
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_should_compile_exists() {
        let schema = simple_schema();
        let params = ConditionCompiler::new(&schema)
            .compile(&Condition::exists("num"))
            .unwrap();
        assert_eq!(
            params.condition_expression.as_deref(),
            Some("attribute_exists(#c_1)")
        );
        assert_eq!(params.expression_attribute_names["#c_1"], "num");
        assert!(params.expression_attribute_values.is_empty());
    }

    #[test]
    fn test_should_compile_not_exists() {
        let schema = simple_schema();
        let params = ConditionCompiler::new(&schema)
            .compile(&Condition::not_exists("num"))
            .unwrap();
        assert_eq!(
            params.condition_expression.as_deref(),
            Some("attribute_not_exists(#c_1)")
        );
    }

    #[test]
    fn test_should_compile_comparison_with_literal() {
        let schema = rich_schema();
        let params = ConditionCompiler::new(&schema)
            .compile(&Condition::comparison(
                "level",
                ComparisonOperator::Gte,
                json!(30),
            ))
            .unwrap();
        assert_eq!(params.condition_expression.as_deref(), Some("#c_1 >= :c_1"));
        assert_eq!(
            params.expression_attribute_values[":c_1"],
            AttributeValue::from(30i64)
        );
    }

    #[test]
    fn test_should_compile_comparison_between_two_attributes() {
        let schema = rich_schema();
        let params = ConditionCompiler::new(&schema)
            .compile(&Condition::Comparison {
                subject: ConditionSubject::Attr("name".to_owned()),
                operator: ComparisonOperator::Ne,
                target: ConditionTarget::Attr("tags".to_owned()),
            })
            .unwrap();
        assert_eq!(params.condition_expression.as_deref(), Some("#c_1 <> #c_2"));
        assert!(params.expression_attribute_values.is_empty());
    }

    #[test]
    fn test_should_parenthesize_logical_children() {
        let schema = rich_schema();
        let params = ConditionCompiler::new(&schema)
            .compile(&Condition::and(vec![
                Condition::exists("name"),
                Condition::or(vec![
                    Condition::comparison("level", ComparisonOperator::Lt, json!(10)),
                    Condition::exists("tags").negate(),
                ]),
            ]))
            .unwrap();
        assert_eq!(
            params.condition_expression.as_deref(),
            Some("(attribute_exists(#c_1)) AND ((#c_2 < :c_1) OR (NOT (attribute_exists(#c_3))))")
        );
    }

    #[test]
    fn test_should_compile_between_and_in() {
        let schema = rich_schema();
        let mut compiler = ConditionCompiler::new(&schema);
        let params = compiler
            .compile(&Condition::Between {
                subject: ConditionSubject::Attr("level".to_owned()),
                low: json!(1).into(),
                high: json!(99).into(),
            })
            .unwrap();
        assert_eq!(
            params.condition_expression.as_deref(),
            Some("#c_1 BETWEEN :c_1 AND :c_2")
        );

        let params = compiler
            .compile(&Condition::In {
                subject: ConditionSubject::Attr("name".to_owned()),
                values: vec![json!("a"), json!("b")],
            })
            .unwrap();
        // Counters continued from the previous call on the same instance.
        assert_eq!(
            params.condition_expression.as_deref(),
            Some("#c_2 IN (:c_3, :c_4)")
        );
    }

    #[test]
    fn test_should_compile_size_as_operand() {
        let schema = rich_schema();
        let params = ConditionCompiler::new(&schema)
            .compile(&Condition::Comparison {
                subject: ConditionSubject::Size("tags".to_owned()),
                operator: ComparisonOperator::Gt,
                target: json!(2).into(),
            })
            .unwrap();
        assert_eq!(
            params.condition_expression.as_deref(),
            Some("size(#c_1) > :c_1")
        );
        assert_eq!(
            params.expression_attribute_values[":c_1"],
            AttributeValue::from(2i64)
        );
    }

    #[test]
    fn test_should_compile_contains_and_begins_with() {
        let schema = rich_schema();
        let mut compiler = ConditionCompiler::new(&schema);
        let params = compiler
            .compile(&Condition::Contains {
                attr: "tags".to_owned(),
                value: json!("fire"),
            })
            .unwrap();
        assert_eq!(
            params.condition_expression.as_deref(),
            Some("contains(#c_1, :c_1)")
        );

        let params = compiler
            .compile(&Condition::BeginsWith {
                attr: "name".to_owned(),
                value: json!("pika"),
            })
            .unwrap();
        assert_eq!(
            params.condition_expression.as_deref(),
            Some("begins_with(#c_2, :c_2)")
        );
    }

    #[test]
    fn test_should_compile_attribute_type() {
        let schema = simple_schema();
        let params = ConditionCompiler::new(&schema)
            .compile(&Condition::TypeIs {
                attr: "num".to_owned(),
                type_code: AttributeTypeCode::N,
            })
            .unwrap();
        assert_eq!(
            params.condition_expression.as_deref(),
            Some("attribute_type(#c_1, :c_1)")
        );
        assert_eq!(
            params.expression_attribute_values[":c_1"],
            AttributeValue::S("N".to_owned())
        );
    }

    #[test]
    fn test_should_reject_ordering_on_set_attribute() {
        let schema = rich_schema();
        let err = ConditionCompiler::new(&schema)
            .compile(&Condition::comparison(
                "tags",
                ComparisonOperator::Lt,
                json!(["x"]),
            ))
            .unwrap_err();
        assert_eq!(err.code(), "compile.incompatibleOperator");
    }

    #[test]
    fn test_should_reject_begins_with_on_number_attribute() {
        let schema = rich_schema();
        let err = ConditionCompiler::new(&schema)
            .compile(&Condition::BeginsWith {
                attr: "level".to_owned(),
                value: json!(4),
            })
            .unwrap_err();
        assert_eq!(err.code(), "compile.incompatibleOperator");
    }

    #[test]
    fn test_should_reject_contains_on_number_attribute() {
        let schema = rich_schema();
        let err = ConditionCompiler::new(&schema)
            .compile(&Condition::Contains {
                attr: "level".to_owned(),
                value: json!(1),
            })
            .unwrap_err();
        assert_eq!(err.code(), "compile.incompatibleOperator");
    }

    #[test]
    fn test_should_reject_in_on_map_attribute() {
        let schema = Schema::freeze(
            "Entity",
            vec![("stats".to_owned(), map(vec![("hp", number())]))],
        )
        .unwrap();
        let err = ConditionCompiler::new(&schema)
            .compile(&Condition::In {
                subject: ConditionSubject::Attr("stats".to_owned()),
                values: vec![json!({"hp": 1})],
            })
            .unwrap_err();
        assert_eq!(err.code(), "compile.incompatibleOperator");
    }

    #[test]
    fn test_should_reject_between_on_set_attribute() {
        let schema = rich_schema();
        let err = ConditionCompiler::new(&schema)
            .compile(&Condition::Between {
                subject: ConditionSubject::Attr("tags".to_owned()),
                low: json!(["a"]).into(),
                high: json!(["z"]).into(),
            })
            .unwrap_err();
        assert_eq!(err.code(), "compile.incompatibleOperator");
    }

    #[test]
    fn test_should_reject_empty_logical_node() {
        let schema = simple_schema();
        let err = ConditionCompiler::new(&schema)
            .compile(&Condition::And(Vec::new()))
            .unwrap_err();
        assert_eq!(err.code(), "compile.invalidConditionShape");
    }

    #[test]
    fn test_should_surface_path_failure_as_unknown_attribute() {
        let schema = simple_schema();
        let err = ConditionCompiler::new(&schema)
            .compile(&Condition::exists("missing"))
            .unwrap_err();
        assert_eq!(err.code(), "compile.unknownAttribute");
    }

    #[test]
    fn test_should_produce_identical_output_on_fresh_instances() {
        let schema = rich_schema();
        let condition = Condition::and(vec![
            Condition::exists("history"),
            Condition::comparison("level", ComparisonOperator::Gt, json!(7)),
        ]);
        let first = ConditionCompiler::new(&schema).compile(&condition).unwrap();
        let second = ConditionCompiler::new(&schema).compile(&condition).unwrap();
        assert_eq!(first.condition_expression, second.condition_expression);
        assert_eq!(
            first.expression_attribute_names,
            second.expression_attribute_names
        );
        assert_eq!(
            first.expression_attribute_values,
            second.expression_attribute_values
        );
    }
}
