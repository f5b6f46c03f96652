//! Update tree compilation.
//!
//! An [`UpdateInput`] is shaped like the schema: each attribute slot holds a
//! literal replacement, a removal marker, a reference to another attribute's
//! path, or a numeric/set extension. Compilation produces the four clauses
//! `SET` / `REMOVE` / `ADD` / `DELETE` plus the placeholder maps.
//!
//! Every slot passes through a staged pipeline, modeled as an explicit state
//! machine (`Unparsed -> Cloned -> Linked -> Compiled -> Collapsed`):
//! cloning detaches the node from caller-owned structure, linking resolves
//! nested operand references bottom-up, compiling runs the arity/type
//! validation and allocates aliases, collapsing hands the finished fragment
//! to its clause. Operand references are resolved before the parent's arity
//! check runs. A validation failure aborts with a typed error; alias
//! counters already advanced by the failed node are not rolled back.

use serde_json::{Value as Json, json};
use tracing::debug;

use dynatable_model::{ExpressionParams, UpdateExpressionClauses};

use crate::compile::CompilationState;
use crate::error::CompileError;
use crate::format::{FormatOptions, literal_to_wire};
use crate::path::resolve_path;
use crate::schema::{Attribute, AttributeKind, PrimitiveType, Schema};

const LITERAL_OPTIONS: FormatOptions = FormatOptions { partial: true };

// ---------------------------------------------------------------------------
// Update tree
// ---------------------------------------------------------------------------

/// An operand of a numeric extension: a literal, or a reference to another
/// attribute's path.
#[derive(Debug, Clone)]
pub enum UpdateOperand {
    /// A literal, converted against the target attribute.
    Value(Json),
    /// A reference to another attribute's current value.
    Ref(String),
}

impl From<Json> for UpdateOperand {
    fn from(value: Json) -> Self {
        Self::Value(value)
    }
}

/// The content of one update slot.
#[derive(Debug, Clone)]
pub enum UpdateValue {
    /// Replace the attribute with a literal: `SET p = :v`.
    Set(Json),
    /// Remove the attribute: `REMOVE p`.
    Remove,
    /// Replace the attribute with another attribute's value: `SET p = q`.
    Ref(String),
    /// Increment by a delta: `SET p = p + :delta` (delta may be a
    /// reference).
    Add(UpdateOperand),
    /// `SET p = a + b`; a tuple of length 1 makes the attribute's own path
    /// the left side.
    Sum(Vec<UpdateOperand>),
    /// `SET p = a - b`; a tuple of length 1 makes the attribute's own path
    /// the left side.
    Subtract(Vec<UpdateOperand>),
    /// Add elements to a set attribute: `ADD p :v`.
    SetAdd(Json),
    /// Delete elements from a set attribute: `DELETE p :v`.
    SetDelete(Json),
    /// Descend into a map attribute's children.
    Map(Vec<(String, UpdateValue)>),
}

/// A caller-supplied update tree: top-level attribute names to update
/// values, in order.
#[derive(Debug, Clone, Default)]
pub struct UpdateInput {
    /// Slots in declaration order.
    pub entries: Vec<(String, UpdateValue)>,
}

impl UpdateInput {
    /// Creates an empty update tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one slot.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: UpdateValue) -> Self {
        self.entries.push((name.into(), value));
        self
    }
}

impl From<Vec<(String, UpdateValue)>> for UpdateInput {
    fn from(entries: Vec<(String, UpdateValue)>) -> Self {
        Self { entries }
    }
}

// ---------------------------------------------------------------------------
// Staged node pipeline
// ---------------------------------------------------------------------------

/// Pipeline position of one update slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeState {
    /// Still aliased to caller-owned structure.
    Unparsed,
    /// Owned copy, safe to mutate.
    Cloned,
    /// Operand references resolved against the schema.
    Linked,
    /// Validated and rendered; aliases allocated.
    Compiled,
    /// Fragment handed to its clause. Terminal.
    Collapsed,
}

#[derive(Debug)]
enum Stage<'t> {
    Unparsed { raw: &'t UpdateValue },
    Cloned { value: UpdateValue },
    Linked { value: UpdateValue },
    Compiled { fragment: ActionFragment },
    Collapsed,
}

/// One update slot moving through the staged pipeline.
#[derive(Debug)]
pub(crate) struct StagedNode<'t> {
    path: String,
    stage: Stage<'t>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ActionFragment {
    Set(String),
    Remove(String),
    Add(String),
    Delete(String),
}

#[derive(Debug, Default)]
struct Clauses {
    set: Vec<String>,
    remove: Vec<String>,
    add: Vec<String>,
    delete: Vec<String>,
}

impl Clauses {
    fn push(&mut self, fragment: ActionFragment) {
        match fragment {
            ActionFragment::Set(s) => self.set.push(s),
            ActionFragment::Remove(s) => self.remove.push(s),
            ActionFragment::Add(s) => self.add.push(s),
            ActionFragment::Delete(s) => self.delete.push(s),
        }
    }

    fn render(self) -> UpdateExpressionClauses {
        let join = |parts: Vec<String>| {
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        };
        UpdateExpressionClauses {
            set: join(self.set),
            remove: join(self.remove),
            add: join(self.add),
            delete: join(self.delete),
        }
    }
}

impl<'t> StagedNode<'t> {
    fn new(path: String, raw: &'t UpdateValue) -> Self {
        Self {
            path,
            stage: Stage::Unparsed { raw },
        }
    }

    pub(crate) fn state(&self) -> NodeState {
        match &self.stage {
            Stage::Unparsed { .. } => NodeState::Unparsed,
            Stage::Cloned { .. } => NodeState::Cloned,
            Stage::Linked { .. } => NodeState::Linked,
            Stage::Compiled { .. } => NodeState::Compiled,
            Stage::Collapsed => NodeState::Collapsed,
        }
    }

    /// The intermediate update value, inspectable between the cloning and
    /// compiling stages.
    pub(crate) fn value(&self) -> Option<&UpdateValue> {
        match &self.stage {
            Stage::Cloned { value } | Stage::Linked { value } => Some(value),
            _ => None,
        }
    }

    /// Advances the node one stage, returning the new state.
    fn advance(
        &mut self,
        schema: &Schema,
        state: &mut CompilationState,
        clauses: &mut Clauses,
    ) -> Result<NodeState, CompileError> {
        // A failed transition keeps the node at its current stage; only a
        // successful compile ever reaches `Collapsed`.
        self.stage = match std::mem::replace(&mut self.stage, Stage::Collapsed) {
            Stage::Unparsed { raw } => Stage::Cloned { value: raw.clone() },
            Stage::Cloned { value } => {
                if let Err(err) = link_references(schema, &self.path, &value) {
                    self.stage = Stage::Cloned { value };
                    return Err(err);
                }
                Stage::Linked { value }
            }
            Stage::Linked { value } => match compile_slot(schema, state, &self.path, &value) {
                Ok(fragment) => Stage::Compiled { fragment },
                Err(err) => {
                    self.stage = Stage::Linked { value };
                    return Err(err);
                }
            },
            Stage::Compiled { fragment } => {
                clauses.push(fragment);
                Stage::Collapsed
            }
            Stage::Collapsed => Stage::Collapsed,
        };
        Ok(self.state())
    }
}

/// Resolves every path referenced by a slot, bottom-up, before any arity
/// check runs.
fn link_references(schema: &Schema, path: &str, value: &UpdateValue) -> Result<(), CompileError> {
    let check = |referenced: &str| {
        resolve_path(schema, referenced)
            .map(|_| ())
            .map_err(|source| CompileError::UnknownAttribute {
                path: referenced.to_owned(),
                source,
            })
    };

    match value {
        UpdateValue::Ref(referenced) => check(referenced),
        UpdateValue::Add(operand) => link_operand(schema, operand),
        UpdateValue::Sum(operands) | UpdateValue::Subtract(operands) => {
            for operand in operands {
                link_operand(schema, operand)?;
            }
            Ok(())
        }
        UpdateValue::Map(_) => unreachable!("map slots are flattened before staging: {path}"),
        _ => Ok(()),
    }
}

fn link_operand(schema: &Schema, operand: &UpdateOperand) -> Result<(), CompileError> {
    match operand {
        UpdateOperand::Value(_) => Ok(()),
        UpdateOperand::Ref(referenced) => resolve_path(schema, referenced)
            .map(|_| ())
            .map_err(|source| CompileError::UnknownAttribute {
                path: referenced.to_owned(),
                source,
            }),
    }
}

// ---------------------------------------------------------------------------
// Slot compilation
// ---------------------------------------------------------------------------

fn compile_slot(
    schema: &Schema,
    state: &mut CompilationState,
    path: &str,
    value: &UpdateValue,
) -> Result<ActionFragment, CompileError> {
    let segments =
        resolve_path(schema, path).map_err(|source| CompileError::UnknownAttribute {
            path: path.to_owned(),
            source,
        })?;
    let Some(attribute) = segments.last().map(|segment| segment.attribute) else {
        return Err(CompileError::UnknownAttribute {
            path: path.to_owned(),
            source: crate::error::PathError::InvalidPathSyntax {
                path: path.to_owned(),
                message: "empty path".to_owned(),
            },
        });
    };

    // Key attributes are always required and immutable.
    if segments.iter().any(|segment| segment.attribute.key) {
        return Err(CompileError::UnsupportedOperation {
            path: attribute.path.clone(),
            operation: "update".to_owned(),
            attribute_type: attribute.type_label(),
        });
    }

    // The target path alias is allocated before validation; a later failure
    // leaves it in place (at-least-once numbering).
    let rendered = state.alias_path(&segments);

    match value {
        UpdateValue::Set(literal) => {
            let wire = literal_to_wire(attribute, literal, LITERAL_OPTIONS)?;
            let alias = state.alias_value(wire);
            Ok(ActionFragment::Set(format!("{rendered} = {alias}")))
        }
        UpdateValue::Remove => Ok(ActionFragment::Remove(rendered)),
        UpdateValue::Ref(referenced) => {
            let referenced = alias_reference(schema, state, referenced)?;
            Ok(ActionFragment::Set(format!("{rendered} = {referenced}")))
        }
        UpdateValue::Add(delta) => {
            require_number(attribute, "add")?;
            let delta = compile_operand(schema, state, attribute, delta)?;
            Ok(ActionFragment::Set(format!(
                "{rendered} = {rendered} + {delta}"
            )))
        }
        UpdateValue::Sum(operands) => {
            compile_arithmetic(schema, state, attribute, &rendered, operands, "sum", "+")
        }
        UpdateValue::Subtract(operands) => {
            compile_arithmetic(schema, state, attribute, &rendered, operands, "subtract", "-")
        }
        UpdateValue::SetAdd(literal) => {
            require_set(attribute, "add")?;
            let wire = literal_to_wire(attribute, literal, LITERAL_OPTIONS)?;
            let alias = state.alias_value(wire);
            Ok(ActionFragment::Add(format!("{rendered} {alias}")))
        }
        UpdateValue::SetDelete(literal) => {
            require_set(attribute, "delete")?;
            let wire = literal_to_wire(attribute, literal, LITERAL_OPTIONS)?;
            let alias = state.alias_value(wire);
            Ok(ActionFragment::Delete(format!("{rendered} {alias}")))
        }
        UpdateValue::Map(_) => {
            unreachable!("map slots are flattened before staging: {path}")
        }
    }
}

/// `SET p = a <op> b`; one operand defaults the left side to the
/// attribute's own current path.
fn compile_arithmetic(
    schema: &Schema,
    state: &mut CompilationState,
    attribute: &Attribute,
    rendered: &str,
    operands: &[UpdateOperand],
    operation: &str,
    symbol: &str,
) -> Result<ActionFragment, CompileError> {
    require_number(attribute, operation)?;

    if operands.is_empty() || operands.len() > 2 {
        return Err(CompileError::InvalidAttributeInput {
            path: attribute.path.clone(),
            message: format!(
                "{operation} for number attribute '{}' expects a tuple of length 1 or 2",
                attribute.path
            ),
            received: Json::Array(operands.iter().map(operand_to_json).collect()),
        });
    }

    let (left, right) = if operands.len() == 1 {
        (
            rendered.to_owned(),
            compile_operand(schema, state, attribute, &operands[0])?,
        )
    } else {
        (
            compile_operand(schema, state, attribute, &operands[0])?,
            compile_operand(schema, state, attribute, &operands[1])?,
        )
    };

    Ok(ActionFragment::Set(format!(
        "{rendered} = {left} {symbol} {right}"
    )))
}

fn compile_operand(
    schema: &Schema,
    state: &mut CompilationState,
    attribute: &Attribute,
    operand: &UpdateOperand,
) -> Result<String, CompileError> {
    match operand {
        UpdateOperand::Value(literal) => {
            let wire = literal_to_wire(attribute, literal, LITERAL_OPTIONS)?;
            Ok(state.alias_value(wire))
        }
        UpdateOperand::Ref(referenced) => alias_reference(schema, state, referenced),
    }
}

fn alias_reference(
    schema: &Schema,
    state: &mut CompilationState,
    referenced: &str,
) -> Result<String, CompileError> {
    let segments =
        resolve_path(schema, referenced).map_err(|source| CompileError::UnknownAttribute {
            path: referenced.to_owned(),
            source,
        })?;
    Ok(state.alias_path(&segments))
}

fn operand_to_json(operand: &UpdateOperand) -> Json {
    match operand {
        UpdateOperand::Value(value) => value.clone(),
        UpdateOperand::Ref(path) => json!({ "$ref": path }),
    }
}

fn require_number(attribute: &Attribute, operation: &str) -> Result<(), CompileError> {
    if is_number_capable(attribute) {
        Ok(())
    } else {
        Err(CompileError::UnsupportedOperation {
            path: attribute.path.clone(),
            operation: operation.to_owned(),
            attribute_type: attribute.type_label(),
        })
    }
}

fn is_number_capable(attribute: &Attribute) -> bool {
    match &attribute.kind {
        AttributeKind::Primitive(PrimitiveType::Number) | AttributeKind::Any => true,
        AttributeKind::AnyOf(candidates) => candidates.iter().any(is_number_capable),
        _ => false,
    }
}

fn require_set(attribute: &Attribute, operation: &str) -> Result<(), CompileError> {
    let capable = match &attribute.kind {
        AttributeKind::Set { .. } | AttributeKind::Any => true,
        AttributeKind::AnyOf(candidates) => candidates
            .iter()
            .any(|candidate| matches!(candidate.kind, AttributeKind::Set { .. })),
        _ => false,
    };
    if capable {
        Ok(())
    } else {
        Err(CompileError::UnsupportedOperation {
            path: attribute.path.clone(),
            operation: operation.to_owned(),
            attribute_type: attribute.type_label(),
        })
    }
}

// ---------------------------------------------------------------------------
// Compiler
// ---------------------------------------------------------------------------

/// Compiles update trees against one frozen schema, accumulating aliases
/// across calls.
#[derive(Debug)]
pub struct UpdateCompiler<'s> {
    schema: &'s Schema,
    state: CompilationState,
}

impl<'s> UpdateCompiler<'s> {
    /// Creates a compiler with fresh alias counters.
    #[must_use]
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            state: CompilationState::new(),
        }
    }

    /// Compiles one update tree into the four clauses plus the accumulated
    /// placeholder maps.
    ///
    /// # Errors
    ///
    /// Fails with [`CompileError::UnknownAttribute`] for unresolved paths or
    /// reference operands, [`CompileError::InvalidAttributeInput`] for
    /// extension arity violations, and
    /// [`CompileError::UnsupportedOperation`] for extensions on incompatible
    /// attribute types. A failed call does not roll back aliases its partial
    /// work allocated.
    pub fn compile(&mut self, input: &UpdateInput) -> Result<ExpressionParams, CompileError> {
        debug!(
            entity = %self.schema.entity,
            slots = input.entries.len(),
            "compiling update"
        );

        let mut clauses = Clauses::default();
        let mut nodes = flatten(input);
        for node in &mut nodes {
            while node.state() != NodeState::Collapsed {
                node.advance(self.schema, &mut self.state, &mut clauses)?;
            }
        }

        let (names, values) = self.state.export();
        Ok(ExpressionParams {
            condition_expression: None,
            update_expression: Some(clauses.render()),
            expression_attribute_names: names,
            expression_attribute_values: values,
        })
    }

    /// The accumulated alias state.
    #[must_use]
    pub fn state(&self) -> &CompilationState {
        &self.state
    }
}

/// Flattens the schema-shaped tree into leaf slots with dotted paths,
/// depth-first in declaration order.
fn flatten(input: &UpdateInput) -> Vec<StagedNode<'_>> {
    fn walk<'t>(prefix: &str, entries: &'t [(String, UpdateValue)], out: &mut Vec<StagedNode<'t>>) {
        for (name, value) in entries {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}.{name}")
            };
            match value {
                UpdateValue::Map(nested) => walk(&path, nested, out),
                other => out.push(StagedNode::new(path, other)),
            }
        }
    }

    let mut nodes = Vec::new();
    walk("", &input.entries, &mut nodes);
    nodes
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use dynatable_model::AttributeValue;

    use super::*;
    use crate::schema::builder::{map, number, set, string};

    fn test_schema() -> Schema {
        Schema::freeze(
            "Entity",
            vec![
                ("id".to_owned(), string().key()),
                ("name".to_owned(), string()),
                ("level".to_owned(), number()),
                ("bonus".to_owned(), number().optional()),
                ("tags".to_owned(), set(PrimitiveType::String).optional()),
                (
                    "stats".to_owned(),
                    map(vec![("hp", number()), ("xp", number())]).optional(),
                ),
            ],
        )
        .unwrap()
    }

    fn clauses(params: &ExpressionParams) -> &UpdateExpressionClauses {
        params.update_expression.as_ref().unwrap()
    }

    #[test]
    fn test_should_compile_literal_set_and_remove() {
        let schema = test_schema();
        let input = UpdateInput::new()
            .with("name", UpdateValue::Set(json!("eevee")))
            .with("bonus", UpdateValue::Remove);
        let params = UpdateCompiler::new(&schema).compile(&input).unwrap();
        assert_eq!(clauses(&params).set.as_deref(), Some("#c_1 = :c_1"));
        assert_eq!(clauses(&params).remove.as_deref(), Some("#c_2"));
        assert_eq!(params.expression_attribute_names["#c_1"], "name");
        assert_eq!(
            params.expression_attribute_values[":c_1"],
            AttributeValue::from("eevee")
        );
    }

    #[test]
    fn test_should_compile_reference_assignment() {
        let schema = test_schema();
        let input = UpdateInput::new().with("bonus", UpdateValue::Ref("level".to_owned()));
        let params = UpdateCompiler::new(&schema).compile(&input).unwrap();
        assert_eq!(clauses(&params).set.as_deref(), Some("#c_1 = #c_2"));
        assert_eq!(params.expression_attribute_names["#c_2"], "level");
    }

    #[test]
    fn test_should_compile_add_as_self_increment() {
        let schema = test_schema();
        let input = UpdateInput::new().with("level", UpdateValue::Add(json!(1).into()));
        let params = UpdateCompiler::new(&schema).compile(&input).unwrap();
        assert_eq!(
            clauses(&params).set.as_deref(),
            Some("#c_1 = #c_1 + :c_1")
        );
    }

    #[test]
    fn test_should_compile_sum_with_two_operands() {
        let schema = test_schema();
        let input = UpdateInput::new().with(
            "level",
            UpdateValue::Sum(vec![
                UpdateOperand::Ref("bonus".to_owned()),
                json!(10).into(),
            ]),
        );
        let params = UpdateCompiler::new(&schema).compile(&input).unwrap();
        assert_eq!(
            clauses(&params).set.as_deref(),
            Some("#c_1 = #c_2 + :c_1")
        );
        assert_eq!(params.expression_attribute_names["#c_2"], "bonus");
    }

    #[test]
    fn test_should_default_missing_subtract_side_to_own_path() {
        let schema = test_schema();
        let input =
            UpdateInput::new().with("level", UpdateValue::Subtract(vec![json!(3).into()]));
        let params = UpdateCompiler::new(&schema).compile(&input).unwrap();
        assert_eq!(
            clauses(&params).set.as_deref(),
            Some("#c_1 = #c_1 - :c_1")
        );
    }

    #[test]
    fn test_should_reject_arity_zero_and_three() {
        let schema = test_schema();
        for operands in [Vec::new(), vec![json!(1).into(), json!(2).into(), json!(3).into()]] {
            let input = UpdateInput::new().with("level", UpdateValue::Sum(operands));
            let err = UpdateCompiler::new(&schema).compile(&input).unwrap_err();
            assert_eq!(err.code(), "parsing.invalidAttributeInput");
        }
    }

    #[test]
    fn test_should_reject_sum_on_non_number() {
        let schema = test_schema();
        let input = UpdateInput::new().with("name", UpdateValue::Sum(vec![json!(1).into()]));
        let err = UpdateCompiler::new(&schema).compile(&input).unwrap_err();
        assert_eq!(err.code(), "compile.unsupportedOperation");
    }

    #[test]
    fn test_should_reject_update_of_key_attribute() {
        let schema = test_schema();
        let input = UpdateInput::new().with("id", UpdateValue::Set(json!("other")));
        let err = UpdateCompiler::new(&schema).compile(&input).unwrap_err();
        assert_eq!(err.code(), "compile.unsupportedOperation");
    }

    #[test]
    fn test_should_compile_set_add_and_delete_clauses() {
        let schema = test_schema();
        let input = UpdateInput::new()
            .with("tags", UpdateValue::SetAdd(json!(["fire"])))
            .with("tags", UpdateValue::SetDelete(json!(["water"])));
        let params = UpdateCompiler::new(&schema).compile(&input).unwrap();
        assert_eq!(clauses(&params).add.as_deref(), Some("#c_1 :c_1"));
        assert_eq!(clauses(&params).delete.as_deref(), Some("#c_1 :c_2"));
        assert_eq!(
            params.expression_attribute_values[":c_1"],
            AttributeValue::Ss(vec!["fire".to_owned()])
        );
    }

    #[test]
    fn test_should_descend_into_nested_map_slots() {
        let schema = test_schema();
        let input = UpdateInput::new().with(
            "stats",
            UpdateValue::Map(vec![
                ("hp".to_owned(), UpdateValue::Set(json!(55))),
                ("xp".to_owned(), UpdateValue::Add(json!(100).into())),
            ]),
        );
        let params = UpdateCompiler::new(&schema).compile(&input).unwrap();
        assert_eq!(
            clauses(&params).set.as_deref(),
            Some("#c_1.#c_2 = :c_1, #c_1.#c_3 = #c_1.#c_3 + :c_2")
        );
    }

    #[test]
    fn test_should_fail_unknown_reference_operand() {
        let schema = test_schema();
        let input = UpdateInput::new().with(
            "level",
            UpdateValue::Sum(vec![UpdateOperand::Ref("missing".to_owned())]),
        );
        let err = UpdateCompiler::new(&schema).compile(&input).unwrap_err();
        assert_eq!(err.code(), "compile.unknownAttribute");
    }

    #[test]
    fn test_should_keep_aliases_advanced_by_failed_call() {
        let schema = test_schema();
        let mut compiler = UpdateCompiler::new(&schema);
        let bad = UpdateInput::new().with(
            "level",
            UpdateValue::Sum(vec![json!(1).into(), json!(2).into(), json!(3).into()]),
        );
        assert!(compiler.compile(&bad).is_err());
        // The failed call aliased the target path before validating arity.
        let good = UpdateInput::new().with("bonus", UpdateValue::Set(json!(1)));
        let params = compiler.compile(&good).unwrap();
        assert_eq!(clauses(&params).set.as_deref(), Some("#c_2 = :c_1"));
        assert_eq!(params.expression_attribute_names["#c_1"], "level");
    }

    #[test]
    fn test_should_step_through_pipeline_stages() {
        let schema = test_schema();
        let mut state = CompilationState::new();
        let mut accum = Clauses::default();
        let value = UpdateValue::Add(json!(5).into());
        let mut node = StagedNode::new("level".to_owned(), &value);

        assert_eq!(node.state(), NodeState::Unparsed);
        assert!(node.value().is_none());
        assert_eq!(
            node.advance(&schema, &mut state, &mut accum).unwrap(),
            NodeState::Cloned
        );
        assert!(matches!(node.value(), Some(UpdateValue::Add(_))));
        assert_eq!(
            node.advance(&schema, &mut state, &mut accum).unwrap(),
            NodeState::Linked
        );
        assert_eq!(
            node.advance(&schema, &mut state, &mut accum).unwrap(),
            NodeState::Compiled
        );
        assert_eq!(
            node.advance(&schema, &mut state, &mut accum).unwrap(),
            NodeState::Collapsed
        );
        assert_eq!(accum.set, vec!["#c_1 = #c_1 + :c_1".to_owned()]);
    }

    #[test]
    fn test_should_abort_at_validation_without_collapsing() {
        let schema = test_schema();
        let mut state = CompilationState::new();
        let mut accum = Clauses::default();
        let value = UpdateValue::Sum(Vec::new());
        let mut node = StagedNode::new("level".to_owned(), &value);

        node.advance(&schema, &mut state, &mut accum).unwrap();
        node.advance(&schema, &mut state, &mut accum).unwrap();
        let err = node.advance(&schema, &mut state, &mut accum).unwrap_err();
        assert_eq!(err.code(), "parsing.invalidAttributeInput");
        // The node stays at its last reached stage, never reporting success.
        assert_eq!(node.state(), NodeState::Linked);
        assert!(accum.set.is_empty());
    }
}
