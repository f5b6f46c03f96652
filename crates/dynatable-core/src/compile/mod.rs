//! Expression compilation: alias bookkeeping plus the condition and update
//! compilers.
//!
//! A compiler instance exclusively owns one [`CompilationState`]. The state
//! persists and accumulates across repeated compile calls on that instance,
//! so one combined expression can be built incrementally; a fresh expression
//! requires a fresh instance. The frozen schema is shared read-only across
//! any number of instances.

pub mod condition;
pub mod update;

use std::collections::BTreeMap;

use dynatable_model::AttributeValue;

use crate::path::ResolvedSegment;

/// Per-instance alias bookkeeping.
///
/// Name aliases (`#c_<n>`) are assigned first-seen, depth-first,
/// left-to-right and deduplicated by full resolved path; value aliases
/// (`:c_<n>`) are fresh per literal occurrence, never deduplicated. Counters
/// start at 1 and are never reset or rolled back: a failed compile call
/// leaves any aliases its partial work advanced (at-least-once numbering).
#[derive(Debug, Default)]
pub struct CompilationState {
    /// Dedup table: full logical path prefix to its name alias.
    path_aliases: Vec<(String, String)>,
    names: BTreeMap<String, String>,
    values: BTreeMap<String, AttributeValue>,
    name_counter: u32,
    value_counter: u32,
}

impl CompilationState {
    /// Creates an empty state with counters at zero (first alias is `_1`).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders a resolved path, allocating or reusing one name alias per
    /// segment. Bracket indexes attach directly to the preceding alias with
    /// no separating dot: `#c_1[1].#c_2`.
    pub fn alias_path(&mut self, segments: &[ResolvedSegment<'_>]) -> String {
        let mut dedup_key = String::new();
        let mut rendered = String::new();

        for (position, segment) in segments.iter().enumerate() {
            if position > 0 {
                dedup_key.push('.');
                rendered.push('.');
            }
            dedup_key.push_str(&segment.name);

            let alias = match self
                .path_aliases
                .iter()
                .find(|(key, _)| key == &dedup_key)
            {
                Some((_, alias)) => alias.clone(),
                None => {
                    self.name_counter += 1;
                    let alias = format!("#c_{}", self.name_counter);
                    self.path_aliases.push((dedup_key.clone(), alias.clone()));
                    self.names.insert(alias.clone(), segment.saved_as.clone());
                    alias
                }
            };
            rendered.push_str(&alias);

            for index in &segment.indexes {
                dedup_key.push_str(&format!("[{index}]"));
                rendered.push_str(&format!("[{index}]"));
            }
        }

        rendered
    }

    /// Allocates a fresh value alias for one literal occurrence.
    pub fn alias_value(&mut self, value: AttributeValue) -> String {
        self.value_counter += 1;
        let alias = format!(":c_{}", self.value_counter);
        self.values.insert(alias.clone(), value);
        alias
    }

    /// Snapshot of the accumulated name alias table.
    #[must_use]
    pub fn names(&self) -> &BTreeMap<String, String> {
        &self.names
    }

    /// Snapshot of the accumulated value alias table.
    #[must_use]
    pub fn values(&self) -> &BTreeMap<String, AttributeValue> {
        &self.values
    }

    pub(crate) fn export(&self) -> (BTreeMap<String, String>, BTreeMap<String, AttributeValue>) {
        (self.names.clone(), self.values.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::resolve_path;
    use crate::schema::Schema;
    use crate::schema::builder::{list, map, number};

    fn test_schema() -> Schema {
        Schema::freeze(
            "Entity",
            vec![
                ("count".to_owned(), number()),
                (
                    "rows".to_owned(),
                    list(map(vec![("value", number())])),
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_should_reuse_alias_for_identical_path() {
        let schema = test_schema();
        let mut state = CompilationState::new();
        let segments = resolve_path(&schema, "count").unwrap();
        assert_eq!(state.alias_path(&segments), "#c_1");
        assert_eq!(state.alias_path(&segments), "#c_1");
        assert_eq!(state.names().len(), 1);
    }

    #[test]
    fn test_should_attach_indexes_without_dot() {
        let schema = test_schema();
        let mut state = CompilationState::new();
        let segments = resolve_path(&schema, "rows[3].value").unwrap();
        assert_eq!(state.alias_path(&segments), "#c_1[3].#c_2");
    }

    #[test]
    fn test_should_distinguish_paths_through_different_indexes() {
        let schema = test_schema();
        let mut state = CompilationState::new();
        let first = resolve_path(&schema, "rows[1].value").unwrap();
        let second = resolve_path(&schema, "rows[2].value").unwrap();
        assert_eq!(state.alias_path(&first), "#c_1[1].#c_2");
        // The `rows` prefix is shared; the leaf under a different index is not.
        assert_eq!(state.alias_path(&second), "#c_1[2].#c_3");
    }

    #[test]
    fn test_should_never_deduplicate_value_aliases() {
        let mut state = CompilationState::new();
        let value = AttributeValue::from(1i64);
        assert_eq!(state.alias_value(value.clone()), ":c_1");
        assert_eq!(state.alias_value(value), ":c_2");
    }

    #[test]
    fn test_should_keep_counters_across_calls() {
        let schema = test_schema();
        let mut state = CompilationState::new();
        let count = resolve_path(&schema, "count").unwrap();
        let rows = resolve_path(&schema, "rows[0].value").unwrap();
        state.alias_path(&count);
        // A later call on the same state continues numbering.
        assert_eq!(state.alias_path(&rows), "#c_2[0].#c_3");
    }
}
