//! Schema-driven compilation of condition and update expressions.
//!
//! A frozen [`schema::Schema`] drives everything: path strings resolve
//! against it, condition trees and update trees compile into wire
//! expressions with `#c_<n>` / `:c_<n>` placeholders, and items format
//! between wire shape and plain JSON through it.

pub mod compile;
pub mod error;
pub mod format;
pub mod path;
pub mod schema;

pub use compile::CompilationState;
pub use compile::condition::{
    AttributeTypeCode, ComparisonOperator, Condition, ConditionCompiler, ConditionSubject,
    ConditionTarget,
};
pub use compile::update::{UpdateCompiler, UpdateInput, UpdateOperand, UpdateValue};
pub use error::{CompileError, FormatError, PathError, SchemaError};
pub use format::{FormatOptions, Formatter};
pub use path::{ResolvedSegment, resolve_path};
pub use schema::Schema;
