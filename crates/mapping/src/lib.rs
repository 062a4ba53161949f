//! Mapping interpreter
//!
//! Executes a compiled mapping program, an ordered list of statements
//! pairing an assignment target with a query expression plus named
//! sub-queries, against a message batch, producing a transformed part, a
//! boolean predicate result, or a raw value. The target message's structured view is parsed lazily,
//! at most once per execution, and errors carry the source line of the
//! failing statement.

pub mod arith;
pub mod assignment;
pub mod context;
pub mod error;
pub mod executor;
pub mod query;
pub mod value;

pub use assignment::{Assignment, MetaAssignment, RootAssignment, VarAssignment};
pub use context::{
    AssignmentContext, FunctionContext, FunctionMap, LazyStructured, TargetsContext, VarMap,
};
pub use error::{Error, Result};
pub use executor::{AssignmentSink, Executor, Statement, line_and_col_of};
pub use query::{
    Arithmetic, ArithmeticOp, Closure, Deleted, FieldFunction, Function, Literal, MetaFunction,
    TargetKind, TargetPath, VarFunction,
};
pub use value::Value;
