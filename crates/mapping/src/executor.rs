//! Mapping executor
//!
//! An [`Executor`] is a compiled mapping program: an ordered list of
//! statements, each pairing an assignment target with a query expression,
//! plus the named sub-queries they may reference. It is immutable after
//! construction and shareable across threads; every execution owns its own
//! variables and working value on the caller's stack.

use crate::assignment::Assignment;
use crate::context::{
    AssignmentContext, FunctionContext, FunctionMap, LazyStructured, TargetsContext, VarMap,
};
use crate::error::{Error, Result};
use crate::query::{Function, TargetPath};
use crate::value::Value;
use sluice_message::{Batch, Metadata, Part};

/// Line and column (1-based) at which `clip` begins within `input`, where
/// `clip` is a trailing slice of `input`. Counting is newline-separated
/// over characters. Returns (1, 1) when either slice is empty.
pub fn line_and_col_of(input: &str, clip: &str) -> (usize, usize) {
    if input.is_empty() || clip.is_empty() {
        return (1, 1);
    }
    let offset = input
        .chars()
        .count()
        .saturating_sub(clip.chars().count());
    line_and_col_at(input, offset)
}

fn line_and_col_at(input: &str, offset: usize) -> (usize, usize) {
    let lines: Vec<&str> = input.split('\n').collect();
    let mut line = 0;
    let mut remaining = offset;

    while line < lines.len() {
        let len = lines[line].chars().count();
        if remaining < len + 1 {
            break;
        }
        remaining -= len + 1;
        line += 1;
    }

    (line + 1, remaining + 1)
}

/// One assignment/query pair, carrying the character offset of its source
/// within the full program for error location.
pub struct Statement {
    offset: Option<usize>,
    assignment: Box<dyn Assignment>,
    query: Box<dyn Function>,
}

impl Statement {
    /// Create a statement. The offset is the character position of the
    /// statement's source within the program source, when known.
    pub fn new<A, F>(offset: Option<usize>, assignment: A, query: F) -> Self
    where
        A: Assignment + 'static,
        F: Function + 'static,
    {
        Self {
            offset,
            assignment: Box::new(assignment),
            query: Box::new(query),
        }
    }
}

/// Destination for [`Executor::exec_onto`]: statement results are applied
/// straight to the caller's metadata and working value.
pub struct AssignmentSink<'a> {
    pub meta: Option<&'a mut Metadata>,
    pub value: &'a mut Value,
}

/// A compiled mapping, executable against a message batch.
pub struct Executor {
    annotation: Option<String>,
    source: String,
    maps: FunctionMap,
    statements: Vec<Statement>,
}

impl Executor {
    /// Create an executor from its named sub-queries and ordered
    /// statements. The source is the program text the statement offsets
    /// point into.
    pub fn new(
        annotation: Option<String>,
        source: impl Into<String>,
        maps: FunctionMap,
        statements: Vec<Statement>,
    ) -> Self {
        Self {
            annotation,
            source: source.into(),
            maps,
            statements,
        }
    }

    /// The annotation describing this mapping, if any
    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }

    /// The named sub-queries contained within the mapping
    pub fn maps(&self) -> &FunctionMap {
        &self.maps
    }

    fn statement_line(&self, stmt: &Statement) -> usize {
        match stmt.offset {
            Some(offset) if !self.source.is_empty() => line_and_col_at(&self.source, offset).0,
            _ => 0,
        }
    }

    /// Shared evaluation loop for the part-addressed entry points: executes
    /// every statement in order against the lazy structured view, applying
    /// results to `root` (and `meta`, when present).
    fn run(
        &self,
        batch: &Batch,
        index: usize,
        lazy: &LazyStructured<'_>,
        vars: &mut VarMap,
        mut meta: Option<&mut Metadata>,
        root: &mut Value,
    ) -> Result<()> {
        for stmt in &self.statements {
            let mut ctx = FunctionContext {
                maps: &self.maps,
                vars: &mut *vars,
                index,
                batch,
                value: Some(lazy),
            };
            let result = match stmt.query.exec(&mut ctx) {
                Ok(value) => value,
                Err(mut err) => {
                    if err.is_no_context()
                        && let Some(parse_err) = lazy.parse_error()
                    {
                        err = Error::NotStructured(Box::new(parse_err.clone()));
                    }
                    return Err(Error::FailedAssignment {
                        line: self.statement_line(stmt),
                        cause: Box::new(err),
                    });
                }
            };
            if matches!(result, Value::Nothing) {
                // Skip assignment entirely
                continue;
            }
            stmt.assignment
                .apply(
                    result,
                    AssignmentContext {
                        maps: &self.maps,
                        vars: &mut *vars,
                        meta: meta.as_deref_mut(),
                        value: &mut *root,
                    },
                )
                .map_err(|err| Error::FailedToAssign {
                    line: self.statement_line(stmt),
                    cause: Box::new(err),
                })?;
        }
        Ok(())
    }

    /// Execute the mapping on a particular index of a batch, expecting the
    /// final root value to be a boolean. Any other final value is a type
    /// error naming the actual type.
    pub fn query_part(&self, index: usize, batch: &Batch) -> Result<bool> {
        let lazy = LazyStructured::new(batch, index);
        let mut vars = VarMap::new();
        let mut root = Value::Nothing;
        self.run(batch, index, &lazy, &mut vars, None, &mut root)?;

        match root {
            Value::Bool(b) => Ok(b),
            other => Err(Error::type_mismatch("bool", &other)),
        }
    }

    /// Execute the mapping on a particular index of a batch, producing a
    /// new part. Returns `None` when the mapping resolves to the delete
    /// sentinel, in which case the part is to be discarded.
    pub fn map_part(&self, index: usize, batch: &Batch) -> Result<Option<Part>> {
        self.map_into(None, index, batch)
    }

    /// Execute the mapping onto an existing part: the working value is
    /// seeded from the part's structured payload (if it parses) and
    /// mutations accumulate on the part rather than a fresh copy.
    pub fn map_onto(&self, part: Part, index: usize, batch: &Batch) -> Result<Option<Part>> {
        self.map_into(Some(part), index, batch)
    }

    fn map_into(
        &self,
        append_to: Option<Part>,
        index: usize,
        batch: &Batch,
    ) -> Result<Option<Part>> {
        let lazy = LazyStructured::new(batch, index);
        let mut root = Value::Nothing;
        let mut part = match append_to {
            Some(part) => {
                if let Ok(json) = part.structured() {
                    root = Value::from_json(json);
                }
                part
            }
            None => batch.part(index).cloned().unwrap_or_default(),
        };

        let mut vars = VarMap::new();
        self.run(
            batch,
            index,
            &lazy,
            &mut vars,
            Some(part.metadata_mut()),
            &mut root,
        )?;

        match root {
            Value::Delete => Ok(None),
            // Do not change the original contents
            Value::Nothing => Ok(Some(part)),
            Value::Str(s) => {
                part.set_bytes(s.into_bytes());
                Ok(Some(part))
            }
            Value::Bytes(b) => {
                part.set_bytes(b);
                Ok(Some(part))
            }
            other => {
                let json = other.to_json().unwrap_or(serde_json::Value::Null);
                part.set_structured(&json)
                    .map_err(|err| Error::SetFailed(err.to_string()))?;
                Ok(Some(part))
            }
        }
    }

    /// Execute with a caller-supplied context and return the final working
    /// value, starting from the nothing sentinel. Metadata assignments are
    /// rejected in this entry point.
    pub fn exec(&self, ctx: &mut FunctionContext<'_>) -> Result<Value> {
        let mut root = Value::Nothing;
        for stmt in &self.statements {
            let result = stmt.query.exec(ctx).map_err(|err| Error::FailedAssignment {
                line: self.statement_line(stmt),
                cause: Box::new(err),
            })?;
            if matches!(result, Value::Nothing) {
                // Skip assignment entirely
                continue;
            }
            stmt.assignment
                .apply(
                    result,
                    AssignmentContext {
                        maps: &self.maps,
                        vars: &mut *ctx.vars,
                        meta: None,
                        value: &mut root,
                    },
                )
                .map_err(|err| Error::FailedToAssign {
                    line: self.statement_line(stmt),
                    cause: Box::new(err),
                })?;
        }
        Ok(root)
    }

    /// Execute with a caller-supplied context, applying each statement's
    /// result directly onto the caller's sink. No local working value.
    pub fn exec_onto(&self, ctx: &mut FunctionContext<'_>, mut onto: AssignmentSink<'_>) -> Result<()> {
        for stmt in &self.statements {
            let result = stmt.query.exec(ctx).map_err(|err| Error::FailedAssignment {
                line: self.statement_line(stmt),
                cause: Box::new(err),
            })?;
            if matches!(result, Value::Nothing) {
                // Skip assignment entirely
                continue;
            }
            stmt.assignment
                .apply(
                    result,
                    AssignmentContext {
                        maps: &self.maps,
                        vars: &mut *ctx.vars,
                        meta: onto.meta.as_deref_mut(),
                        value: &mut *onto.value,
                    },
                )
                .map_err(|err| Error::FailedToAssign {
                    line: self.statement_line(stmt),
                    cause: Box::new(err),
                })?;
        }
        Ok(())
    }

    /// Execute and serialise the result into bytes. A recoverable failure
    /// serialises its fallback value; any other failure yields empty
    /// output.
    pub fn to_bytes(&self, ctx: &mut FunctionContext<'_>) -> Vec<u8> {
        match self.exec(ctx) {
            Ok(value) => value.to_raw_bytes(),
            Err(err) => err.recovered().map(Value::to_raw_bytes).unwrap_or_default(),
        }
    }

    /// Execute and serialise the result into text. A recoverable failure
    /// serialises its fallback value; any other failure yields empty
    /// output.
    pub fn to_raw_string(&self, ctx: &mut FunctionContext<'_>) -> String {
        match self.exec(ctx) {
            Ok(value) => value.to_raw_string(),
            Err(err) => err.recovered().map(Value::to_raw_string).unwrap_or_default(),
        }
    }

    /// The union of query-target paths referenced by the statements. The
    /// maps scope is rebound to this program's maps while collecting; the
    /// caller's context is handed back unchanged.
    pub fn query_targets<'a>(
        &'a self,
        ctx: TargetsContext<'a>,
    ) -> (TargetsContext<'a>, Vec<TargetPath>) {
        let child = TargetsContext { maps: &self.maps };

        let mut paths = Vec::new();
        for stmt in &self.statements {
            let (_, mut stmt_paths) = stmt.query.query_targets(child);
            paths.append(&mut stmt_paths);
        }

        (ctx, paths)
    }

    /// The ordered list of targets assigned to by the statements
    pub fn assignment_targets(&self) -> Vec<TargetPath> {
        self.statements
            .iter()
            .map(|stmt| stmt.assignment.target())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_and_col_of_trailing_clip() {
        let input = "a\nb\nc";
        assert_eq!(line_and_col_of(input, "c"), (3, 1));
        assert_eq!(line_and_col_of(input, "b\nc"), (2, 1));
        assert_eq!(line_and_col_of(input, input), (1, 1));
    }

    #[test]
    fn test_line_and_col_of_mid_line() {
        let input = "first = 1\nsecond = 2";
        assert_eq!(line_and_col_of(input, "= 2"), (2, 8));
    }

    #[test]
    fn test_line_and_col_of_empty_slices() {
        assert_eq!(line_and_col_of("", "clip"), (1, 1));
        assert_eq!(line_and_col_of("a\nb", ""), (1, 1));
    }

    #[test]
    fn test_line_and_col_counts_characters_not_bytes() {
        let input = "käse\nwürst";
        assert_eq!(line_and_col_of(input, "würst"), (2, 1));
    }
}
