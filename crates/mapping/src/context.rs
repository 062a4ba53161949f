//! Execution contexts threaded through queries and assignments

use crate::error::{Error, Result};
use crate::query::Function;
use crate::value::Value;
use sluice_message::{Batch, Metadata};
use std::cell::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;

/// Named sub-queries shared read-only by every statement of a program
pub type FunctionMap = HashMap<String, Arc<dyn Function>>;

/// Per-run variable bindings, isolated between runs
pub type VarMap = HashMap<String, Value>;

/// Lazily materialised structured view of the target message part.
///
/// Parsing happens at most once per execution: success and failure are both
/// cached for the rest of the run, so a query that never references the
/// view never triggers a parse, and repeated references never re-parse.
pub struct LazyStructured<'a> {
    batch: &'a Batch,
    index: usize,
    cell: OnceCell<std::result::Result<Value, Error>>,
}

impl<'a> LazyStructured<'a> {
    /// Create an unparsed view over `batch[index]`
    pub fn new(batch: &'a Batch, index: usize) -> Self {
        Self {
            batch,
            index,
            cell: OnceCell::new(),
        }
    }

    /// The parsed view, parsing on first demand
    pub fn get(&self) -> Result<&Value> {
        self.cell
            .get_or_init(|| self.parse())
            .as_ref()
            .map_err(|err| err.clone())
    }

    fn parse(&self) -> std::result::Result<Value, Error> {
        match self.batch.structured(self.index) {
            Ok(json) => Ok(Value::from_json(json)),
            Err(sluice_message::Error::PartNotExist { .. }) => Err(Error::EmptyMessage),
            Err(err) => Err(Error::Parse(err.to_string())),
        }
    }

    /// The cached parse failure, if parsing was attempted and failed
    pub fn parse_error(&self) -> Option<&Error> {
        match self.cell.get() {
            Some(Err(err)) => Some(err),
            _ => None,
        }
    }
}

/// Context handed to a query function during execution.
pub struct FunctionContext<'a> {
    /// Named sub-queries in scope
    pub maps: &'a FunctionMap,

    /// Mutable per-run variables
    pub vars: &'a mut VarMap,

    /// Index of the target part within the batch
    pub index: usize,

    /// The batch under execution
    pub batch: &'a Batch,

    /// Structured view of the target part, when the entry point provides
    /// one
    pub value: Option<&'a LazyStructured<'a>>,
}

impl FunctionContext<'_> {
    /// The structured view of the target part. Fails with
    /// [`Error::NoContext`] when the context carries no view or the view
    /// failed to parse; the executor recovers the cached parse failure and
    /// chains it.
    pub fn structured(&self) -> Result<&Value> {
        match self.value {
            Some(lazy) => lazy.get().map_err(|_| Error::NoContext),
            None => Err(Error::NoContext),
        }
    }
}

/// Context handed to an assignment when a statement's result is applied.
pub struct AssignmentContext<'a> {
    /// Named sub-queries in scope
    pub maps: &'a FunctionMap,

    /// Mutable per-run variables
    pub vars: &'a mut VarMap,

    /// Metadata of the part being built, when the entry point exposes it
    pub meta: Option<&'a mut Metadata>,

    /// The working value of the run
    pub value: &'a mut Value,
}

/// Context for statically enumerating the paths a query references.
#[derive(Clone, Copy)]
pub struct TargetsContext<'a> {
    /// Named sub-queries in scope
    pub maps: &'a FunctionMap,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_message::Part;

    #[test]
    fn test_lazy_parse_memoises_failure() {
        let batch = Batch::new(vec![Part::new(b"not json".to_vec())]);
        let lazy = LazyStructured::new(&batch, 0);

        assert!(lazy.parse_error().is_none());
        assert!(matches!(lazy.get(), Err(Error::Parse(_))));
        assert!(matches!(lazy.parse_error(), Some(Error::Parse(_))));
        // A second demand reuses the cached outcome.
        assert!(matches!(lazy.get(), Err(Error::Parse(_))));
    }

    #[test]
    fn test_lazy_parse_of_missing_part_is_empty_message() {
        let batch = Batch::default();
        let lazy = LazyStructured::new(&batch, 0);
        assert!(matches!(lazy.get(), Err(Error::EmptyMessage)));
    }

    #[test]
    fn test_lazy_parse_success() {
        let batch = Batch::new(vec![Part::new(b"{\"n\":2}".to_vec())]);
        let lazy = LazyStructured::new(&batch, 0);
        let Value::Object(map) = lazy.get().unwrap() else {
            panic!("expected object");
        };
        assert_eq!(map["n"], Value::Integer(2));
    }
}
