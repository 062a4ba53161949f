//! Assignment targets for mapping statements

use crate::context::AssignmentContext;
use crate::error::{Error, Result};
use crate::query::{TargetKind, TargetPath};
use crate::value::Value;
use std::collections::HashMap;

/// Destination of a statement's query result.
pub trait Assignment: Send + Sync {
    /// Apply a query result to the destination
    fn apply(&self, value: Value, ctx: AssignmentContext<'_>) -> Result<()>;

    /// The path this assignment writes
    fn target(&self) -> TargetPath;
}

/// Assignment into the working value (`root`, `root.a.b`).
///
/// Intermediate objects are created as the path is descended; assigning
/// [`Value::Delete`] removes the addressed field, or replaces the whole
/// working value when the path is empty.
pub struct RootAssignment {
    path: Vec<String>,
}

impl RootAssignment {
    /// The whole working value (`root`)
    pub fn root() -> Self {
        Self { path: Vec::new() }
    }

    /// A keyed path under the working value (`root.a.b`)
    pub fn new<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
        }
    }
}

impl Assignment for RootAssignment {
    fn apply(&self, value: Value, ctx: AssignmentContext<'_>) -> Result<()> {
        set_at_path(ctx.value, &self.path, value);
        Ok(())
    }

    fn target(&self) -> TargetPath {
        TargetPath::new(TargetKind::Value, self.path.clone())
    }
}

fn set_at_path(root: &mut Value, path: &[String], value: Value) {
    let Some((head, rest)) = path.split_first() else {
        *root = value;
        return;
    };
    // A keyed write lands in an object; any other shape (including the
    // Nothing seed) is displaced by a fresh one.
    if !matches!(root, Value::Object(_)) {
        *root = Value::Object(HashMap::new());
    }
    if let Value::Object(map) = root {
        if rest.is_empty() && matches!(value, Value::Delete) {
            map.remove(head);
        } else {
            set_at_path(
                map.entry(head.clone()).or_insert(Value::Null),
                rest,
                value,
            );
        }
    }
}

/// Assignment into a per-run variable (`let x`)
pub struct VarAssignment {
    name: String,
}

impl VarAssignment {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Assignment for VarAssignment {
    fn apply(&self, value: Value, ctx: AssignmentContext<'_>) -> Result<()> {
        ctx.vars.insert(self.name.clone(), value);
        Ok(())
    }

    fn target(&self) -> TargetPath {
        TargetPath::new(TargetKind::Variable, vec![self.name.clone()])
    }
}

/// Assignment into the part's metadata (`meta key`).
///
/// Requires a metadata context; entry points that carry none reject the
/// assignment. Assigning [`Value::Delete`] removes the key; any other
/// value is stored in its raw string form.
pub struct MetaAssignment {
    key: String,
}

impl MetaAssignment {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Assignment for MetaAssignment {
    fn apply(&self, value: Value, ctx: AssignmentContext<'_>) -> Result<()> {
        let meta = ctx.meta.ok_or(Error::NoMetadataContext)?;
        match value {
            Value::Delete => {
                meta.remove(&self.key);
            }
            other => meta.insert(self.key.clone(), other.to_raw_string()),
        }
        Ok(())
    }

    fn target(&self) -> TargetPath {
        TargetPath::new(TargetKind::Metadata, vec![self.key.clone()])
    }
}
