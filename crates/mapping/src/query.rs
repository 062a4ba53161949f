//! Query functions executed by mapping statements

use crate::arith;
use crate::context::{FunctionContext, TargetsContext};
use crate::error::{Error, Result};
use crate::value::Value;
use std::sync::Arc;

/// Kind of path a query reads or an assignment writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// The structured message document
    Value,
    /// A per-run variable
    Variable,
    /// A metadata key
    Metadata,
}

/// A dotted path into one of the addressable target spaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPath {
    pub kind: TargetKind,
    pub path: Vec<String>,
}

impl TargetPath {
    pub fn new(kind: TargetKind, path: Vec<String>) -> Self {
        Self { kind, path }
    }
}

/// A compiled query expression.
pub trait Function: Send + Sync {
    /// Evaluate against an execution context
    fn exec(&self, ctx: &mut FunctionContext<'_>) -> Result<Value>;

    /// Paths this query references, for static analysis
    fn query_targets<'a>(&self, ctx: TargetsContext<'a>) -> (TargetsContext<'a>, Vec<TargetPath>) {
        (ctx, Vec::new())
    }
}

/// A constant value
pub struct Literal(pub Value);

impl Function for Literal {
    fn exec(&self, _ctx: &mut FunctionContext<'_>) -> Result<Value> {
        Ok(self.0.clone())
    }
}

/// A read of the target message's structured view, optionally descending a
/// dotted path (`this`, `this.a.b`). A missing field resolves to null.
pub struct FieldFunction {
    path: Vec<String>,
}

impl FieldFunction {
    /// The whole document (`this`)
    pub fn root() -> Self {
        Self { path: Vec::new() }
    }

    /// A descent into the document (`this.a.b`)
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

impl Function for FieldFunction {
    fn exec(&self, ctx: &mut FunctionContext<'_>) -> Result<Value> {
        let mut value = ctx.structured()?;
        for segment in &self.path {
            value = match value {
                Value::Object(map) => map.get(segment).unwrap_or(&Value::Null),
                _ => &Value::Null,
            };
        }
        Ok(value.clone())
    }

    fn query_targets<'a>(&self, ctx: TargetsContext<'a>) -> (TargetsContext<'a>, Vec<TargetPath>) {
        (
            ctx,
            vec![TargetPath::new(TargetKind::Value, self.path.clone())],
        )
    }
}

/// A read of a per-run variable
pub struct VarFunction {
    name: String,
}

impl VarFunction {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Function for VarFunction {
    fn exec(&self, ctx: &mut FunctionContext<'_>) -> Result<Value> {
        ctx.vars
            .get(&self.name)
            .cloned()
            .ok_or_else(|| Error::Variable(self.name.clone()))
    }

    fn query_targets<'a>(&self, ctx: TargetsContext<'a>) -> (TargetsContext<'a>, Vec<TargetPath>) {
        (
            ctx,
            vec![TargetPath::new(
                TargetKind::Variable,
                vec![self.name.clone()],
            )],
        )
    }
}

/// A read of the target part's metadata; a missing key resolves to null
pub struct MetaFunction {
    key: String,
}

impl MetaFunction {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Function for MetaFunction {
    fn exec(&self, ctx: &mut FunctionContext<'_>) -> Result<Value> {
        let value = ctx
            .batch
            .part(ctx.index)
            .and_then(|part| part.metadata().get(&self.key))
            .map(|v| Value::Str(v.to_string()))
            .unwrap_or(Value::Null);
        Ok(value)
    }

    fn query_targets<'a>(&self, ctx: TargetsContext<'a>) -> (TargetsContext<'a>, Vec<TargetPath>) {
        (
            ctx,
            vec![TargetPath::new(TargetKind::Metadata, vec![self.key.clone()])],
        )
    }
}

/// The `deleted()` marker: discard the mapped part
pub struct Deleted;

impl Function for Deleted {
    fn exec(&self, _ctx: &mut FunctionContext<'_>) -> Result<Value> {
        Ok(Value::Delete)
    }
}

/// Binary arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// Binary arithmetic over two sub-queries
pub struct Arithmetic {
    lhs: Arc<dyn Function>,
    op: ArithmeticOp,
    rhs: Arc<dyn Function>,
}

impl Arithmetic {
    pub fn new(lhs: Arc<dyn Function>, op: ArithmeticOp, rhs: Arc<dyn Function>) -> Self {
        Self { lhs, op, rhs }
    }
}

impl Function for Arithmetic {
    fn exec(&self, ctx: &mut FunctionContext<'_>) -> Result<Value> {
        let left = self.lhs.exec(ctx)?;
        let right = self.rhs.exec(ctx)?;
        match self.op {
            ArithmeticOp::Add => arith::add(&left, &right),
            ArithmeticOp::Subtract => arith::subtract(&left, &right),
            ArithmeticOp::Multiply => arith::multiply(&left, &right),
            ArithmeticOp::Divide => arith::divide(&left, &right),
        }
    }

    fn query_targets<'a>(&self, ctx: TargetsContext<'a>) -> (TargetsContext<'a>, Vec<TargetPath>) {
        let (ctx, mut paths) = self.lhs.query_targets(ctx);
        let (ctx, mut rhs_paths) = self.rhs.query_targets(ctx);
        paths.append(&mut rhs_paths);
        (ctx, paths)
    }
}

/// Caller-supplied query logic
pub struct Closure<F> {
    f: F,
}

impl<F> Closure<F>
where
    F: Fn(&mut FunctionContext<'_>) -> Result<Value> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Function for Closure<F>
where
    F: Fn(&mut FunctionContext<'_>) -> Result<Value> + Send + Sync,
{
    fn exec(&self, ctx: &mut FunctionContext<'_>) -> Result<Value> {
        (self.f)(ctx)
    }
}
