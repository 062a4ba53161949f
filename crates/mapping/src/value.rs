//! The value lattice threaded through a mapping execution

use std::collections::HashMap;

/// An untyped value produced and consumed by mapping queries.
///
/// Beyond the JSON shapes and raw byte strings, two sentinels steer the
/// executor: [`Value::Nothing`] skips the statement's assignment entirely,
/// and [`Value::Delete`] discards the mapped part when it ends up at the
/// root.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Object(HashMap<String, Value>),
    /// A query result that assigns nothing
    Nothing,
    /// Discard the mapped part
    Delete,
}

impl Value {
    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Nothing => "nothing",
            Value::Delete => "delete",
        }
    }

    /// Build a value from a parsed JSON document
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Render as a JSON document. The sentinels have no JSON form; byte
    /// strings render lossily as text.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            Value::Nothing | Value::Delete => None,
            Value::Null => Some(serde_json::Value::Null),
            Value::Bool(b) => Some(serde_json::Value::Bool(*b)),
            Value::Integer(i) => Some(serde_json::Value::Number((*i).into())),
            Value::Float(f) => Some(
                serde_json::Number::from_f64(*f)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
            ),
            Value::Str(s) => Some(serde_json::Value::String(s.clone())),
            Value::Bytes(b) => Some(serde_json::Value::String(
                String::from_utf8_lossy(b).into_owned(),
            )),
            Value::Array(items) => Some(serde_json::Value::Array(
                items
                    .iter()
                    .map(|v| v.to_json().unwrap_or(serde_json::Value::Null))
                    .collect(),
            )),
            Value::Object(map) => Some(serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json().unwrap_or(serde_json::Value::Null)))
                    .collect(),
            )),
        }
    }

    /// Serialise for raw output: strings and byte strings pass through
    /// unchanged, the sentinels produce nothing, everything else is JSON.
    pub fn to_raw_bytes(&self) -> Vec<u8> {
        match self {
            Value::Str(s) => s.clone().into_bytes(),
            Value::Bytes(b) => b.clone(),
            Value::Nothing | Value::Delete => Vec::new(),
            other => other
                .to_json()
                .map(|json| json.to_string().into_bytes())
                .unwrap_or_default(),
        }
    }

    /// Serialise for raw text output, mirroring [`Value::to_raw_bytes`]
    pub fn to_raw_string(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            Value::Nothing | Value::Delete => String::new(),
            other => other
                .to_json()
                .map(|json| json.to_string())
                .unwrap_or_default(),
        }
    }
}
