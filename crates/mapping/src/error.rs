//! Error types for the mapping interpreter

use crate::value::Value;
use thiserror::Error;

/// Result type for mapping operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while executing a mapping
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Free-form query failure
    #[error("{0}")]
    Query(String),

    /// A query referenced the structured message view but the execution
    /// context carries none
    #[error("context was undefined")]
    NoContext,

    /// The target message part does not exist
    #[error("message is empty")]
    EmptyMessage,

    /// The target message part could not be parsed as structured data
    #[error("parse as json: {0}")]
    Parse(String),

    /// A query needed the structured view of a message that failed to
    /// parse; chains the parse failure for diagnosability
    #[error("unable to reference message as structured (with `this`): {0}")]
    NotStructured(#[source] Box<Error>),

    /// A value had the wrong type, naming the actual type found
    #[error("expected {expected} value, found {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// A query referenced an unbound variable
    #[error("variable `{0}` is undefined")]
    Variable(String),

    /// A metadata assignment ran in a context without metadata
    #[error("unable to assign metadata in the current context")]
    NoMetadataContext,

    /// A failure carrying a usable fallback value; serialising entry
    /// points emit the fallback instead of empty output
    #[error("{cause}")]
    Recoverable {
        recovered: Box<Value>,
        #[source]
        cause: Box<Error>,
    },

    /// A statement's query failed
    #[error("failed assignment (line {line}): {cause}")]
    FailedAssignment {
        line: usize,
        #[source]
        cause: Box<Error>,
    },

    /// A statement's assignment failed
    #[error("failed to assign result (line {line}): {cause}")]
    FailedToAssign {
        line: usize,
        #[source]
        cause: Box<Error>,
    },

    /// The mapped result could not be written onto the part
    #[error("failed to set result of mapping: {0}")]
    SetFailed(String),
}

impl Error {
    /// A type error naming the actual type of `actual` against what was
    /// expected.
    pub fn type_mismatch(expected: &str, actual: &Value) -> Self {
        Error::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.type_name().to_string(),
        }
    }

    /// Wrap a failure with a fallback value
    pub fn recoverable(recovered: Value, cause: Error) -> Self {
        Error::Recoverable {
            recovered: Box::new(recovered),
            cause: Box::new(cause),
        }
    }

    /// Whether this error, or any cause it wraps, is [`Error::NoContext`]
    pub fn is_no_context(&self) -> bool {
        match self {
            Error::NoContext => true,
            Error::Recoverable { cause, .. } => cause.is_no_context(),
            _ => false,
        }
    }

    /// The fallback value carried by a recoverable failure, however deeply
    /// wrapped.
    pub fn recovered(&self) -> Option<&Value> {
        match self {
            Error::Recoverable { recovered, .. } => Some(recovered),
            Error::FailedAssignment { cause, .. } | Error::FailedToAssign { cause, .. } => {
                cause.recovered()
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_names_actual_type() {
        let err = Error::type_mismatch("bool", &Value::Str("yes".to_string()));
        assert_eq!(err.to_string(), "expected bool value, found string");
    }

    #[test]
    fn test_recovered_walks_wrapping() {
        let err = Error::FailedAssignment {
            line: 3,
            cause: Box::new(Error::recoverable(
                Value::Integer(1),
                Error::Query("boom".to_string()),
            )),
        };
        assert_eq!(err.recovered(), Some(&Value::Integer(1)));
        assert!(!err.is_no_context());
    }

    #[test]
    fn test_is_no_context_walks_recoverable() {
        let err = Error::recoverable(Value::Null, Error::NoContext);
        assert!(err.is_no_context());
    }
}
