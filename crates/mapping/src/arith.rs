//! Arithmetic operations over mapping values
//!
//! Free functions in the style of a value evaluator: the [`Value`] type
//! stays pure data and the operators live here. Null propagates, integers
//! stay integers while both operands are integers, and any numeric mix
//! falls back to floats.

use crate::error::{Error, Result};
use crate::value::Value;

fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

fn numeric_mismatch(op_name: &str, left: &Value, right: &Value) -> Error {
    Error::TypeMismatch {
        expected: format!("numeric operands for {op_name}"),
        actual: format!("{} and {}", left.type_name(), right.type_name()),
    }
}

/// Performs addition on two values; strings concatenate
pub fn add(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (Value::Integer(a), Value::Integer(b)) => a
            .checked_add(*b)
            .map(Value::Integer)
            .ok_or_else(|| Error::Query("integer overflow in addition".to_string())),
        _ => match (to_f64(left), to_f64(right)) {
            (Some(a), Some(b)) => Ok(Value::Float(a + b)),
            _ => Err(numeric_mismatch("addition", left, right)),
        },
    }
}

/// Performs subtraction on two values
pub fn subtract(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Integer(a), Value::Integer(b)) => a
            .checked_sub(*b)
            .map(Value::Integer)
            .ok_or_else(|| Error::Query("integer overflow in subtraction".to_string())),
        _ => match (to_f64(left), to_f64(right)) {
            (Some(a), Some(b)) => Ok(Value::Float(a - b)),
            _ => Err(numeric_mismatch("subtraction", left, right)),
        },
    }
}

/// Performs multiplication on two values
pub fn multiply(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Integer(a), Value::Integer(b)) => a
            .checked_mul(*b)
            .map(Value::Integer)
            .ok_or_else(|| Error::Query("integer overflow in multiplication".to_string())),
        _ => match (to_f64(left), to_f64(right)) {
            (Some(a), Some(b)) => Ok(Value::Float(a * b)),
            _ => Err(numeric_mismatch("multiplication", left, right)),
        },
    }
}

/// Performs division on two values; integer division stays integral
pub fn divide(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Integer(a), Value::Integer(b)) => {
            if *b == 0 {
                return Err(Error::Query("division by zero".to_string()));
            }
            Ok(Value::Integer(a / b))
        }
        _ => match (to_f64(left), to_f64(right)) {
            (Some(a), Some(b)) => {
                if b == 0.0 {
                    return Err(Error::Query("division by zero".to_string()));
                }
                Ok(Value::Float(a / b))
            }
            _ => Err(numeric_mismatch("division", left, right)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_addition() {
        assert_eq!(
            add(&Value::Integer(2), &Value::Integer(1)).unwrap(),
            Value::Integer(3)
        );
    }

    #[test]
    fn test_mixed_numeric_promotes_to_float() {
        assert_eq!(
            add(&Value::Integer(2), &Value::Float(0.5)).unwrap(),
            Value::Float(2.5)
        );
        assert_eq!(
            multiply(&Value::Float(1.5), &Value::Integer(2)).unwrap(),
            Value::Float(3.0)
        );
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(
            add(
                &Value::Str("foo".to_string()),
                &Value::Str("bar".to_string())
            )
            .unwrap(),
            Value::Str("foobar".to_string())
        );
    }

    #[test]
    fn test_null_propagates() {
        assert_eq!(add(&Value::Null, &Value::Integer(1)).unwrap(), Value::Null);
    }

    #[test]
    fn test_division_by_zero() {
        assert!(divide(&Value::Integer(1), &Value::Integer(0)).is_err());
    }

    #[test]
    fn test_non_numeric_operands_name_types() {
        let err = subtract(&Value::Bool(true), &Value::Integer(1)).unwrap_err();
        assert!(err.to_string().contains("bool and integer"));
    }
}
