//! Structural deep equality over record values.
//!
//! Deep equality decides whether an incoming write changes a stored record.
//! It never fails: differing shapes are simply unequal.
//!
//! Rules:
//! - Equal primitives are equal. Integers and floats compare numerically,
//!   so `1` and `1.0` are the same value.
//! - One side absent (or null) and the other present is unequal.
//! - Values of different kinds are unequal (an array never equals a map,
//!   even with "the same" contents).
//! - Arrays are equal when they have the same length and equal elements
//!   at every position.
//! - Maps are equal when they have the same key set and equal values for
//!   every key.

use crate::value::{float_as_integer, Document, Value};

/// Compares two optional values structurally.
///
/// `None` stands for an absent value (a missing field or missing record).
/// Two absent values are the same; an absent and a present value are not.
pub fn is_same(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => values_equal(a, b),
        _ => false,
    }
}

/// Compares two documents structurally.
pub fn documents_equal(a: &Document, b: &Document) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(key, value)| b.get(key).is_some_and(|other| values_equal(value, other)))
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Integer(i), Value::Float(f)) | (Value::Float(f), Value::Integer(i)) => {
            float_as_integer(*f) == Some(*i)
        }
        (Value::Text(x), Value::Text(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b))
        }
        (Value::Map(x), Value::Map(y)) => documents_equal(x, y),
        _ => false,
    }
}

impl Value {
    /// Structural equality with numeric unification of integers and floats.
    ///
    /// Unlike `==`, `Value::Integer(1).is_same(&Value::Float(1.0))` is true.
    pub fn is_same(&self, other: &Value) -> bool {
        values_equal(self, other)
    }
}
