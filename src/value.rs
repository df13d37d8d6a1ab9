//! Scalar property values and their query-literal rendering.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;

use serde::{Deserialize, Serialize};

/// Typed scalar value carried by node and edge properties and by named
/// query parameters.
///
/// The variant set is closed: the remote store only round-trips
/// scalars, so collections are deliberately not representable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Value {
    /// Absent value, rendered as the `null` literal.
    Null,
    /// Boolean literal.
    Bool(bool),
    /// Signed 64-bit integer literal.
    Int(i64),
    /// 64-bit floating point literal.
    Float(f64),
    /// UTF-8 string literal.
    Text(String),
    /// Binary payload; decoded to text before rendering.
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns whether this is the null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Renders the value into its query-language literal form.
    ///
    /// Text is double-quoted idempotently: a leading or trailing quote
    /// is added only where one is not already present, so feeding a
    /// rendered literal back through changes nothing.
    pub fn to_literal(&self) -> String {
        match self {
            Value::Null => "null".to_owned(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => quote(s),
            Value::Bytes(b) => quote(&String::from_utf8_lossy(b)),
        }
    }
}

fn quote(v: &str) -> String {
    if v.is_empty() {
        return "\"\"".to_owned();
    }
    let mut out = String::with_capacity(v.len() + 2);
    if !v.starts_with('"') {
        out.push('"');
    }
    out.push_str(v);
    if !v.ends_with('"') {
        out.push('"');
    }
    out
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_literal())
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            // Floats hash by bit pattern; NaN payloads differing in bits
            // hash apart, which is consistent with their inequality.
            Value::Float(f) => f.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
            Value::Bytes(b) => b.hash(state),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
