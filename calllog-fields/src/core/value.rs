//! Values that can be stored in a record draft.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single value in an [`AttributeMap`](super::AttributeMap).
///
/// Absence is represented by the key not being present in the map; `Null`
/// is an explicit null that the store receives as such.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    /// Explicit null
    Null,
    /// 64-bit signed integer
    Integer(i64),
    /// UTF-8 text
    Text(String),
    /// Opaque bytes
    Bytes(Vec<u8>),
}

impl FieldValue {
    /// Returns true for [`FieldValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Returns the integer payload, if this is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the text payload, if this is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Interprets the value as an integer the way the store would: integers
    /// as-is, text if it parses.
    pub fn to_i64_lossy(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            FieldValue::Text(v) => v.trim().parse().ok(),
            FieldValue::Null | FieldValue::Bytes(_) => None,
        }
    }

    /// Short name of the variant, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Integer(_) => "integer",
            FieldValue::Text(_) => "text",
            FieldValue::Bytes(_) => "bytes",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "NULL"),
            FieldValue::Integer(v) => write!(f, "{v}"),
            FieldValue::Text(v) => write!(f, "'{v}'"),
            FieldValue::Bytes(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

/// Floats are truncated toward zero; NaN becomes 0 and infinities saturate.
impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Integer(value as i64)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        FieldValue::Bytes(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(FieldValue::from(true), FieldValue::Integer(1));
        assert_eq!(FieldValue::from(12.9_f64), FieldValue::Integer(12));
        assert_eq!(FieldValue::from(f64::NAN), FieldValue::Integer(0));
        assert_eq!(FieldValue::from(None::<i64>), FieldValue::Null);
        assert_eq!(FieldValue::from("abc"), FieldValue::Text("abc".into()));
    }

    #[test]
    fn test_lossy_integer() {
        assert_eq!(FieldValue::from(" 42 ").to_i64_lossy(), Some(42));
        assert_eq!(FieldValue::from("x").to_i64_lossy(), None);
        assert_eq!(FieldValue::Null.to_i64_lossy(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldValue::Null.to_string(), "NULL");
        assert_eq!(FieldValue::Bytes(vec![1, 2]).to_string(), "<2 bytes>");
    }
}
