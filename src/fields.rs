//! Constrained value model for structured log, audit, and event payloads
//!
//! Details/context maps are a closed union instead of arbitrary JSON so that
//! redaction and truncation can recurse over every possible shape.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordered string-keyed map used for details, context, and metadata
pub type Fields = BTreeMap<String, FieldValue>;

/// A single structured value: scalar or nested map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    Str(String),
    /// Nested map of values
    Map(Fields),
}

impl FieldValue {
    /// Borrow the string content, if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the nested map, if this is a map value
    pub fn as_map(&self) -> Option<&Fields> {
        match self {
            FieldValue::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Int(value as i64)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<Fields> for FieldValue {
    fn from(value: Fields) -> Self {
        FieldValue::Map(value)
    }
}

/// Build a [`Fields`] map from `key => value` pairs
///
/// ```
/// use taskmon::fields;
///
/// let f = fields! { "task_id" => 42, "status" => "done" };
/// assert_eq!(f.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => { $crate::fields::Fields::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::fields::Fields::new();
        $(map.insert($key.to_string(), $crate::fields::FieldValue::from($value));)+
        map
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_macro() {
        let f = fields! { "a" => 1, "b" => "two", "c" => true };
        assert_eq!(f.get("a"), Some(&FieldValue::Int(1)));
        assert_eq!(f.get("b"), Some(&FieldValue::Str("two".to_string())));
        assert_eq!(f.get("c"), Some(&FieldValue::Bool(true)));
    }

    #[test]
    fn test_empty_fields_macro() {
        let f = fields! {};
        assert!(f.is_empty());
    }

    #[test]
    fn test_nested_map() {
        let inner = fields! { "token" => "t" };
        let outer = fields! { "nested" => inner };
        assert!(outer.get("nested").unwrap().as_map().is_some());
    }

    #[test]
    fn test_untagged_serialization() {
        let f = fields! { "count" => 3, "name" => "sync", "ratio" => 0.5 };
        let json = serde_json::to_string(&f).unwrap();
        assert_eq!(json, r#"{"count":3,"name":"sync","ratio":0.5}"#);

        let back: Fields = serde_json::from_str(&json).unwrap();
        assert_eq!(back, f);
    }

    #[test]
    fn test_as_str() {
        assert_eq!(FieldValue::Str("x".to_string()).as_str(), Some("x"));
        assert_eq!(FieldValue::Int(1).as_str(), None);
    }
}
