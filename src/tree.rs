//! Document trees
//!
//! A [`DocumentTree`] is an immutable, rooted, ordered tree of [`Value`]s.
//! Objects keep insertion order and arrays keep source order. Trees are
//! created per message by an external codec, consumed once by the mapper
//! and discarded afterwards.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::error::Result;

/// Ordered object map
pub type Object = IndexMap<String, Value>;

/// A typed value in a document tree
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent / nil value
    #[default]
    Null,
    /// Boolean scalar
    Bool(bool),
    /// Numeric scalar
    Number(f64),
    /// String scalar
    String(String),
    /// Nested object
    Object(Object),
    /// Array (of objects, for schema-conformant trees)
    Array(Vec<Value>),
}

impl Value {
    /// Returns true for non-structured values
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Object(_) | Value::Array(_))
    }

    /// Returns true for `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) => "object",
            Value::Array(_) => "array",
        }
    }

    /// One-line summary used in diagnostics
    pub fn summary(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) if s.chars().count() > 32 => {
                let head: String = s.chars().take(32).collect();
                format!("\"{}...\"", head)
            }
            Value::String(s) => format!("\"{}\"", s),
            Value::Object(obj) => format!("object with {} field(s)", obj.len()),
            Value::Array(arr) => format!("array of {} element(s)", arr.len()),
        }
    }

    /// Get a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the object map
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Get the array elements
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Look up an object field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|obj| obj.get(key))
    }

    /// Nesting depth: scalars are 0, containers are one more than their deepest child.
    ///
    /// Computed with an explicit stack so arbitrarily deep trees cannot
    /// overflow the call stack.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack: Vec<(&Value, usize)> = vec![(self, 0)];

        while let Some((value, level)) = stack.pop() {
            match value {
                Value::Object(obj) => {
                    max = max.max(level + 1);
                    stack.extend(obj.values().map(|v| (v, level + 1)));
                }
                Value::Array(arr) => {
                    max = max.max(level + 1);
                    stack.extend(arr.iter().map(|v| (v, level + 1)));
                }
                _ => {}
            }
        }

        max
    }

    /// Convert into a JSON value
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Object(obj) => JsonValue::Object(
                obj.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Array(arr) => JsonValue::Array(arr.iter().map(Value::to_json).collect()),
        }
    }
}

/// Render a number the way the operator library prints it: integral
/// values without a fractional part.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn number_to_json(n: f64) -> JsonValue {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 {
        JsonValue::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null)
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(arr) => Value::Array(arr.into_iter().map(Value::from).collect()),
            JsonValue::Object(obj) => {
                Value::Object(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        JsonValue::deserialize(deserializer).map(Value::from)
    }
}

/// Immutable rooted document tree
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTree {
    root: Value,
}

impl DocumentTree {
    /// Create a tree from its root value
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Create a tree from a JSON value
    pub fn from_json(json: JsonValue) -> Self {
        Self::new(Value::from(json))
    }

    /// Parse a tree from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        let json: JsonValue = serde_json::from_str(text)?;
        Ok(Self::from_json(json))
    }

    /// Get the root value
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Consume the tree, returning its root value
    pub fn into_root(self) -> Value {
        self.root
    }

    /// Convert into a JSON value
    pub fn to_json(&self) -> JsonValue {
        self.root.to_json()
    }

    /// Serialize to JSON text
    pub fn to_json_string(&self, pretty: bool) -> Result<String> {
        let json = self.to_json();
        let text = if pretty {
            serde_json::to_string_pretty(&json)?
        } else {
            serde_json::to_string(&json)?
        };
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_preserves_order() {
        let tree = DocumentTree::from_json(json!({"b": 1, "a": 2, "c": 3}));
        let keys: Vec<_> = tree.root().as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_to_json_integral_numbers() {
        let value = Value::Number(6.0);
        assert_eq!(value.to_json(), json!(6));
        assert_eq!(Value::Number(2.5).to_json(), json!(2.5));
        assert_eq!(Value::Number(f64::NAN).to_json(), JsonValue::Null);
    }

    #[test]
    fn test_depth() {
        assert_eq!(Value::from("x").depth(), 0);
        let tree = DocumentTree::from_json(json!({"a": [{"b": {"c": 1}}]}));
        assert_eq!(tree.root().depth(), 4);
    }

    #[test]
    fn test_depth_of_very_deep_tree() {
        let mut value = Value::Null;
        for _ in 0..50_000 {
            value = Value::Array(vec![value]);
        }
        assert_eq!(value.depth(), 50_000);
        // Unwind without recursive drop
        let mut current = value;
        while let Value::Array(mut arr) = current {
            current = arr.pop().unwrap_or(Value::Null);
        }
    }

    #[test]
    fn test_summary() {
        assert_eq!(Value::from("abc").summary(), "\"abc\"");
        assert_eq!(Value::Number(3.0).summary(), "3");
        assert_eq!(Value::Array(vec![]).summary(), "array of 0 element(s)");
        assert!(Value::from("x".repeat(40)).summary().ends_with("...\""));
    }

    #[test]
    fn test_json_string_round_trip() {
        let text = r#"{"lead":[{"ID":"00Q1"}],"flag":true}"#;
        let tree = DocumentTree::from_json_str(text).unwrap();
        assert_eq!(tree.to_json_string(false).unwrap(), text);
    }
}
