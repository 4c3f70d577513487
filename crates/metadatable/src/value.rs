//! Runtime values for metadata and record attributes.
//!
//! Stored metadata is always text. [`MetaValue`] is what that text becomes
//! once it has been coerced to its declared type, and what callers hand in
//! before a row is serialized again.

use chrono::NaiveDateTime;
use serde_json::Value;
use std::fmt;

/// The only date-time layout rows are stored with.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Runtime representation of an attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    /// Absent or explicitly null.
    Null,

    Int(i64),

    Float(f64),

    String(String),

    Bool(bool),

    /// Decoded `object` payload. JSON objects stay objects; any other JSON
    /// document is kept as decoded.
    Object(Value),

    /// Naive wall-clock time, matching the stored layout which carries no zone.
    DateTime(NaiveDateTime),

    /// Decoded `array` / `json` payload: an ordered list or a keyed map.
    Json(Value),

    Collection(Collection),
}

impl MetaValue {
    /// Whether this value counts as "empty" for host fallback purposes.
    ///
    /// Mirrors loose-language emptiness: null, `0`, `0.0`, `""`, `"0"`,
    /// `false` and empty lists/maps are empty. Objects, collections and
    /// date-times never are.
    pub fn is_empty(&self) -> bool {
        match self {
            MetaValue::Null => true,
            MetaValue::Int(v) => *v == 0,
            MetaValue::Float(v) => *v == 0.0,
            MetaValue::String(s) => s.is_empty() || s == "0",
            MetaValue::Bool(v) => !*v,
            MetaValue::Object(v) => matches!(v, Value::Null) || is_empty_array(v),
            MetaValue::Json(v) => json_is_empty(v),
            MetaValue::DateTime(_) | MetaValue::Collection(_) => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, MetaValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetaValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetaValue::Float(v) => Some(*v),
            MetaValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetaValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            MetaValue::DateTime(v) => Some(*v),
            _ => None,
        }
    }

    /// Borrow the decoded document of an `object`, `array`/`json` or
    /// `collection` value.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            MetaValue::Object(v) | MetaValue::Json(v) => Some(v),
            MetaValue::Collection(c) => Some(c.as_value()),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            MetaValue::Collection(c) => Some(c),
            _ => None,
        }
    }

    /// Convert to a JSON document, as used when encoding container payloads.
    pub fn to_json(&self) -> Value {
        match self {
            MetaValue::Null => Value::Null,
            MetaValue::Int(v) => Value::from(*v),
            MetaValue::Float(v) => Value::from(*v),
            MetaValue::String(s) => Value::String(s.clone()),
            MetaValue::Bool(v) => Value::Bool(*v),
            MetaValue::Object(v) | MetaValue::Json(v) => v.clone(),
            MetaValue::DateTime(dt) => Value::String(dt.format(DATETIME_FORMAT).to_string()),
            MetaValue::Collection(c) => c.as_value().clone(),
        }
    }

    /// Plain text form of the value, or `None` for null.
    ///
    /// Booleans become `"1"` / `"0"`; containers are written as JSON.
    pub fn to_text(&self) -> Option<String> {
        match self {
            MetaValue::Null => None,
            MetaValue::Int(v) => Some(v.to_string()),
            MetaValue::Float(v) => Some(v.to_string()),
            MetaValue::String(s) => Some(s.clone()),
            MetaValue::Bool(v) => Some(if *v { "1" } else { "0" }.to_string()),
            MetaValue::DateTime(dt) => Some(dt.format(DATETIME_FORMAT).to_string()),
            other => Some(other.to_json().to_string()),
        }
    }

    /// Loose comparison against a lookup key.
    ///
    /// Keys are matched the way a weakly typed column compares with a
    /// string: numbers compare numerically when the key is numeric,
    /// booleans compare by truthiness.
    pub fn loosely_equals(&self, key: &str) -> bool {
        match self {
            MetaValue::Null => key.is_empty(),
            MetaValue::String(s) => {
                if s == key {
                    return true;
                }
                match (s.trim().parse::<f64>(), key.trim().parse::<f64>()) {
                    (Ok(a), Ok(b)) => a == b,
                    _ => false,
                }
            }
            MetaValue::Int(v) => match key.trim().parse::<f64>() {
                Ok(k) => *v as f64 == k,
                Err(_) => false,
            },
            MetaValue::Float(v) => match key.trim().parse::<f64>() {
                Ok(k) => *v == k,
                Err(_) => false,
            },
            MetaValue::Bool(v) => *v == !(key.is_empty() || key == "0"),
            other => other.to_text().as_deref() == Some(key),
        }
    }
}

fn is_empty_array(value: &Value) -> bool {
    matches!(value, Value::Array(items) if items.is_empty())
}

fn json_is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !*b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_text() {
            Some(text) => f.write_str(&text),
            None => f.write_str("null"),
        }
    }
}

impl From<i64> for MetaValue {
    fn from(v: i64) -> Self {
        MetaValue::Int(v)
    }
}

impl From<i32> for MetaValue {
    fn from(v: i32) -> Self {
        MetaValue::Int(v.into())
    }
}

impl From<f64> for MetaValue {
    fn from(v: f64) -> Self {
        MetaValue::Float(v)
    }
}

impl From<bool> for MetaValue {
    fn from(v: bool) -> Self {
        MetaValue::Bool(v)
    }
}

impl From<&str> for MetaValue {
    fn from(v: &str) -> Self {
        MetaValue::String(v.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(v: String) -> Self {
        MetaValue::String(v)
    }
}

impl From<NaiveDateTime> for MetaValue {
    fn from(v: NaiveDateTime) -> Self {
        MetaValue::DateTime(v)
    }
}

impl From<Value> for MetaValue {
    fn from(v: Value) -> Self {
        MetaValue::Json(v)
    }
}

impl From<Collection> for MetaValue {
    fn from(v: Collection) -> Self {
        MetaValue::Collection(v)
    }
}

impl<T: Into<MetaValue>> From<Option<T>> for MetaValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(MetaValue::Null)
    }
}

/// Generic collection wrapper for `collection` payloads.
///
/// Holds either a list or a keyed map. Scalars are wrapped into a
/// single-item list and null becomes an empty list.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    items: Value,
}

impl Default for Collection {
    fn default() -> Self {
        Self {
            items: Value::Array(Vec::new()),
        }
    }
}

impl Collection {
    pub fn new(items: Value) -> Self {
        let items = match items {
            Value::Null => Value::Array(Vec::new()),
            list @ Value::Array(_) => list,
            map @ Value::Object(_) => map,
            scalar => Value::Array(vec![scalar]),
        };
        Self { items }
    }

    pub fn len(&self) -> usize {
        match &self.items {
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Item at a list position. Always `None` for keyed collections.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.as_array().and_then(|items| items.get(index))
    }

    /// Item under a map key. Always `None` for list collections.
    pub fn get_key(&self, key: &str) -> Option<&Value> {
        self.items.as_object().and_then(|map| map.get(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> + '_ {
        let list = self.items.as_array().map(|items| items.iter());
        let map = self.items.as_object().map(|map| map.values());
        list.into_iter().flatten().chain(map.into_iter().flatten())
    }

    pub fn as_value(&self) -> &Value {
        &self.items
    }

    pub fn into_value(self) -> Value {
        self.items
    }
}

impl From<Vec<Value>> for Collection {
    fn from(items: Vec<Value>) -> Self {
        Self::new(Value::Array(items))
    }
}
