//! Runtime value types for entity instances and value maps.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An object value: property name to value, ordered by key.
pub type ValueMap = BTreeMap<String, Value>;

/// A runtime value.
///
/// Entity instances are represented as [`Value::Object`]. A property that is
/// missing from an object is *undefined*, which is distinct from a property
/// that is present and set to [`Value::Null`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    /// Null value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit floating point.
    Float64(f64),
    /// UTF-8 string.
    String(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// Timestamp as microseconds since Unix epoch.
    Timestamp(i64),
    /// UUID as 16 bytes.
    Uuid([u8; 16]),
    /// Ordered list of values.
    Array(Vec<Value>),
    /// Nested object.
    Object(ValueMap),
}

impl Value {
    /// Create an empty object.
    pub fn object() -> Self {
        Value::Object(ValueMap::new())
    }

    /// Build a nested object that holds `leaf` under the given path.
    ///
    /// `nest(&["address", "city"], v)` yields `{address: {city: v}}`.
    pub fn nest<S: AsRef<str>>(path: &[S], leaf: Value) -> Self {
        path.iter().rev().fold(leaf, |inner, segment| {
            let mut map = ValueMap::new();
            map.insert(segment.as_ref().to_string(), inner);
            Value::Object(map)
        })
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is an object.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Check if this value is an array.
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Check if this value is the empty string.
    pub fn is_empty_string(&self) -> bool {
        matches!(self, Value::String(s) if s.is_empty())
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(i) => Some(*i),
            Value::Int32(i) => Some(*i as i64),
            _ => None,
        }
    }

    /// Try to get as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(f) => Some(*f),
            Value::Int32(i) => Some(*i as f64),
            Value::Int64(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as an array slice.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Try to get as an object.
    pub fn as_object(&self) -> Option<&ValueMap> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Try to get as a mutable object.
    pub fn as_object_mut(&mut self) -> Option<&mut ValueMap> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a property of an object. Returns `None` when the property is
    /// undefined or when this value is not an object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Walk a property path through nested objects.
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        path.iter()
            .try_fold(self, |current, segment| current.get(segment.as_ref()))
    }

    /// Walk a dotted property path (`"address.city"`).
    pub fn get_dotted(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(self, |current, segment| current.get(segment))
    }

    /// Set a value under a property path, creating intermediate objects.
    ///
    /// Fails if an intermediate segment exists and is not an object.
    pub fn set_path<S: AsRef<str>>(&mut self, path: &[S], value: Value) -> Result<(), Error> {
        let (last, parents) = path.split_last().ok_or(Error::EmptyPath)?;
        let mut current = self;
        let mut walked = Vec::with_capacity(path.len());
        for segment in parents {
            walked.push(segment.as_ref());
            let map = current.as_object_mut().ok_or_else(|| Error::NotAnObject {
                path: walked.join("."),
            })?;
            current = map
                .entry(segment.as_ref().to_string())
                .or_insert_with(Value::object);
        }
        let map = current.as_object_mut().ok_or_else(|| Error::NotAnObject {
            path: walked.join("."),
        })?;
        map.insert(last.as_ref().to_string(), value);
        Ok(())
    }

    /// Deep-merge `source` into this value.
    ///
    /// Objects are merged key by key, recursively. Any other source value
    /// replaces the destination value. Merging into a non-object replaces it.
    pub fn merge_deep(&mut self, source: Value) {
        match (self, source) {
            (Value::Object(target), Value::Object(source)) => {
                for (key, value) in source {
                    let nested = value.is_object()
                        && target.get(&key).is_some_and(|existing| existing.is_object());
                    if nested {
                        if let Some(existing) = target.get_mut(&key) {
                            existing.merge_deep(value);
                            continue;
                        }
                    }
                    target.insert(key, value);
                }
            }
            (target, source) => *target = source,
        }
    }

    /// Parse a JSON document into a value.
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let parsed: serde_json::Value = serde_json::from_str(json)?;
        Ok(Value::from(parsed))
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int64(i),
                None => Value::Float64(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

// Conversion implementations
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<ValueMap> for Value {
    fn from(v: ValueMap) -> Self {
        Value::Object(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nest_builds_nested_objects() {
        let nested = Value::nest(&["address", "city"], Value::from("Oslo"));
        assert_eq!(nested, Value::from(json!({"address": {"city": "Oslo"}})));
    }

    #[test]
    fn test_merge_deep_merges_objects() {
        let mut target = Value::from(json!({"address": {"city": "Oslo"}, "id": 1}));
        target.merge_deep(Value::from(json!({"address": {"zip": "0150"}})));

        assert_eq!(
            target,
            Value::from(json!({"address": {"city": "Oslo", "zip": "0150"}, "id": 1}))
        );
    }

    #[test]
    fn test_merge_deep_replaces_scalars_and_arrays() {
        let mut target = Value::from(json!({"tags": [1, 2], "name": "a"}));
        target.merge_deep(Value::from(json!({"tags": [3], "name": "b"})));

        assert_eq!(target, Value::from(json!({"tags": [3], "name": "b"})));
    }

    #[test]
    fn test_get_path_distinguishes_undefined_from_null() {
        let entity = Value::from(json!({"name": null, "address": {"city": "Oslo"}}));

        assert_eq!(entity.get("name"), Some(&Value::Null));
        assert_eq!(entity.get("missing"), None);
        assert_eq!(entity.get_dotted("address.city"), Some(&Value::from("Oslo")));
        assert_eq!(entity.get_path(&["address", "zip"]), None);
    }

    #[test]
    fn test_set_path_creates_intermediate_objects() {
        let mut entity = Value::object();
        entity
            .set_path(&["address", "city"], Value::from("Oslo"))
            .unwrap();

        assert_eq!(entity, Value::from(json!({"address": {"city": "Oslo"}})));
    }

    #[test]
    fn test_set_path_rejects_scalar_parent() {
        let mut entity = Value::from(json!({"address": "flat"}));
        let err = entity
            .set_path(&["address", "city"], Value::from("Oslo"))
            .unwrap_err();

        assert!(matches!(err, Error::NotAnObject { .. }));
    }

    #[test]
    fn test_json_numbers() {
        assert_eq!(Value::from(json!(3)), Value::Int64(3));
        assert_eq!(Value::from(json!(1.5)), Value::Float64(1.5));
        assert_eq!(Value::Int32(3).as_i64(), Some(3));
    }
}
