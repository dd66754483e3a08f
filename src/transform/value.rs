//! Typed accessors over `serde_json::Value`
//!
//! Transform steps never cast blindly. Paths are dot separated object keys
//! (`action_parameters.cache_key.custom_key`). Walking through something that
//! is not an object simply finds nothing; asking for a specific type on a
//! value that exists but has another type is a [`TransformError::Shape`].

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    /// A present value has a type the step cannot work with
    #[error("unexpected shape at `{path}`: expected {expected}, found {found}")]
    Shape {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A `custom` step names a strategy that does not exist
    #[error("unknown custom transform `{0}`")]
    UnknownCustom(String),
}

impl TransformError {
    pub fn shape(path: &str, expected: &'static str, found: &Value) -> Self {
        Self::Shape {
            path: path.to_string(),
            expected,
            found: kind(found),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;

/// Human name of a JSON value's type, for error messages
pub fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|p| !p.is_empty())
}

/// Find the value at `path`
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    split(path).try_fold(value, |current, key| current.as_object()?.get(key))
}

/// Find the value at `path`, mutably
pub fn lookup_mut<'a>(value: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    split(path).try_fold(value, |current, key| current.as_object_mut()?.get_mut(key))
}

/// Find a non-null value at `path`
pub fn present<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    lookup(value, path).filter(|v| !v.is_null())
}

fn parent_and_key<'p>(path: &'p str) -> (&'p str, &'p str) {
    match path.rsplit_once('.') {
        Some((parent, key)) => (parent, key),
        None => ("", path),
    }
}

/// Remove and return the value at `path`
pub fn take(value: &mut Value, path: &str) -> Option<Value> {
    let (parent, key) = parent_and_key(path);
    lookup_mut(value, parent)?.as_object_mut()?.remove(key)
}

/// Set `path` to `new`, creating intermediate objects as needed.
///
/// Fails when an intermediate value exists but is not an object.
pub fn insert(value: &mut Value, path: &str, new: Value) -> Result<()> {
    let (parent, key) = parent_and_key(path);
    let mut current = value;
    let mut walked = String::new();

    for segment in split(parent) {
        let map = object_mut(current, label(&walked))?;
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if current.is_null() {
            *current = Value::Object(Map::new());
        }

        if !walked.is_empty() {
            walked.push('.');
        }
        walked.push_str(segment);
    }

    let map = object_mut(current, label(&walked))?;
    map.insert(key.to_string(), new);
    Ok(())
}

fn label(path: &str) -> &str {
    if path.is_empty() {
        "<record>"
    } else {
        path
    }
}

fn object_mut<'a>(value: &'a mut Value, path: &str) -> Result<&'a mut Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(TransformError::shape(path, "object", other)),
    }
}

/// The record itself as an object
pub fn record_mut<'a>(record: &'a mut Value) -> Result<&'a mut Map<String, Value>> {
    object_mut(record, "<record>")
}

/// Non-null object at `path`, if any
pub fn opt_object<'a>(value: &'a Value, path: &str) -> Result<Option<&'a Map<String, Value>>> {
    match present(value, path) {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(TransformError::shape(path, "object", other)),
    }
}

/// Non-null array at `path`, if any
pub fn opt_array<'a>(value: &'a Value, path: &str) -> Result<Option<&'a Vec<Value>>> {
    match present(value, path) {
        None => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(other) => Err(TransformError::shape(path, "array", other)),
    }
}

/// Non-null array at `path`, mutably, if any
pub fn opt_array_mut<'a>(value: &'a mut Value, path: &str) -> Result<Option<&'a mut Vec<Value>>> {
    match lookup_mut(value, path) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(other) => Err(TransformError::shape(path, "array", other)),
    }
}

/// Scalar at `path` rendered as a string (strings verbatim, numbers and
/// bools via `to_string`), if any
pub fn opt_scalar_string(value: &Value, path: &str) -> Result<Option<String>> {
    match present(value, path) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(v.to_string())),
        Some(other) => Err(TransformError::shape(path, "string", other)),
    }
}
