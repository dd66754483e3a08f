//! Declarative transform steps
//!
//! Each resource definition carries an ordered `transforms` list in its JSON
//! file. Every entry deserializes into a [`Step`]; the `op` field selects the
//! variant:
//!
//! ```json
//! {"op": "rename", "from": "script", "to": "script_name"}
//! ```
//!
//! Steps only react to raw API shapes (a key that the API sets, a literal
//! `"*"`, a map where a list is wanted), so running a step over its own output
//! changes nothing.

use super::custom;
use super::value::{self, Result, TransformError};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Remove server-computed or non-schema fields
    DeleteFields { fields: Vec<String> },

    /// Remove fields from every element of a nested array
    DeleteNested {
        collection: String,
        fields: Vec<String>,
    },

    /// Move a value to the key the schema expects
    Rename {
        from: String,
        to: String,
        #[serde(default)]
        keep_source: bool,
    },

    /// Stamp the path parameter onto every record
    InjectParam { field: String },

    /// Replace each parent record by the children listed under `collection`
    Denest {
        collection: String,
        #[serde(default)]
        stamp: Option<String>,
    },

    /// Fold every record into a single record under `into`
    Collect { into: String },

    /// Drop records whose `field` equals `equals`
    DropIfEquals { field: String, equals: Value },

    /// Drop records where `field` is absent, null or an empty string
    DropIfMissing { field: String },

    /// Replace a list of objects by the list of their `key` values
    Pluck { collection: String, key: String },

    /// Turn a map into a key-sorted list of `{key_name, value_name}` objects
    Pairs {
        field: String,
        key_name: String,
        value_name: String,
        #[serde(default)]
        substitute: BTreeMap<String, Value>,
    },

    /// Replace `"*"` include/exclude sentinels by the `ignore` flag
    QueryStringWildcard { field: String },

    /// Hand the records to a named strategy in [`custom`]
    Custom { name: String },
}

impl Step {
    pub fn apply(&self, records: Vec<Value>, param: Option<&str>) -> Result<Vec<Value>> {
        match self {
            Step::DeleteFields { fields } => each(records, |record| {
                for field in fields {
                    value::take(record, field);
                }
                Ok(())
            }),

            Step::DeleteNested { collection, fields } => each(records, |record| {
                let Some(items) = value::opt_array_mut(record, collection)? else {
                    return Ok(());
                };
                for item in items.iter_mut() {
                    if !item.is_object() {
                        return Err(TransformError::shape(collection, "array of objects", item));
                    }
                    for field in fields {
                        value::take(item, field);
                    }
                }
                Ok(())
            }),

            Step::Rename {
                from,
                to,
                keep_source,
            } => each(records, |record| {
                let Some(found) = value::present(record, from).cloned() else {
                    return Ok(());
                };
                if !keep_source {
                    value::take(record, from);
                }
                value::insert(record, to, found)
            }),

            Step::InjectParam { field } => match param {
                Some(param) => each(records, |record| {
                    value::insert(record, field, Value::String(param.to_string()))
                }),
                None => {
                    tracing::debug!("No path parameter to inject as `{}`", field);
                    Ok(records)
                }
            },

            Step::Denest { collection, stamp } => denest(records, collection, stamp.as_deref(), param),

            Step::Collect { into } => Ok(collect(records, into)),

            Step::DropIfEquals { field, equals } => Ok(records
                .into_iter()
                .filter(|record| value::lookup(record, field) != Some(equals))
                .collect()),

            Step::DropIfMissing { field } => Ok(records
                .into_iter()
                .filter(|record| match value::present(record, field) {
                    None => false,
                    Some(Value::String(s)) => !s.is_empty(),
                    Some(_) => true,
                })
                .collect()),

            Step::Pluck { collection, key } => each(records, |record| {
                let Some(items) = value::opt_array_mut(record, collection)? else {
                    return Ok(());
                };
                let plucked: Vec<Value> = items
                    .drain(..)
                    .filter_map(|item| match item {
                        Value::Object(mut map) => map.remove(key).filter(|v| !v.is_null()),
                        scalar => Some(scalar),
                    })
                    .collect();
                *items = plucked;
                Ok(())
            }),

            Step::Pairs {
                field,
                key_name,
                value_name,
                substitute,
            } => each(records, |record| {
                let pairs = match value::lookup(record, field) {
                    None | Some(Value::Null) | Some(Value::Array(_)) => return Ok(()),
                    Some(Value::Object(map)) => sorted_pairs(map, key_name, value_name, substitute),
                    Some(other) => return Err(TransformError::shape(field, "object", other)),
                };
                value::insert(record, field, Value::Array(pairs))
            }),

            Step::QueryStringWildcard { field } => each(records, |record| {
                if value::opt_object(record, field)?.is_none() {
                    return Ok(());
                }
                let include = format!("{}.include", field);
                let exclude = format!("{}.exclude", field);
                let ignore = format!("{}.ignore", field);

                if is_wildcard(value::lookup(record, &include)) {
                    value::take(record, &include);
                    value::insert(record, &ignore, Value::Bool(false))?;
                }
                if is_wildcard(value::lookup(record, &exclude)) {
                    value::take(record, &exclude);
                    value::insert(record, &ignore, Value::Bool(true))?;
                }
                Ok(())
            }),

            Step::Custom { name } => {
                let strategy =
                    custom::find(name).ok_or_else(|| TransformError::UnknownCustom(name.clone()))?;
                strategy(records, param)
            }
        }
    }
}

/// Run `f` over every record, in place
pub(crate) fn each<F>(mut records: Vec<Value>, mut f: F) -> Result<Vec<Value>>
where
    F: FnMut(&mut Value) -> Result<()>,
{
    for record in records.iter_mut() {
        f(record)?;
    }
    Ok(records)
}

fn is_wildcard(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(s)) if s == "*")
}

fn denest(
    records: Vec<Value>,
    collection: &str,
    stamp: Option<&str>,
    param: Option<&str>,
) -> Result<Vec<Value>> {
    let mut flattened = Vec::with_capacity(records.len());

    for mut record in records {
        let children = match value::take(&mut record, collection) {
            // Already a child record
            None => {
                flattened.push(record);
                continue;
            }
            Some(Value::Null) => Vec::new(),
            Some(Value::Array(children)) => children,
            Some(other) => return Err(TransformError::shape(collection, "array", &other)),
        };

        for mut child in children {
            if let (Some(field), Some(param)) = (stamp, param) {
                value::insert(&mut child, field, Value::String(param.to_string()))?;
            }
            flattened.push(child);
        }
    }

    Ok(flattened)
}

fn collect(records: Vec<Value>, into: &str) -> Vec<Value> {
    if records.is_empty() {
        return records;
    }
    if records.len() == 1 && value::lookup(&records[0], into).is_some_and(Value::is_array) {
        return records;
    }

    let mut folded = Map::new();
    folded.insert(into.to_string(), Value::Array(records));
    vec![Value::Object(folded)]
}

fn sorted_pairs(
    map: &Map<String, Value>,
    key_name: &str,
    value_name: &str,
    substitute: &BTreeMap<String, Value>,
) -> Vec<Value> {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    entries
        .into_iter()
        .map(|(key, raw)| {
            let mapped = match raw {
                Value::String(s) => substitute.get(s).cloned().unwrap_or_else(|| raw.clone()),
                other => other.clone(),
            };
            let mut pair = Map::new();
            pair.insert(key_name.to_string(), Value::String(key.clone()));
            pair.insert(value_name.to_string(), mapped);
            Value::Object(pair)
        })
        .collect()
}
