//! Recursive merge of configuration dictionaries.
//!
//! Rules for a key present on both sides:
//! - both maps: merged recursively, an empty incoming map resets the key to `{}`
//! - both sequences: set union, an empty incoming sequence resets the key to `[]`
//! - base value is neither map nor sequence: incoming value overwrites it
//! - base is a container and incoming is something else: base value is kept
//!   and the key is reported as a [`MergeConflict`]
//!
//! Keys present only in the incoming map are copied over.

use std::fmt;

use serde_json::{Map, Value};

/// Mapping from string keys to arbitrary YAML/JSON/TOML representable values.
pub type ConfigDict = Map<String, Value>;

/// A key left unmerged because of a container type mismatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConflict {
    /// Dotted path of the key from the top-level dictionary
    pub key: String,
    pub existing: &'static str,
    pub incoming: &'static str,
}

impl fmt::Display for MergeConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "skipping key {} due to type mismatch: {} vs. {}",
            self.key, self.existing, self.incoming
        )
    }
}

/// Result of [`merge_dict`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Merged {
    pub dict: ConfigDict,
    pub conflicts: Vec<MergeConflict>,
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "map",
    }
}

/// Merges `incoming` over `base` without touching either argument.
///
/// Absent arguments are treated as empty maps.
pub fn merge_dict(base: Option<&ConfigDict>, incoming: Option<&ConfigDict>) -> Merged {
    let mut conflicts = Vec::new();
    let dict = merge_at("", base, incoming, &mut conflicts);
    Merged { dict, conflicts }
}

/// Merges and logs every conflict as a warning, returning only the dictionary.
pub fn merge_dict_logged(base: Option<&ConfigDict>, incoming: Option<&ConfigDict>) -> ConfigDict {
    let merged = merge_dict(base, incoming);
    for conflict in &merged.conflicts {
        log::warn!("merge_dict: {conflict}");
    }
    merged.dict
}

fn key_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn merge_at(
    prefix: &str,
    base: Option<&ConfigDict>,
    incoming: Option<&ConfigDict>,
    conflicts: &mut Vec<MergeConflict>,
) -> ConfigDict {
    let mut result = base.cloned().unwrap_or_default();
    let Some(incoming) = incoming.filter(|m| !m.is_empty()) else {
        return result;
    };

    for (key, value) in incoming {
        let merged = match (result.get(key), value) {
            (None, _) => value.clone(),
            (Some(Value::Object(_)), Value::Object(y)) if y.is_empty() => Value::Object(Map::new()),
            (Some(Value::Object(x)), Value::Object(y)) => {
                Value::Object(merge_at(&key_path(prefix, key), Some(x), Some(y), conflicts))
            }
            (Some(Value::Array(_)), Value::Array(y)) if y.is_empty() => Value::Array(Vec::new()),
            (Some(Value::Array(x)), Value::Array(y)) => Value::Array(union(x, y)),
            (Some(existing @ (Value::Object(_) | Value::Array(_))), _) => {
                conflicts.push(MergeConflict {
                    key: key_path(prefix, key),
                    existing: type_name(existing),
                    incoming: type_name(value),
                });
                continue;
            }
            (Some(_), _) => value.clone(),
        };
        result.insert(key.clone(), merged);
    }

    result
}

/// Set union of two sequences. Element order is an implementation detail;
/// callers may only rely on membership.
fn union(a: &[Value], b: &[Value]) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::with_capacity(a.len() + b.len());
    for v in a.iter().chain(b) {
        if !out.contains(v) {
            out.push(v.clone());
        }
    }
    out
}
