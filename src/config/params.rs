//! Hierarchical parameter tree.
//!
//! Parameters are addressed with dotted paths (`"smoother.type"`,
//! `"coarse.params"`). Leaves may be strings, numbers or booleans; they are
//! converted on lookup, so `{"max levels": 3}` and `{"max levels": "3"}` read
//! the same. Trees are usually loaded from JSON input files.

use crate::error::MgError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamTree {
    root: Value,
}

impl Default for ParamTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamTree {
    /// Empty tree.
    pub fn new() -> Self {
        Self { root: Value::Object(Map::new()) }
    }

    pub fn from_json_str(json: &str) -> Result<Self, MgError> {
        Ok(Self { root: serde_json::from_str(json)? })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, MgError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(Self { root: serde_json::from_reader(reader)? })
    }

    /// Value at `key` converted to `T`, or `default` if the key is missing or
    /// the value does not convert.
    pub fn get<T: FromStr>(&self, key: &str, default: T) -> T {
        match self.leaf(key) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!("parameter \"{key}\" = \"{raw}\" has the wrong type, using the default");
                default
            }),
            None => default,
        }
    }

    /// String value at `key`, or `default`.
    pub fn get_str(&self, key: &str, default: &str) -> String {
        self.leaf(key).unwrap_or_else(|| default.to_string())
    }

    /// Value at `key` converted to `T`; a value that does not convert is an
    /// error instead of falling back to a default.
    pub fn try_get<T: FromStr>(&self, key: &str) -> Result<Option<T>, MgError> {
        match self.leaf(key) {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| MgError::InvalidParameter { key: key.to_string(), value: raw }),
            None => Ok(None),
        }
    }

    /// Sets `key`, creating intermediate subtrees as needed.
    pub fn put(&mut self, key: &str, value: impl Into<Value>) {
        let mut node = &mut self.root;
        for part in key.split('.') {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            let Value::Object(map) = node else {
                unreachable!("node was just made an object")
            };
            node = map.entry(part.to_string()).or_insert(Value::Null);
        }
        *node = value.into();
    }

    /// Subtree at `key`, if there is one.
    pub fn get_child_optional(&self, key: &str) -> Option<ParamTree> {
        self.lookup(key)
            .filter(|v| v.is_object())
            .map(|v| ParamTree { root: v.clone() })
    }

    /// Is there any value (leaf or subtree) at `key`?
    pub fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Every leaf below the root as (dotted key, string value), in key order.
    pub fn leaves(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        collect_leaves(&self.root, String::new(), &mut out);
        out
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        key.split('.').try_fold(&self.root, |node, part| node.as_object()?.get(part))
    }

    fn leaf(&self, key: &str) -> Option<String> {
        self.lookup(key).and_then(leaf_string)
    }
}

fn leaf_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn collect_leaves(value: &Value, prefix: String, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                let key = if prefix.is_empty() { k.clone() } else { format!("{prefix}.{k}") };
                collect_leaves(v, key, out);
            }
        }
        other => {
            if let Some(s) = leaf_string(other) {
                out.push((prefix, s));
            }
        }
    }
}
