//! # Method Definition Tree
//!
//! A service is classified once, at registration time, into a tree of
//! namespaces and leaves. Leaves are either callables with their declared
//! parameter names or static values. The tree is never mutated after it is
//! built and is shared between concurrent requests behind an `Arc`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{Number, Value};
use tracing::error;

use crate::method::RpcMethod;

/// Introspection tag of callable leaves
pub const FUNCTION_TYPE: &str = "function";
/// Introspection tag of value leaves
pub const VALUE_TYPE: &str = "value";

/// Static values that are served as-is, without invoking anything.
///
/// This is a closed set: JSON objects and `null` are never leaves, they are
/// expanded into namespaces by the builder.
#[derive(Debug, Clone, PartialEq)]
pub enum LeafValue {
    Bool(bool),
    Number(Number),
    String(String),
    Date(DateTime<Utc>),
    Array(Vec<Value>),
}

impl LeafValue {
    /// Classify a JSON value, handing back non-leaf shapes untouched
    pub fn classify(value: Value) -> Result<LeafValue, Value> {
        match value {
            Value::Bool(b) => Ok(LeafValue::Bool(b)),
            Value::Number(n) => Ok(LeafValue::Number(n)),
            Value::String(s) => Ok(LeafValue::String(s)),
            Value::Array(items) => Ok(LeafValue::Array(items)),
            other @ (Value::Null | Value::Object(_)) => Err(other),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            LeafValue::Bool(b) => Value::Bool(*b),
            LeafValue::Number(n) => Value::Number(n.clone()),
            LeafValue::String(s) => Value::String(s.clone()),
            LeafValue::Date(d) => Value::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            LeafValue::Array(items) => Value::Array(items.clone()),
        }
    }
}

impl From<DateTime<Utc>> for LeafValue {
    fn from(date: DateTime<Utc>) -> Self {
        LeafValue::Date(date)
    }
}

impl Serialize for LeafValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// A registered callable together with its declared parameter order
#[derive(Clone)]
pub struct CallableLeaf {
    params: Vec<String>,
    method: Arc<dyn RpcMethod>,
}

impl CallableLeaf {
    pub fn new(params: Vec<String>, method: Arc<dyn RpcMethod>) -> Self {
        Self { params, method }
    }

    /// Declared parameter names, in positional order
    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn method(&self) -> &Arc<dyn RpcMethod> {
        &self.method
    }
}

impl fmt::Debug for CallableLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallableLeaf")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// One node of the definition tree
#[derive(Debug, Clone)]
pub enum MethodDefinition {
    Namespace(Namespace),
    Callable(CallableLeaf),
    Value(LeafValue),
}

impl MethodDefinition {
    pub fn kind(&self) -> &'static str {
        match self {
            MethodDefinition::Namespace(_) => "namespace",
            MethodDefinition::Callable(_) => FUNCTION_TYPE,
            MethodDefinition::Value(_) => VALUE_TYPE,
        }
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(self, MethodDefinition::Namespace(_))
    }
}

impl Serialize for MethodDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MethodDefinition::Namespace(namespace) => namespace.serialize(serializer),
            MethodDefinition::Callable(leaf) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", FUNCTION_TYPE)?;
                map.serialize_entry("params", &leaf.params)?;
                map.end()
            }
            MethodDefinition::Value(value) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", VALUE_TYPE)?;
                map.serialize_entry("value", value)?;
                map.end()
            }
        }
    }
}

/// Named members of a namespace
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    members: BTreeMap<String, MethodDefinition>,
}

impl Namespace {
    pub(crate) fn from_members(members: BTreeMap<String, MethodDefinition>) -> Self {
        Self { members }
    }

    pub fn get(&self, name: &str) -> Option<&MethodDefinition> {
        self.members.get(name)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, &MethodDefinition)> {
        self.members.iter().map(|(name, def)| (name.as_str(), def))
    }

    /// Follow a dotted path such as `a.b.c`.
    ///
    /// Stepping past a leaf or through a missing member yields `None`.
    pub fn resolve(&self, path: &str) -> Option<&MethodDefinition> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.members.get(first)?;
        for segment in segments {
            match current {
                MethodDefinition::Namespace(namespace) => current = namespace.members.get(segment)?,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Dotted paths of every leaf, sorted
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_paths("", &mut paths);
        paths
    }

    fn collect_paths(&self, prefix: &str, paths: &mut Vec<String>) {
        for (name, definition) in &self.members {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", prefix, name)
            };
            match definition {
                MethodDefinition::Namespace(namespace) => namespace.collect_paths(&path, paths),
                _ => paths.push(path),
            }
        }
    }

    /// The introspection payload: the whole tree as plain JSON
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            error!("Failed to serialize definition tree: {}", e);
            Value::Null
        })
    }
}

impl Serialize for Namespace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.members.len()))?;
        for (name, definition) in &self.members {
            map.serialize_entry(name, definition)?;
        }
        map.end()
    }
}
