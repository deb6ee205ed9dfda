//! Untyped configuration input.
//!
//! [`RawNode`] is what callers hand to the expander: plain JSON data (usually
//! loaded from a file), or values built in code that may defer parts of the
//! configuration to a factory function or embed a transform step inline.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::domain::{entities::plugin::Plugin, options::OptionMap};

/// Deferred configuration: invoked with the effective options of the node
/// that owns it and must produce a mapping.
pub type ConfigFactory = Arc<dyn Fn(&OptionMap) -> RawNode + Send + Sync>;

#[derive(Clone)]
pub enum RawNode {
    Value(Value),
    Map(IndexMap<String, RawNode>),
    List(Vec<RawNode>),
    Factory(ConfigFactory),
    Transform(Arc<dyn Plugin>),
}

impl RawNode {
    pub fn factory<F>(f: F) -> Self
    where
        F: Fn(&OptionMap) -> RawNode + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(f))
    }

    pub fn transform(plugin: impl Plugin + 'static) -> Self {
        Self::Transform(Arc::new(plugin))
    }

    /// `true` for mappings, whether built in code or parsed.
    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Map(_) | Self::Value(Value::Object(_)))
    }

    /// Whether this is a mapping that declares `key`.
    pub fn has_key(&self, key: &str) -> bool {
        match self {
            Self::Map(map) => map.contains_key(key),
            Self::Value(Value::Object(map)) => map.contains_key(key),
            _ => false,
        }
    }

    /// Split a mapping into its entries; any other shape is returned as-is.
    pub fn into_entries(self) -> Result<IndexMap<String, RawNode>, RawNode> {
        match self {
            Self::Map(map) => Ok(map),
            Self::Value(Value::Object(map)) => {
                Ok(map.into_iter().map(|(k, v)| (k, RawNode::Value(v))).collect())
            }
            other => Err(other),
        }
    }

    /// Convert to plain JSON. Fails (returning the offending description) if
    /// a factory or transform is nested inside.
    pub fn into_value(self) -> Result<Value, &'static str> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Map(map) => {
                let mut out = Map::new();
                for (key, node) in map {
                    out.insert(key, node.into_value()?);
                }
                Ok(Value::Object(out))
            }
            Self::List(items) => items
                .into_iter()
                .map(RawNode::into_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Self::Factory(_) => Err("a config function"),
            Self::Transform(_) => Err("an inline transform"),
        }
    }

    /// Short description of the node's shape for error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Value(value) => crate::domain::options::kind_of(value).to_string(),
            Self::Map(_) => "a mapping".into(),
            Self::List(_) => "a list".into(),
            Self::Factory(_) => "a config function".into(),
            Self::Transform(t) => format!("inline transform '{}'", t.name()),
        }
    }
}

impl From<Value> for RawNode {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<RawMap> for RawNode {
    fn from(map: RawMap) -> Self {
        map.build()
    }
}

impl From<&str> for RawNode {
    fn from(s: &str) -> Self {
        Self::Value(Value::String(s.to_string()))
    }
}

impl fmt::Debug for RawNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value}"),
            Self::Map(map) => f.debug_map().entries(map.iter()).finish(),
            Self::List(items) => f.debug_list().entries(items.iter()).finish(),
            Self::Factory(_) => f.write_str("<factory>"),
            Self::Transform(t) => write!(f, "<transform {}>", t.name()),
        }
    }
}

/// Ordered builder for mapping nodes.
///
/// ```
/// use boilerplate_core::domain::{RawMap, RawNode};
/// use serde_json::json;
///
/// let raw: RawNode = RawMap::new()
///     .entry("options", json!({"cwd": "templates"}))
///     .entry("docs", json!({"src": "*.md", "dest": "docs"}))
///     .into();
/// assert!(raw.has_key("docs"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RawMap(IndexMap<String, RawNode>);

impl RawMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, key: impl Into<String>, value: impl Into<RawNode>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> RawNode {
        RawNode::Map(self.0)
    }
}
