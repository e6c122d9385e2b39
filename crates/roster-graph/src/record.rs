//! Conversion of store records into property maps.
//!
//! Stringification rule, one per value kind:
//! - string: unchanged
//! - integer: base-10
//! - float: shortest round-trip form, always with a fractional part (`2.0`)
//! - boolean: `true` / `false`
//! - list, map: compact JSON, map keys sorted
//! - null: the property is left out of the map

use std::collections::BTreeMap;

use roster_core::PropertyMap;
use serde::{Deserialize, Serialize};

use crate::client::GraphError;

/// A property value as read from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Text form of the value, `None` for null.
    pub fn to_text(&self) -> Result<Option<String>, GraphError> {
        let text = match self {
            Self::Null => return Ok(None),
            Self::Boolean(b) => b.to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => format!("{f:?}"),
            Self::String(s) => s.clone(),
            Self::List(_) | Self::Map(_) => serde_json::to_string(self)
                .map_err(|e| GraphError::Serialization(e.to_string()))?,
        };
        Ok(Some(text))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

/// One result record in the store's native shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    /// Named columns with aligned values.
    Row {
        columns: Vec<String>,
        values: Vec<Value>,
    },
    /// A whole node's property map.
    Node { properties: BTreeMap<String, Value> },
}

impl RawRecord {
    pub fn row<C, V>(pairs: impl IntoIterator<Item = (C, V)>) -> Self
    where
        C: Into<String>,
        V: Into<Value>,
    {
        let (columns, values) = pairs
            .into_iter()
            .map(|(c, v)| (c.into(), v.into()))
            .unzip();
        Self::Row { columns, values }
    }

    pub fn node<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Node {
            properties: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Convert a record into a property map.
pub fn to_property_map(record: &RawRecord) -> Result<PropertyMap, GraphError> {
    let mut props = PropertyMap::new();
    match record {
        RawRecord::Row { columns, values } => {
            if columns.len() != values.len() {
                return Err(GraphError::Serialization(format!(
                    "record has {} columns but {} values",
                    columns.len(),
                    values.len()
                )));
            }
            for (column, value) in columns.iter().zip(values) {
                if let Some(text) = value.to_text()? {
                    props.insert(column.clone(), text);
                }
            }
        }
        RawRecord::Node { properties } => {
            for (key, value) in properties {
                if let Some(text) = value.to_text()? {
                    props.insert(key.clone(), text);
                }
            }
        }
    }
    Ok(props)
}
