//! Node property values
//!
//! Concept nodes only ever hold string scalars and string lists, so the
//! property model is closed over those two shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single stored node property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    List(Vec<String>),
}

/// Full property set of a node, keyed by property name
pub type PropertyMap = BTreeMap<String, PropertyValue>;

impl PropertyValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            PropertyValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            PropertyValue::List(items) => Some(items),
            PropertyValue::Text(_) => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(value: Vec<String>) -> Self {
        PropertyValue::List(value)
    }
}

impl From<PropertyValue> for Value {
    fn from(value: PropertyValue) -> Self {
        match value {
            PropertyValue::Text(s) => Value::String(s),
            PropertyValue::List(items) => Value::Array(items.into_iter().map(Value::String).collect()),
        }
    }
}

/// Storage shape of a projected property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Text,
    List,
}

/// A property the read path projects out of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertySpec {
    pub name: &'static str,
    pub kind: PropertyKind,
}

impl PropertySpec {
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: PropertyKind::Text,
        }
    }

    pub const fn list(name: &'static str) -> Self {
        Self {
            name,
            kind: PropertyKind::List,
        }
    }
}
