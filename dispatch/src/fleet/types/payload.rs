//! Per-unit payload shapes.
//!
//! A broadcast result maps each unit to a payload whose shape is chosen by
//! the caller that issued the query. These are the shapes the coverage flow
//! uses; opaque command output stays a `serde_json::Value`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A primitive command argument or option value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandArg {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// String value.
    Text(String),
}

impl CommandArg {
    /// Parses a command-line token into the narrowest primitive it represents.
    #[must_use]
    pub fn parse_lossy(token: &str) -> Self {
        if let Ok(b) = token.parse::<bool>() {
            return Self::Bool(b);
        }
        if let Ok(i) = token.parse::<i64>() {
            return Self::Int(i);
        }
        if let Ok(f) = token.parse::<f64>() {
            if f.is_finite() {
                return Self::Float(f);
            }
        }
        Self::Text(token.to_string())
    }
}

impl From<bool> for CommandArg {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for CommandArg {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for CommandArg {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for CommandArg {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for CommandArg {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Descriptor of one resource (e.g. a calibration) as reported by a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Resource name, unique per unit and category.
    #[serde(alias = "calibration_name", alias = "estimator_name")]
    pub name: String,
    /// Fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Reference to a resource: either a bare name or a full descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceRef {
    /// Bare resource name.
    Name(String),
    /// Descriptor object carrying the name.
    Descriptor(ResourceDescriptor),
}

impl ResourceRef {
    /// Returns the resource name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Descriptor(d) => &d.name,
        }
    }
}

impl From<&str> for ResourceRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

/// Resources available on one unit, grouped by category (device).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceListing(pub BTreeMap<String, Vec<ResourceRef>>);

impl ResourceListing {
    /// Returns the resources listed for `category`, if the category is present.
    #[must_use]
    pub fn get(&self, category: &str) -> Option<&[ResourceRef]> {
        self.0.get(category).map(Vec::as_slice)
    }

    /// Iterates over the category keys.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<ResourceRef>)> for ResourceListing {
    fn from_iter<T: IntoIterator<Item = (K, Vec<ResourceRef>)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// The active resource on one unit per category; `None` when a category
/// has no active resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActiveResources(pub BTreeMap<String, Option<ResourceRef>>);

impl ActiveResources {
    /// Returns the active resource for `category`, if one is named.
    #[must_use]
    pub fn get(&self, category: &str) -> Option<&ResourceRef> {
        self.0.get(category).and_then(Option::as_ref)
    }

    /// Iterates over the category keys.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<K: Into<String>> FromIterator<(K, Option<ResourceRef>)> for ActiveResources {
    fn from_iter<T: IntoIterator<Item = (K, Option<ResourceRef>)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
