//! Domain primitive types used across the Dockmeta workspace.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{CONFIG_ATTRIBUTE, ENV_ATTRIBUTE, LABELS_ATTRIBUTE};

/// Derived metadata attached to an event, ordered by key.
pub type MetadataMap = BTreeMap<String, String>;

/// Identifier of a container as reported by the runtime.
///
/// Treated as opaque: full IDs, short IDs and names are all passed to the
/// runtime as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a new container ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A log event flowing through the pipeline.
///
/// A JSON object keyed by field name. The enricher reads a single field
/// and writes a single field; every other field is left as it was.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Map<String, Value>);

impl Event {
    /// Creates an empty event.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Converts a JSON value into an event if it is an object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Returns the raw value of a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns a field's value when it is a string.
    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Sets a field, returning the previous value if there was one.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// Returns whether the event carries the given field.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Number of fields in the event.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the event has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the event, returning the underlying JSON object.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Event {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Runtime inspection result for one container.
///
/// Keeps the environment list and label map pulled out of `Config` for the
/// extractors, and the full inspection document for templates.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerRecord {
    env: Vec<String>,
    labels: BTreeMap<String, String>,
    attributes: Value,
}

impl ContainerRecord {
    /// Builds a record from an inspection document shaped like the Docker
    /// Engine API response (`Config.Env`, `Config.Labels`, ...).
    ///
    /// Non-string env entries and label values are ignored.
    #[must_use]
    pub fn from_attributes(attributes: Value) -> Self {
        let config = attributes.get(CONFIG_ATTRIBUTE);

        let env = config
            .and_then(|c| c.get(ENV_ATTRIBUTE))
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        let labels = config
            .and_then(|c| c.get(LABELS_ATTRIBUTE))
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_owned())))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            env,
            labels,
            attributes,
        }
    }

    /// Environment entries in `KEY=VALUE` form, in runtime order.
    #[must_use]
    pub fn env(&self) -> &[String] {
        &self.env
    }

    /// Container labels.
    #[must_use]
    pub const fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    /// The full inspection document.
    #[must_use]
    pub const fn attributes(&self) -> &Value {
        &self.attributes
    }
}
