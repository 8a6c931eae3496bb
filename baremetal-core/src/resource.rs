//! Generic resource model
//!
//! A [`Resource`] is a read-only snapshot of the fields the service returned
//! for one entity. The field set differs per resource type and per API
//! version, so fields are kept as a JSON object map and read through explicit
//! accessors.

use crate::error::{BaremetalError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A remote entity as a mapping of field name to JSON value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource {
    fields: Map<String, Value>,
}

impl Resource {
    /// Wrap a field map.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Build a resource from a decoded JSON body.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the value is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(BaremetalError::Serialization(format!(
                "expected a JSON object for a resource, got {}",
                other
            ))),
        }
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Look up a field by name, falling back to `default` when absent.
    pub fn get_or(&self, name: &str, default: Value) -> Value {
        self.fields.get(name).cloned().unwrap_or(default)
    }

    /// Look up a string field.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// The resource identity, if the service reported one.
    pub fn uuid(&self) -> Option<&str> {
        self.get_str("uuid")
    }

    pub fn name(&self) -> Option<&str> {
        self.get_str("name")
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over all fields, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Access the underlying field map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }

    /// Render a field for display.
    ///
    /// Missing fields render as an empty string, `null` as `None`, strings
    /// verbatim and any other value as compact JSON.
    pub fn display_value(&self, name: &str) -> String {
        match self.fields.get(name) {
            None => String::new(),
            Some(value) => display_json(value),
        }
    }

    /// Project the resource onto `fields`.
    ///
    /// Fields the server did not return are reported as `null`.
    pub fn subset(&self, fields: &[String]) -> Map<String, Value> {
        fields
            .iter()
            .map(|f| (f.clone(), self.get_or(f, Value::Null)))
            .collect()
    }
}

impl From<Map<String, Value>> for Resource {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// Render a JSON value the way the CLI prints it.
pub fn display_json(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
