//! Structured configuration documents and their YAML round trip

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{CoreError, Result};

/// A structured configuration document.
///
/// Documents are dynamically shaped — nested mappings of string keys to
/// scalars, sequences, or further mappings — with the single structural
/// contract that the root is a mapping. The inner representation is a
/// [`serde_json::Value`], which already is the scalar/sequence/mapping
/// sum type the rest of the pipeline works in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(pub JsonValue);

impl Document {
    /// Create an empty document (empty mapping root)
    pub fn new() -> Self {
        Self(JsonValue::Object(serde_json::Map::new()))
    }

    /// Parse a document from YAML text.
    ///
    /// Top-level scalars and sequences are rejected: callers always hand
    /// in a configuration mapping, and the resolved output must come back
    /// in the same shape.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let value: JsonValue = serde_yaml::from_str(text).map_err(CoreError::Deserialize)?;
        if !value.is_object() {
            return Err(CoreError::NonMappingRoot);
        }
        Ok(Self(value))
    }

    /// Parse a document from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(text)?;
        if !value.is_object() {
            return Err(CoreError::NonMappingRoot);
        }
        Ok(Self(value))
    }

    /// Serialize the document to its canonical YAML form.
    ///
    /// The trailing newline is trimmed so it cannot survive template
    /// execution into the resolved text, and a leading `---` document
    /// marker is stripped if the emitter produced one.
    pub fn to_yaml(&self) -> Result<String> {
        let yaml = serde_yaml::to_string(&self.0).map_err(CoreError::Serialize)?;
        let yaml = yaml.strip_prefix("---\n").unwrap_or(&yaml);
        Ok(yaml.trim_end_matches('\n').to_string())
    }

    /// Get a value by dotted path (e.g., "spec.database.host")
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let parts: Vec<&str> = path.split('.').collect();
        get_nested(&self.0, &parts)
    }

    /// Get the inner JSON value
    pub fn inner(&self) -> &JsonValue {
        &self.0
    }

    /// Convert into the inner JSON value
    pub fn into_inner(self) -> JsonValue {
        self.0
    }

    /// Check if the document has no keys
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            JsonValue::Object(map) => map.is_empty(),
            _ => true,
        }
    }
}

/// Get a nested value by path
fn get_nested<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    if path.is_empty() {
        return Some(value);
    }

    match value {
        JsonValue::Object(map) => map
            .get(path[0])
            .and_then(|v| get_nested(v, &path[1..])),
        _ => None,
    }
}
