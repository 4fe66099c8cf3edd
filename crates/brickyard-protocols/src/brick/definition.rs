//! Brick definition types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::RegistryId;

/// Static description of a brick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrickDefinition {
    /// Unique registry id.
    pub id: RegistryId,

    /// Human-readable name.
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// JSON Schema for the brick's arguments.
    #[serde(default = "empty_object_schema")]
    pub input_schema: Value,

    /// JSON Schema for the brick's output, if declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl BrickDefinition {
    /// Create a new brick definition accepting any object.
    pub fn new(id: RegistryId, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            input_schema: empty_object_schema(),
            output_schema: None,
            version: None,
        }
    }

    /// Set the input schema.
    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Set the output schema.
    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Schema accepting any object.
pub fn empty_object_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {}
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_definition_builder() {
        let def = BrickDefinition::new(RegistryId::new("@test/echo").unwrap(), "Echo", "Echoes")
            .with_input_schema(json!({"type": "object", "required": ["message"]}))
            .with_version("1.0.0");
        assert_eq!(def.id.as_str(), "@test/echo");
        assert_eq!(def.input_schema["required"][0], "message");
        assert!(def.output_schema.is_none());
        assert_eq!(def.version.as_deref(), Some("1.0.0"));
    }

    #[test]
    fn test_definition_deserialize_defaults() {
        let def: BrickDefinition =
            serde_json::from_value(json!({"id": "@test/x", "name": "X"})).unwrap();
        assert_eq!(def.input_schema, empty_object_schema());
        assert_eq!(def.description, "");
    }
}
