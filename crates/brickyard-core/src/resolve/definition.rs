//! Mod document types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use brickyard_protocols::{ApiVersion, RegistryId};

use crate::error::ModError;

/// A mod document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModDefinition {
    #[serde(default)]
    pub api_version: ApiVersion,

    #[serde(default = "default_kind")]
    pub kind: String,

    pub metadata: ModMetadata,

    #[serde(default, alias = "modComponents")]
    pub extension_points: Vec<ModComponentDefinition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<ModOptions>,

    /// Inline definitions keyed by the name stages use to reference them.
    #[serde(default)]
    pub definitions: BTreeMap<String, InnerDefinition>,
}

fn default_kind() -> String {
    "recipe".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModMetadata {
    pub id: RegistryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// User-configurable options of a mod.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModOptions {
    pub schema: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_schema: Option<Value>,
}

impl ModOptions {
    /// Defaults declared on the top-level schema properties.
    pub fn defaults(&self) -> Value {
        let defaults: Map<String, Value> = self
            .schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|properties| {
                properties
                    .iter()
                    .filter_map(|(key, prop)| Some((key.clone(), prop.get("default")?.clone())))
                    .collect()
            })
            .unwrap_or_default();
        Value::Object(defaults)
    }
}

/// One mod component: a starter brick plus its configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModComponentDefinition {
    /// Starter brick id or the key of an inline starter brick.
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Starter-brick specific configuration, including the pipeline.
    #[serde(default)]
    pub config: Map<String, Value>,

    #[serde(default, alias = "services", skip_serializing_if = "Option::is_none")]
    pub integrations: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Value>,
}

/// Kind of an inline definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InnerKind {
    /// A pipeline-defined brick.
    Component,
    Integration,
    StarterBrick,
}

/// An inline definition, kept as raw JSON so its content hash is stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InnerDefinition(pub Value);

impl InnerDefinition {
    pub fn kind(&self, key: &str) -> Result<InnerKind, ModError> {
        match self.0.get("kind").and_then(Value::as_str) {
            Some("component" | "brick" | "reader") => Ok(InnerKind::Component),
            Some("service" | "integration") => Ok(InnerKind::Integration),
            Some("extensionPoint" | "starterBrick") => Ok(InnerKind::StarterBrick),
            Some(other) => Err(ModError::InvalidDefinition {
                key: key.to_string(),
                reason: format!("unknown kind '{other}'"),
            }),
            None => Err(ModError::InvalidDefinition {
                key: key.to_string(),
                reason: "missing kind".to_string(),
            }),
        }
    }
}

impl ModDefinition {
    /// Parse a YAML document. JSON is accepted as well.
    pub fn from_yaml(content: &str) -> Result<Self, ModError> {
        serde_yml::from_str(content).map_err(|e| ModError::Parse(e.to_string()))
    }

    pub fn from_json(content: &str) -> Result<Self, ModError> {
        serde_json::from_str(content).map_err(|e| ModError::Parse(e.to_string()))
    }

    /// Default option values declared by the options schema.
    pub fn default_options(&self) -> Value {
        self.options
            .as_ref()
            .map(ModOptions::defaults)
            .unwrap_or_else(|| Value::Object(Map::new()))
    }
}
