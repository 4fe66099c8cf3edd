//! Pipeline stage definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::{BrickType, ConfigValue, RegistryId};
use crate::error::ConfigValueError;

/// An ordered list of stages. Order is execution order.
pub type BrickPipeline = Vec<BrickConfig>;

/// Name a stage binds its output to (without the leading `@`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OutputKey(String);

impl OutputKey {
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigValueError> {
        let key = key.into();
        let key = key.strip_prefix('@').map(str::to_string).unwrap_or(key);
        let mut chars = key.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(ConfigValueError(format!("invalid output key '{key}'")));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The context variable name (`@key`).
    pub fn variable(&self) -> String {
        format!("@{}", self.0)
    }
}

impl TryFrom<String> for OutputKey {
    type Error = ConfigValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OutputKey> for String {
    fn from(key: OutputKey) -> Self {
        key.0
    }
}

impl fmt::Display for OutputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which browsing context a stage runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowTarget {
    #[default]
    #[serde(rename = "self")]
    Current,
    /// The frame that opened the current tab.
    Opener,
    /// The top-level frame of the current tab.
    Top,
    /// Every frame of the current tab.
    Broadcast,
}

/// How a root-aware stage picks its root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootMode {
    /// Use the root of the enclosing pipeline.
    #[default]
    Inherit,
    /// Use the frame's document.
    Document,
}

/// One pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrickConfig {
    /// Registry id of the brick to run.
    pub id: RegistryId,

    /// Brick arguments.
    #[serde(default)]
    pub config: BTreeMap<String, ConfigValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_key: Option<OutputKey>,

    /// Stage runs only when this resolves truthy.
    #[serde(default, rename = "if", skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConfigValue>,

    /// Per-editing-session id used to correlate traces; not stable across saves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<Uuid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,

    #[serde(default)]
    pub window: WindowTarget,

    #[serde(default)]
    pub root_mode: RootMode,
}

impl BrickConfig {
    pub fn new(id: RegistryId) -> Self {
        Self {
            id,
            config: BTreeMap::new(),
            output_key: None,
            condition: None,
            instance_id: None,
            label: None,
            comments: None,
            window: WindowTarget::Current,
            root_mode: RootMode::Inherit,
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: ConfigValue) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    pub fn with_output_key(mut self, key: OutputKey) -> Self {
        self.output_key = Some(key);
        self
    }

    pub fn with_condition(mut self, condition: ConfigValue) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_window(mut self, window: WindowTarget) -> Self {
        self.window = window;
        self
    }

    pub fn with_root_mode(mut self, root_mode: RootMode) -> Self {
        self.root_mode = root_mode;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Human readable name for logs.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(self.id.as_str())
    }

    /// Assign fresh instance ids to this stage and all nested stages.
    pub fn regenerate_instance_ids(&mut self) {
        self.instance_id = Some(Uuid::new_v4());
        for value in self.config.values_mut() {
            for sub in value.pipelines_mut() {
                regenerate_instance_ids(&mut sub.0);
            }
        }
    }

    /// Assign instance ids only where missing, recursively.
    pub fn ensure_instance_ids(&mut self) {
        if self.instance_id.is_none() {
            self.instance_id = Some(Uuid::new_v4());
        }
        for value in self.config.values_mut() {
            for sub in value.pipelines_mut() {
                ensure_instance_ids(&mut sub.0);
            }
        }
    }
}

/// Assign fresh instance ids after a structural edit.
pub fn regenerate_instance_ids(pipeline: &mut BrickPipeline) {
    pipeline.iter_mut().for_each(BrickConfig::regenerate_instance_ids);
}

/// Fill in instance ids for stages loaded without one.
pub fn ensure_instance_ids(pipeline: &mut BrickPipeline) {
    pipeline.iter_mut().for_each(BrickConfig::ensure_instance_ids);
}

/// A position in nested control flow, e.g. iteration 3 of a loop body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BranchSegment {
    pub key: String,
    pub counter: usize,
}

impl BranchSegment {
    pub fn new(key: impl Into<String>, counter: usize) -> Self {
        Self {
            key: key.into(),
            counter,
        }
    }
}

impl fmt::Display for BranchSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.key, self.counter)
    }
}

/// Constrains which brick types the editor allows at a pipeline position.
///
/// Enforced by editor-time validation only; the interpreter runs any well-typed pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PipelineFlavor {
    #[default]
    AllBricks,
    NoEffect,
    NoRenderer,
}

impl PipelineFlavor {
    pub fn allows(&self, brick_type: BrickType) -> bool {
        match self {
            PipelineFlavor::AllBricks => true,
            PipelineFlavor::NoEffect => {
                !matches!(brick_type, BrickType::Effect | BrickType::Renderer)
            }
            PipelineFlavor::NoRenderer => brick_type != BrickType::Renderer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id(value: &str) -> RegistryId {
        RegistryId::new(value).unwrap()
    }

    #[test]
    fn test_deserialize_full_stage() {
        let stage: BrickConfig = serde_json::from_value(json!({
            "id": "@brickyard/echo",
            "config": {"message": {"__type__": "mustache", "__value__": "{{ @input.name }}"}},
            "outputKey": "greeting",
            "if": {"__type__": "var", "__value__": "@input.enabled"},
            "label": "Greet",
            "window": "broadcast"
        }))
        .unwrap();
        assert_eq!(stage.id.as_str(), "@brickyard/echo");
        assert_eq!(stage.output_key.as_ref().unwrap().variable(), "@greeting");
        assert!(stage.condition.is_some());
        assert_eq!(stage.window, WindowTarget::Broadcast);
        assert_eq!(stage.root_mode, RootMode::Inherit);
        assert_eq!(stage.display_name(), "Greet");
    }

    #[test]
    fn test_window_self_serde() {
        let stage: BrickConfig =
            serde_json::from_value(json!({"id": "echo", "window": "self"})).unwrap();
        assert_eq!(stage.window, WindowTarget::Current);
        let value = serde_json::to_value(&stage).unwrap();
        assert_eq!(value["window"], "self");
    }

    #[test]
    fn test_output_key_validation() {
        assert_eq!(OutputKey::new("@data").unwrap().as_str(), "data");
        assert!(OutputKey::new("user_name-2").is_ok());
        assert!(OutputKey::new("2fast").is_err());
        assert!(OutputKey::new("").is_err());
        assert!(OutputKey::new("has.dot").is_err());
    }

    #[test]
    fn test_ensure_instance_ids_recurses() {
        let inner = BrickConfig::new(id("@brickyard/echo"));
        let mut outer = BrickConfig::new(id("@brickyard/run"))
            .with_arg("body", ConfigValue::pipeline(vec![inner]));
        outer.ensure_instance_ids();
        assert!(outer.instance_id.is_some());
        let body = outer.config["body"].as_pipeline().unwrap();
        assert!(body.pipeline()[0].instance_id.is_some());

        let before = outer.instance_id;
        outer.ensure_instance_ids();
        assert_eq!(outer.instance_id, before);

        outer.regenerate_instance_ids();
        assert_ne!(outer.instance_id, before);
    }

    #[test]
    fn test_flavor_allows() {
        assert!(PipelineFlavor::AllBricks.allows(BrickType::Effect));
        assert!(!PipelineFlavor::NoEffect.allows(BrickType::Effect));
        assert!(PipelineFlavor::NoEffect.allows(BrickType::Transform));
        assert!(!PipelineFlavor::NoRenderer.allows(BrickType::Renderer));
        assert!(PipelineFlavor::NoRenderer.allows(BrickType::Effect));
    }

    #[test]
    fn test_branch_segment_display() {
        assert_eq!(BranchSegment::new("body", 3).to_string(), "body[3]");
    }
}
