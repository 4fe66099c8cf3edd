//! Mod resolution.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::{debug, info};
use uuid::Uuid;

use brickyard_protocols::{
    empty_object_schema, ensure_instance_ids, ApiVersion, Brick, BrickDefinition, BrickPipeline,
    CompositeBrick, RegistryId, EXPRESSION_TYPE_KEY, EXPRESSION_VALUE_KEY,
};

use super::{InnerDefinition, InnerKind, ModDefinition};
use crate::error::ModError;
use crate::registry::BrickRegistry;

/// Component config keys that hold the pipeline, in lookup order.
pub const PIPELINE_KEYS: &[&str] = &["pipeline", "action", "body", "effect"];

const INTERNAL_HASH_BYTES: usize = 16;

/// A mod component ready to run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedModComponent {
    /// Fresh id for this activation of the component.
    pub id: Uuid,
    pub mod_id: RegistryId,
    pub label: String,
    pub starter_brick: RegistryId,
    pub api_version: ApiVersion,
    pub pipeline: BrickPipeline,
    /// Option values, initialised from the schema defaults.
    pub options: Value,
    pub integrations: Option<Value>,
}

/// Content-addressed id for an inline definition.
pub fn internal_id(definition: &Value) -> RegistryId {
    let canonical = serde_json::to_string(definition).unwrap_or_default();
    let digest = Sha256::digest(canonical.as_bytes());
    RegistryId::internal(&hex::encode(&digest[..INTERNAL_HASH_BYTES]))
}

/// Resolve a mod document into runnable components.
///
/// Inline component definitions are registered into `registry` as composite
/// bricks, and every stage that references an inline definition by key is
/// rewritten to the definition's internal id.
pub fn resolve_mod(
    definition: &ModDefinition,
    registry: &BrickRegistry,
) -> Result<Vec<ResolvedModComponent>, ModError> {
    let mut mapping = BTreeMap::new();
    let mut components = Vec::new();
    for (key, inner) in &definition.definitions {
        let kind = inner.kind(key)?;
        let id = internal_id(&inner.0);
        debug!(key = %key, id = %id, ?kind, "Assigned internal id");
        mapping.insert(key.clone(), id);
        if kind == InnerKind::Component {
            components.push((key, inner));
        }
    }

    let bricks = components
        .into_iter()
        .map(|(key, inner)| {
            inner_component(key, inner, &mapping, definition.api_version).map(Brick::composite)
        })
        .collect::<Result<Vec<_>, _>>()?;
    registry.register(bricks);

    let resolved = definition
        .extension_points
        .iter()
        .enumerate()
        .map(|(index, component)| -> Result<ResolvedModComponent, ModError> {
            let starter_brick = match mapping.get(&component.id) {
                Some(id) => id.clone(),
                None => RegistryId::new(component.id.clone())?,
            };
            let raw = PIPELINE_KEYS
                .iter()
                .find_map(|key| component.config.get(*key))
                .ok_or_else(|| ModError::MissingPipeline {
                    index,
                    keys: PIPELINE_KEYS.to_vec(),
                })?;
            let pipeline = parse_pipeline(raw, &mapping)
                .map_err(|message| ModError::InvalidPipeline { index, message })?;
            Ok(ResolvedModComponent {
                id: Uuid::new_v4(),
                mod_id: definition.metadata.id.clone(),
                label: component
                    .label
                    .clone()
                    .unwrap_or_else(|| definition.metadata.name.clone()),
                starter_brick,
                api_version: definition.api_version,
                pipeline,
                options: definition.default_options(),
                integrations: component.integrations.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        mod_id = %definition.metadata.id,
        components = resolved.len(),
        inner_definitions = mapping.len(),
        "Resolved mod"
    );
    Ok(resolved)
}

fn inner_component(
    key: &str,
    inner: &InnerDefinition,
    mapping: &BTreeMap<String, RegistryId>,
    default_api_version: ApiVersion,
) -> Result<CompositeBrick, ModError> {
    let invalid = |reason: String| ModError::InvalidDefinition {
        key: key.to_string(),
        reason,
    };
    let obj = inner
        .0
        .as_object()
        .ok_or_else(|| invalid("definition must be an object".to_string()))?;
    let id = mapping
        .get(key)
        .cloned()
        .ok_or_else(|| invalid("definition has no id".to_string()))?;

    let api_version = match obj.get("apiVersion") {
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| invalid(e.to_string()))?,
        None => default_api_version,
    };
    let metadata = obj.get("metadata");
    let text = |field: &str| {
        metadata
            .and_then(|m| m.get(field))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    let mut definition = BrickDefinition::new(
        id,
        text("name").unwrap_or_else(|| key.to_string()),
        text("description").unwrap_or_default(),
    )
    .with_input_schema(
        obj.get("inputSchema")
            .cloned()
            .unwrap_or_else(empty_object_schema),
    );
    definition.output_schema = obj.get("outputSchema").cloned();
    definition.version = text("version");

    let raw = obj
        .get("pipeline")
        .ok_or_else(|| invalid("missing pipeline".to_string()))?;
    let pipeline = parse_pipeline(raw, mapping).map_err(invalid)?;
    Ok(CompositeBrick::new(definition, api_version, pipeline))
}

/// Parse a pipeline from a stage list, a single stage or a pipeline
/// expression, rewriting references to inline definitions.
fn parse_pipeline(
    raw: &Value,
    mapping: &BTreeMap<String, RegistryId>,
) -> Result<BrickPipeline, String> {
    let mut stages = match raw {
        Value::Null => Value::Array(Vec::new()),
        Value::Array(_) => raw.clone(),
        Value::Object(obj) if is_pipeline_expression(obj) => obj
            .get(EXPRESSION_VALUE_KEY)
            .cloned()
            .filter(|v| !v.is_null())
            .unwrap_or_else(|| Value::Array(Vec::new())),
        Value::Object(_) => Value::Array(vec![raw.clone()]),
        other => return Err(format!("expected a list of stages, found {other}")),
    };
    rewrite_stages(&mut stages, mapping);
    let mut pipeline: BrickPipeline = serde_json::from_value(stages).map_err(|e| e.to_string())?;
    ensure_instance_ids(&mut pipeline);
    Ok(pipeline)
}

fn is_pipeline_expression(obj: &serde_json::Map<String, Value>) -> bool {
    obj.get(EXPRESSION_TYPE_KEY).and_then(Value::as_str) == Some("pipeline")
}

fn rewrite_stages(stages: &mut Value, mapping: &BTreeMap<String, RegistryId>) {
    if let Value::Array(items) = stages {
        for stage in items {
            rewrite_stage(stage, mapping);
        }
    }
}

fn rewrite_stage(stage: &mut Value, mapping: &BTreeMap<String, RegistryId>) {
    let Value::Object(obj) = stage else {
        return;
    };
    if let Some(Value::String(id)) = obj.get_mut("id") {
        if let Some(internal) = mapping.get(id.as_str()) {
            *id = internal.to_string();
        }
    }
    for key in ["config", "if"] {
        if let Some(value) = obj.get_mut(key) {
            rewrite_nested(value, mapping);
        }
    }
}

fn rewrite_nested(value: &mut Value, mapping: &BTreeMap<String, RegistryId>) {
    match value {
        Value::Object(obj) if is_pipeline_expression(obj) => {
            if let Some(stages) = obj.get_mut(EXPRESSION_VALUE_KEY) {
                rewrite_stages(stages, mapping);
            }
        }
        Value::Object(obj) => obj.values_mut().for_each(|v| rewrite_nested(v, mapping)),
        Value::Array(items) => items.iter_mut().for_each(|v| rewrite_nested(v, mapping)),
        _ => {}
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
