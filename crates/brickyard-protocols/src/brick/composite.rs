//! User-defined bricks built from a pipeline of other bricks.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{empty_object_schema, BrickDefinition};
use crate::types::{ApiVersion, BrickPipeline, RegistryId};

/// A brick whose behaviour is a pipeline.
///
/// Its type is the type of the last stage; the registry infers it on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeBrick {
    definition: BrickDefinition,
    api_version: ApiVersion,
    pipeline: BrickPipeline,
}

impl CompositeBrick {
    pub fn new(definition: BrickDefinition, api_version: ApiVersion, pipeline: BrickPipeline) -> Self {
        Self {
            definition,
            api_version,
            pipeline,
        }
    }

    pub fn definition(&self) -> &BrickDefinition {
        &self.definition
    }

    pub fn id(&self) -> &RegistryId {
        &self.definition.id
    }

    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    pub fn pipeline(&self) -> &BrickPipeline {
        &self.pipeline
    }

    /// Copy of this brick under a different id.
    pub fn with_id(&self, id: RegistryId) -> Self {
        let mut brick = self.clone();
        brick.definition.id = id;
        brick
    }

    /// Mutable access to the pipeline, used when rewriting references.
    pub fn pipeline_mut(&mut self) -> &mut BrickPipeline {
        &mut self.pipeline
    }
}

/// Metadata block of a brick document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrickMetadata {
    pub id: RegistryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Serialized form of a user-defined brick, as stored in YAML or JSON files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeBrickSpec {
    #[serde(default)]
    pub api_version: ApiVersion,

    pub metadata: BrickMetadata,

    #[serde(default = "empty_object_schema")]
    pub input_schema: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,

    pub pipeline: BrickPipeline,
}

impl From<CompositeBrickSpec> for CompositeBrick {
    fn from(spec: CompositeBrickSpec) -> Self {
        let mut definition = BrickDefinition::new(
            spec.metadata.id,
            spec.metadata.name,
            spec.metadata.description,
        )
        .with_input_schema(spec.input_schema);
        definition.output_schema = spec.output_schema;
        definition.version = spec.metadata.version;
        CompositeBrick::new(definition, spec.api_version, spec.pipeline)
    }
}
