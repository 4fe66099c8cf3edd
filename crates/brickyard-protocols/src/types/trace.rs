//! Trace records written after every attempted stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{BranchSegment, RegistryId};
use crate::error::BrickError;

/// A serialized error, as stored in traces and shown to users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedError {
    pub name: String,
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brick_id: Option<RegistryId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_index: Option<usize>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<BranchSegment>,
}

impl From<&BrickError> for SerializedError {
    fn from(error: &BrickError) -> Self {
        let (brick_id, stage_index, branches) = match error {
            BrickError::PipelineStage {
                brick_id,
                stage_index,
                branches,
                ..
            } => (Some(brick_id.clone()), Some(*stage_index), branches.clone()),
            _ => (None, None, Vec::new()),
        };
        Self {
            name: error.name().to_string(),
            message: error.root_cause().to_string(),
            brick_id,
            stage_index,
            branches,
        }
    }
}

/// One append-only log entry for a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceRecord {
    pub run_id: Uuid,
    pub branches: Vec<BranchSegment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mod_component_id: Option<Uuid>,

    pub brick_instance_id: Option<Uuid>,
    pub brick_id: RegistryId,
    pub stage_index: usize,
    pub timestamp: DateTime<Utc>,

    /// Arguments after expression resolution; absent when resolution failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered_args: Option<Value>,

    /// Variables the stage's expressions were resolved against.
    pub template_context: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<SerializedError>,

    pub duration_ms: u64,
}

impl TraceRecord {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_error_from_stage_error() {
        let brick_id = RegistryId::new("@test/throw").unwrap();
        let err = BrickError::Business("boom".to_string()).at_stage(
            brick_id.clone(),
            1,
            vec![BranchSegment::new("body", 2)],
        );
        let serialized = SerializedError::from(&err);
        assert_eq!(serialized.name, "BusinessError");
        assert_eq!(serialized.message, "boom");
        assert_eq!(serialized.brick_id, Some(brick_id));
        assert_eq!(serialized.stage_index, Some(1));
        assert_eq!(serialized.branches.len(), 1);
    }

    #[test]
    fn test_serialized_error_plain() {
        let serialized = SerializedError::from(&BrickError::Cancelled);
        assert_eq!(serialized.name, "CancellationError");
        assert!(serialized.brick_id.is_none());
        let value = serde_json::to_value(&serialized).unwrap();
        assert!(value.get("branches").is_none());
    }
}
