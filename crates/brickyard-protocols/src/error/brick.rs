//! Pipeline and brick execution errors.

use thiserror::Error;

use super::{ContextError, TypeInferenceError};
use crate::types::{BranchSegment, PlatformCapability, RegistryId};

/// Errors raised while running a pipeline or an individual brick.
#[derive(Debug, Error)]
pub enum BrickError {
    #[error("Brick not found: {0}")]
    BrickNotFound(RegistryId),

    #[error("Invalid input for brick {brick_id}: {}", .errors.join("; "))]
    InputValidation {
        brick_id: RegistryId,
        errors: Vec<String>,
    },

    #[error("Invalid template: {message}")]
    InvalidTemplate { template: String, message: String },

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("Brick {brick_id} requires capabilities not available on this platform: {}", format_capabilities(.missing))]
    MissingCapability {
        brick_id: RegistryId,
        missing: Vec<PlatformCapability>,
    },

    #[error("Pipeline run was cancelled")]
    Cancelled,

    #[error(transparent)]
    TypeInference(#[from] TypeInferenceError),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Dispatch failed: {0}")]
    Dispatch(String),

    #[error("Maximum pipeline nesting depth of {0} exceeded")]
    MaxDepthExceeded(usize),

    #[error("{0}")]
    Business(String),

    #[error("{0}")]
    Execution(String),

    #[error("Error in stage {stage_index} ({brick_id}): {source}")]
    PipelineStage {
        brick_id: RegistryId,
        stage_index: usize,
        branches: Vec<BranchSegment>,
        #[source]
        source: Box<BrickError>,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BrickError {
    /// Create a brick-internal execution error.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    /// Whether this error (or the error it wraps) is a cancellation.
    ///
    /// Cancellations terminate a run but are not reported as failures.
    pub fn is_cancellation(&self) -> bool {
        matches!(self.root_cause(), BrickError::Cancelled)
    }

    /// Unwrap stage context wrappers down to the originating error.
    pub fn root_cause(&self) -> &BrickError {
        match self {
            BrickError::PipelineStage { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Stable error name used in trace records and user-visible reports.
    pub fn name(&self) -> &'static str {
        match self {
            BrickError::BrickNotFound(_) => "BrickNotFoundError",
            BrickError::InputValidation { .. } => "InputValidationError",
            BrickError::InvalidTemplate { .. } => "InvalidTemplateError",
            BrickError::Context(_) => "ContextError",
            BrickError::MissingCapability { .. } => "MissingCapabilityError",
            BrickError::Cancelled => "CancellationError",
            BrickError::TypeInference(_) => "TypeInferenceError",
            BrickError::Registry(_) => "RegistryError",
            BrickError::Dispatch(_) => "DispatchError",
            BrickError::MaxDepthExceeded(_) => "MaxDepthError",
            BrickError::Business(_) => "BusinessError",
            BrickError::Execution(_) => "Error",
            BrickError::PipelineStage { source, .. } => source.name(),
            BrickError::Serialization(_) => "SerializationError",
        }
    }

    /// Wrap the error with the location of the failing stage.
    ///
    /// Errors that already carry a location and cancellations pass through unchanged.
    pub fn at_stage(
        self,
        brick_id: RegistryId,
        stage_index: usize,
        branches: Vec<BranchSegment>,
    ) -> Self {
        match self {
            BrickError::Cancelled | BrickError::PipelineStage { .. } => self,
            other => BrickError::PipelineStage {
                brick_id,
                stage_index,
                branches,
                source: Box::new(other),
            },
        }
    }
}

fn format_capabilities(capabilities: &[PlatformCapability]) -> String {
    capabilities
        .iter()
        .map(|capability| capability.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> RegistryId {
        RegistryId::new(value).unwrap()
    }

    #[test]
    fn test_brick_not_found_display() {
        let err = BrickError::BrickNotFound(id("@test/missing"));
        assert_eq!(err.to_string(), "Brick not found: @test/missing");
        assert_eq!(err.name(), "BrickNotFoundError");
    }

    #[test]
    fn test_input_validation_display() {
        let err = BrickError::InputValidation {
            brick_id: id("@test/echo"),
            errors: vec!["a".to_string(), "b".to_string()],
        };
        let display = err.to_string();
        assert!(display.contains("@test/echo"));
        assert!(display.contains("a; b"));
    }

    #[test]
    fn test_missing_capability_display() {
        let err = BrickError::MissingCapability {
            brick_id: id("@test/dom"),
            missing: vec![PlatformCapability::Dom, PlatformCapability::Http],
        };
        assert!(err.to_string().contains("dom, http"));
    }

    #[test]
    fn test_at_stage_wraps_once() {
        let err = BrickError::execution("boom")
            .at_stage(id("@test/inner"), 2, Vec::new())
            .at_stage(id("@test/outer"), 0, Vec::new());
        match &err {
            BrickError::PipelineStage {
                brick_id,
                stage_index,
                ..
            } => {
                assert_eq!(brick_id.as_str(), "@test/inner");
                assert_eq!(*stage_index, 2);
            }
            other => panic!("Expected PipelineStage, got {other:?}"),
        }
        assert!(matches!(err.root_cause(), BrickError::Execution(msg) if msg == "boom"));
    }

    #[test]
    fn test_cancellation_never_wrapped() {
        let err = BrickError::Cancelled.at_stage(id("@test/a"), 1, Vec::new());
        assert!(matches!(err, BrickError::Cancelled));
        assert!(err.is_cancellation());
    }

    #[test]
    fn test_name_follows_root_cause() {
        let err = BrickError::InvalidTemplate {
            template: "{{".to_string(),
            message: "unexpected end".to_string(),
        }
        .at_stage(id("@test/a"), 0, Vec::new());
        assert_eq!(err.name(), "InvalidTemplateError");
        assert!(!err.is_cancellation());
    }
}
