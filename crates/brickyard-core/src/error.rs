//! Registry and mod resolution errors.

use std::path::PathBuf;
use thiserror::Error;

use brickyard_protocols::{BrickError, InvalidRegistryId};

/// Failure loading bricks from a [`crate::BrickSource`].
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse brick definition {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Failure turning a mod document into runnable components.
#[derive(Debug, Error)]
pub enum ModError {
    #[error("Failed to parse mod definition: {0}")]
    Parse(String),

    #[error("Invalid inner definition '{key}': {reason}")]
    InvalidDefinition { key: String, reason: String },

    #[error("Mod component {index} has no pipeline (expected one of: {})", .keys.join(", "))]
    MissingPipeline { index: usize, keys: Vec<&'static str> },

    #[error("Invalid pipeline in mod component {index}: {message}")]
    InvalidPipeline { index: usize, message: String },

    #[error(transparent)]
    InvalidId(#[from] InvalidRegistryId),
}

impl From<ModError> for BrickError {
    fn from(err: ModError) -> Self {
        BrickError::Registry(err.to_string())
    }
}

impl From<SourceError> for BrickError {
    fn from(err: SourceError) -> Self {
        BrickError::Registry(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mod_error_into_brick_error() {
        let err: BrickError = ModError::Parse("unexpected end of input".to_string()).into();
        assert_eq!(err.name(), "RegistryError");
        assert!(err.to_string().contains("unexpected end of input"));
    }

    #[test]
    fn test_source_error_display() {
        let err = SourceError::Parse {
            path: PathBuf::from("/tmp/brick.yaml"),
            message: "missing field `metadata`".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to parse brick definition /tmp/brick.yaml: missing field `metadata`"
        );
    }
}
