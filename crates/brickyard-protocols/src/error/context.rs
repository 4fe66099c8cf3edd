//! Variable resolution errors.

use thiserror::Error;

/// A required variable path could not be resolved against the runtime context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Variable {path} is not available: missing {segment}")]
pub struct ContextError {
    /// The full path that was being resolved.
    pub path: String,

    /// The segment that was missing.
    pub segment: String,
}

impl ContextError {
    pub fn new(path: impl Into<String>, segment: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            segment: segment.into(),
        }
    }
}
