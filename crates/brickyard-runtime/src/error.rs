//! Runtime-specific errors.

use thiserror::Error;

/// A trace record could not be stored.
///
/// Trace failures are logged by the interpreter and never fail a run.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Trace storage error: {0}")]
    Storage(String),

    #[error("Trace serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<tokio_rusqlite::Error> for TraceError {
    fn from(error: tokio_rusqlite::Error) -> Self {
        Self::Storage(error.to_string())
    }
}

impl From<rusqlite::Error> for TraceError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Storage(error.to_string())
    }
}
