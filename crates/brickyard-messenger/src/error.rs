//! Messenger and dispatch errors.

use brickyard_protocols::BrickError;
use thiserror::Error;

use crate::target::MessageTarget;

/// Errors raised by a transport while delivering a single message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MessengerError {
    /// Nothing is listening at the target (frame navigated away, tab closed).
    #[error("Target {0} is not reachable")]
    Unreachable(MessageTarget),

    #[error("No handler registered for message type '{0}'")]
    UnknownMessageType(String),

    /// The receiving context handled the message and reported an error.
    #[error("{name}: {message}")]
    Remote { name: String, message: String },

    #[error("Malformed message: {0}")]
    Malformed(String),
}

impl MessengerError {
    pub fn remote(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for MessengerError {
    fn from(error: serde_json::Error) -> Self {
        Self::Malformed(error.to_string())
    }
}

/// Errors for one dispatched call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("Call to {target} timed out after {timeout_ms}ms")]
    Timeout {
        target: MessageTarget,
        timeout_ms: u64,
    },

    #[error("Call to {0} was cancelled")]
    Cancelled(MessageTarget),

    #[error("Call to {target} failed: {source}")]
    Messenger {
        target: MessageTarget,
        #[source]
        source: MessengerError,
    },
}

impl DispatchError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, DispatchError::Cancelled(_))
    }
}

impl From<DispatchError> for BrickError {
    fn from(error: DispatchError) -> Self {
        match error {
            DispatchError::Cancelled(_) => BrickError::Cancelled,
            DispatchError::Messenger {
                source: MessengerError::Remote { name, message },
                ..
            } if name == "BusinessError" => BrickError::Business(message),
            other => BrickError::Dispatch(other.to_string()),
        }
    }
}
