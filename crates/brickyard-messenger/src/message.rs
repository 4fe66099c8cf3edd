//! Wire messages.

use brickyard_protocols::{ApiVersion, BranchSegment, FrameLocation, RegistryId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::MessengerError;

/// Message type for running a single brick in another context.
pub const RUN_BRICK: &str = "RUN_BRICK";

/// Envelope delivered by a [`Messenger`](crate::Messenger).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: Value,
}

impl Message {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    pub fn run_brick(request: &DispatchRequest) -> Result<Self, MessengerError> {
        Ok(Self::new(RUN_BRICK, serde_json::to_value(request)?))
    }

    /// Decode the payload of a [`RUN_BRICK`] message.
    pub fn into_request(self) -> Result<DispatchRequest, MessengerError> {
        if self.kind != RUN_BRICK {
            return Err(MessengerError::UnknownMessageType(self.kind));
        }
        Ok(serde_json::from_value(self.payload)?)
    }
}

/// Request to run one brick remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequest {
    pub brick_id: RegistryId,

    /// Fully resolved arguments.
    #[serde(default)]
    pub args: Map<String, Value>,

    #[serde(default)]
    pub options: RemoteRunOptions,
}

impl DispatchRequest {
    pub fn new(brick_id: RegistryId, args: Map<String, Value>) -> Self {
        Self {
            brick_id,
            args,
            options: RemoteRunOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RemoteRunOptions) -> Self {
        self.options = options;
        self
    }
}

/// The part of the caller's run state that travels with a request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRunOptions {
    /// Caller's context variables.
    #[serde(default)]
    pub ctxt: Map<String, Value>,

    #[serde(default)]
    pub api_version: ApiVersion,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mod_component_id: Option<Uuid>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<BranchSegment>,

    /// Frame the request is delivered to. Set by the dispatcher per target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<FrameLocation>,
}
