//! Dispatch targets and the transport traits.

use async_trait::async_trait;
use brickyard_protocols::{Actor, FrameLocation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::MessengerError;
use crate::message::Message;

/// A single context a message can be delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "location")]
pub enum MessageTarget {
    Frame(FrameLocation),
    Actor(Actor),
}

impl fmt::Display for MessageTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageTarget::Frame(frame) => write!(f, "{frame}"),
            MessageTarget::Actor(Actor::Background) => f.write_str("background"),
            MessageTarget::Actor(Actor::Sidebar) => f.write_str("sidebar"),
        }
    }
}

impl From<FrameLocation> for MessageTarget {
    fn from(frame: FrameLocation) -> Self {
        MessageTarget::Frame(frame)
    }
}

impl From<Actor> for MessageTarget {
    fn from(actor: Actor) -> Self {
        MessageTarget::Actor(actor)
    }
}

/// Where a dispatched call should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum FrameTarget {
    /// One specific frame.
    Frame { location: FrameLocation },
    /// Every frame currently attached to the tab.
    #[serde(rename_all = "camelCase")]
    AllFrames { tab_id: u32 },
    /// The top-level frame of the tab.
    #[serde(rename_all = "camelCase")]
    TopFrame { tab_id: u32 },
    Actor { actor: Actor },
}

impl FrameTarget {
    pub fn frame(location: FrameLocation) -> Self {
        FrameTarget::Frame { location }
    }

    pub fn all_frames(tab_id: u32) -> Self {
        FrameTarget::AllFrames { tab_id }
    }

    pub fn top_frame(tab_id: u32) -> Self {
        FrameTarget::TopFrame { tab_id }
    }

    pub fn actor(actor: Actor) -> Self {
        FrameTarget::Actor { actor }
    }

    /// The single context this target names, if it is not a wildcard.
    pub fn single(&self) -> Option<MessageTarget> {
        match *self {
            FrameTarget::Frame { location } => Some(MessageTarget::Frame(location)),
            FrameTarget::TopFrame { tab_id } => Some(MessageTarget::Frame(FrameLocation::top(tab_id))),
            FrameTarget::Actor { actor } => Some(MessageTarget::Actor(actor)),
            FrameTarget::AllFrames { .. } => None,
        }
    }
}

/// Delivers one message to one context and waits for its single response.
///
/// No connection state is kept between calls.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, target: MessageTarget, message: Message) -> Result<Value, MessengerError>;
}

/// Enumerates the frames currently attached to a tab.
#[async_trait]
pub trait FrameDirectory: Send + Sync {
    /// Frames of the tab in document order, top frame first.
    async fn frames(&self, tab_id: u32) -> Vec<FrameLocation>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_target() {
        assert_eq!(
            FrameTarget::top_frame(3).single(),
            Some(MessageTarget::Frame(FrameLocation::new(3, 0)))
        );
        assert_eq!(
            FrameTarget::actor(Actor::Sidebar).single(),
            Some(MessageTarget::Actor(Actor::Sidebar))
        );
        assert!(FrameTarget::all_frames(3).single().is_none());
    }

    #[test]
    fn test_frame_target_serde() {
        let value = serde_json::to_value(FrameTarget::all_frames(9)).unwrap();
        assert_eq!(value, json!({"kind": "allFrames", "tabId": 9}));
        let parsed: FrameTarget =
            serde_json::from_value(json!({"kind": "frame", "location": {"tabId": 1, "frameId": 4}}))
                .unwrap();
        assert_eq!(parsed, FrameTarget::frame(FrameLocation::new(1, 4)));
    }

    #[test]
    fn test_message_target_display() {
        assert_eq!(MessageTarget::from(Actor::Background).to_string(), "background");
        assert_eq!(MessageTarget::from(FrameLocation::new(2, 5)).to_string(), "tab 2 frame 5");
    }
}
