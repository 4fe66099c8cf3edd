//! In-process transport.

use std::sync::Arc;

use async_trait::async_trait;
use brickyard_protocols::FrameLocation;
use dashmap::DashMap;
use serde_json::Value;
use tracing::trace;

use crate::error::MessengerError;
use crate::message::Message;
use crate::target::{FrameDirectory, MessageTarget, Messenger};

/// Receives messages addressed to one context.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: Message) -> Result<Value, MessengerError>;
}

/// Routes messages to handlers registered in the same process.
///
/// Every registered frame counts as attached to its tab.
#[derive(Default, Clone)]
pub struct LocalMessenger {
    handlers: Arc<DashMap<MessageTarget, Arc<dyn MessageHandler>>>,
}

impl LocalMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous handler for the target.
    pub fn register(&self, target: impl Into<MessageTarget>, handler: Arc<dyn MessageHandler>) {
        self.handlers.insert(target.into(), handler);
    }

    /// Detach a context, e.g. after its frame navigated away.
    pub fn unregister(&self, target: impl Into<MessageTarget>) -> bool {
        self.handlers.remove(&target.into()).is_some()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[async_trait]
impl Messenger for LocalMessenger {
    async fn send(&self, target: MessageTarget, message: Message) -> Result<Value, MessengerError> {
        // Clone out of the map so no shard lock is held across the await.
        let handler = self
            .handlers
            .get(&target)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(MessengerError::Unreachable(target))?;
        trace!(%target, kind = %message.kind, "Delivering message");
        handler.handle(message).await
    }
}

#[async_trait]
impl FrameDirectory for LocalMessenger {
    async fn frames(&self, tab_id: u32) -> Vec<FrameLocation> {
        let mut frames: Vec<FrameLocation> = self
            .handlers
            .iter()
            .filter_map(|entry| match entry.key() {
                MessageTarget::Frame(frame) if frame.tab_id == tab_id => Some(*frame),
                _ => None,
            })
            .collect();
        frames.sort_by_key(|frame| frame.frame_id);
        frames
    }
}

impl std::fmt::Debug for LocalMessenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalMessenger")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
