//! Typed RPC client over a [`Messenger`].

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use brickyard_protocols::{AbortSignal, FrameLocation};
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::DispatchError;
use crate::message::{DispatchRequest, Message};
use crate::target::{FrameDirectory, FrameTarget, MessageTarget, Messenger};

/// Timeout applied when the caller does not pick one.
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    /// Per-target timeout; `None` uses the dispatcher default.
    pub timeout: Option<Duration>,

    /// Aborting cancels every outstanding per-target call.
    pub abort: AbortSignal,
}

impl DispatchOptions {
    pub fn new(abort: AbortSignal) -> Self {
        Self {
            timeout: None,
            abort,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Sends brick requests to other contexts.
#[derive(Clone)]
pub struct Dispatcher {
    messenger: Arc<dyn Messenger>,
    frames: Arc<dyn FrameDirectory>,
    default_timeout: Duration,
}

impl Dispatcher {
    pub fn new(messenger: Arc<dyn Messenger>, frames: Arc<dyn FrameDirectory>) -> Self {
        Self {
            messenger,
            frames,
            default_timeout: DEFAULT_DISPATCH_TIMEOUT,
        }
    }

    /// Set default timeout.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Run a request at `target`.
    ///
    /// An [`FrameTarget::AllFrames`] target resolves to an array holding the
    /// results of the frames that succeeded.
    pub async fn dispatch(
        &self,
        target: FrameTarget,
        request: &DispatchRequest,
        options: &DispatchOptions,
    ) -> Result<Value, DispatchError> {
        let target = match target {
            FrameTarget::AllFrames { tab_id } => {
                return self
                    .dispatch_all(tab_id, request, options)
                    .await
                    .map(Value::Array);
            }
            FrameTarget::Frame { location } => MessageTarget::Frame(location),
            FrameTarget::TopFrame { tab_id } => MessageTarget::Frame(FrameLocation::top(tab_id)),
            FrameTarget::Actor { actor } => MessageTarget::Actor(actor),
        };
        let message = self.message(target, request)?;
        self.call(target, message, options).await
    }

    /// Run a request at every target concurrently.
    ///
    /// Results come back in target order; one target failing does not affect
    /// the others.
    pub async fn broadcast(
        &self,
        targets: &[MessageTarget],
        request: &DispatchRequest,
        options: &DispatchOptions,
    ) -> Vec<Result<Value, DispatchError>> {
        let calls = targets.iter().map(|target| async move {
            let message = self.message(*target, request)?;
            self.call(*target, message, options).await
        });
        join_all(calls).await
    }

    /// Run a request in every frame of a tab, keeping only fulfilled results.
    ///
    /// Rejected frames are dropped from the result, which otherwise keeps
    /// frame order. Cancellation rejects the whole call.
    pub async fn dispatch_all(
        &self,
        tab_id: u32,
        request: &DispatchRequest,
        options: &DispatchOptions,
    ) -> Result<Vec<Value>, DispatchError> {
        let frames: Vec<MessageTarget> = self
            .frames
            .frames(tab_id)
            .await
            .into_iter()
            .map(MessageTarget::Frame)
            .collect();
        debug!(
            tab_id,
            frames = frames.len(),
            brick_id = %request.brick_id,
            "Dispatching to all frames"
        );

        let mut fulfilled = Vec::with_capacity(frames.len());
        for result in self.broadcast(&frames, request, options).await {
            match result {
                Ok(value) => fulfilled.push(value),
                Err(e) if e.is_cancellation() => return Err(e),
                Err(e) => warn!(tab_id, error = %e, "Frame rejected dispatched brick"),
            }
        }
        Ok(fulfilled)
    }

    /// Frame targets get their own location stamped into the run options.
    fn message(
        &self,
        target: MessageTarget,
        request: &DispatchRequest,
    ) -> Result<Message, DispatchError> {
        let message = match target {
            MessageTarget::Frame(location) => {
                let mut request = request.clone();
                request.options.frame = Some(location);
                Message::run_brick(&request)
            }
            MessageTarget::Actor(_) => Message::run_brick(request),
        };
        message.map_err(|source| DispatchError::Messenger { target, source })
    }

    /// One call raced against the timeout and the abort signal.
    async fn call(
        &self,
        target: MessageTarget,
        message: Message,
        options: &DispatchOptions,
    ) -> Result<Value, DispatchError> {
        if options.abort.is_aborted() {
            return Err(DispatchError::Cancelled(target));
        }
        let timeout = options.timeout.unwrap_or(self.default_timeout);

        tokio::select! {
            biased;
            _ = options.abort.aborted() => {
                debug!(%target, "Dispatch cancelled");
                Err(DispatchError::Cancelled(target))
            }
            result = tokio::time::timeout(timeout, self.messenger.send(target, message)) => {
                match result {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(source)) => Err(DispatchError::Messenger { target, source }),
                    Err(_) => {
                        warn!(%target, timeout_ms = timeout.as_millis() as u64, "Dispatch timed out");
                        Err(DispatchError::Timeout {
                            target,
                            timeout_ms: timeout.as_millis() as u64,
                        })
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}
