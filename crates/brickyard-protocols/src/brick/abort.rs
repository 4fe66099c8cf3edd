//! Cooperative cancellation.

use tokio_util::sync::CancellationToken;

use crate::error::BrickError;

/// Signal threaded explicitly through every stage and sub-pipeline call.
///
/// Aborting a signal aborts every child created from it, but never its parent.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    token: CancellationToken,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal.
    pub fn abort(&self) {
        self.token.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A signal that fires when this one does, and can also be fired on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    /// Fail with [`BrickError::Cancelled`] once the signal has fired.
    pub fn check(&self) -> Result<(), BrickError> {
        if self.is_aborted() {
            Err(BrickError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolves when the signal fires.
    pub async fn aborted(&self) {
        self.token.cancelled().await
    }

    /// The underlying token, for racing against other futures.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_abort_and_check() {
        let signal = AbortSignal::new();
        assert!(signal.check().is_ok());
        signal.abort();
        assert!(signal.is_aborted());
        assert!(matches!(signal.check(), Err(BrickError::Cancelled)));
    }

    #[test]
    fn test_child_follows_parent_only() {
        let parent = AbortSignal::new();
        let child = parent.child();
        child.abort();
        assert!(!parent.is_aborted());

        let other = parent.child();
        parent.abort();
        assert!(other.is_aborted());
    }

    #[test]
    fn test_clones_share_state() {
        let signal = AbortSignal::new();
        let clone = signal.clone();
        clone.abort();
        assert!(signal.is_aborted());
    }

    #[tokio::test]
    async fn test_aborted_future_resolves() {
        let signal = AbortSignal::new();
        let trigger = signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.abort();
        });
        tokio::time::timeout(Duration::from_secs(1), signal.aborted())
            .await
            .unwrap();
    }
}
