//! One-shot delayed action
//!
//! Runs a future once after a delay on a tokio task unless cancelled first.
//! The pending/fired/cancelled transition is a single compare-and-swap, so
//! the action runs at most once and `cancel` reports exactly whether it won.

use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const PENDING: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

/// Handle to an action scheduled with `DeferredAction::schedule`
#[derive(Debug)]
pub struct DeferredAction {
    label: String,
    state: Arc<AtomicU8>,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl DeferredAction {
    /// Run `action` after `delay`. Must be called inside a tokio runtime.
    pub fn schedule<F, Fut>(label: impl Into<String>, delay: Duration, action: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let label = label.into();
        let state = Arc::new(AtomicU8::new(PENDING));
        let token = CancellationToken::new();

        let handle = {
            let state = state.clone();
            let token = token.clone();
            let label = label.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!(label = %label, "Deferred action cancelled");
                    }
                    _ = tokio::time::sleep(delay) => {
                        if state
                            .compare_exchange(PENDING, FIRED, Ordering::SeqCst, Ordering::SeqCst)
                            .is_ok()
                        {
                            debug!(label = %label, "Running deferred action");
                            action().await;
                        }
                    }
                }
            })
        };

        debug!(label = %label, delay_secs = delay.as_secs_f64(), "Deferred action scheduled");
        Self {
            label,
            state,
            token,
            handle,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Prevent the action from running. Returns false if it already started.
    pub fn cancel(&self) -> bool {
        let won = self
            .state
            .compare_exchange(PENDING, CANCELLED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        self.token.cancel();
        won
    }

    /// Whether the action started running
    pub fn has_fired(&self) -> bool {
        self.state.load(Ordering::SeqCst) == FIRED
    }

    /// Whether the action is neither cancelled nor started
    pub fn is_pending(&self) -> bool {
        self.state.load(Ordering::SeqCst) == PENDING
    }

    /// Whether the background task has completed
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
