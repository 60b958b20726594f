//! Deletion watches over the long-poll status endpoints.
//!
//! A watch is a background task that keeps asking the server whether its
//! target still exists. It ends in exactly one terminal state:
//!
//! ```text
//! Polling ──timeout──▶ Polling
//!    │
//!    ├──deleted──▶ Notified   (on_deleted fired once)
//!    └──cancel───▶ Cancelled  (in-flight answer discarded)
//! ```

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::gateway::{PollOutcome, RemoteGateway, WatchTarget};
use crate::push::{next_delay, ReconnectConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Polling,
    Notified,
    Cancelled,
}

impl WatchState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Polling)
    }
}

pub struct DeletionWatch;

impl DeletionWatch {
    /// Watch `target` with the default transport backoff.
    pub fn spawn<F>(
        gateway: Arc<dyn RemoteGateway>,
        target: WatchTarget,
        on_deleted: F,
    ) -> WatchHandle
    where
        F: FnOnce(WatchTarget) + Send + 'static,
    {
        Self::spawn_with(gateway, target, ReconnectConfig::default(), on_deleted)
    }

    /// Watch `target`; transport errors retry after `backoff`.
    pub fn spawn_with<F>(
        gateway: Arc<dyn RemoteGateway>,
        target: WatchTarget,
        backoff: ReconnectConfig,
        on_deleted: F,
    ) -> WatchHandle
    where
        F: FnOnce(WatchTarget) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(WatchState::Polling);
        let task_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            tracing::debug!(%target, "Deletion watch started");
            let end = poll_until_terminal(gateway.as_ref(), target, &backoff, &task_cancel).await;
            state_tx.send_replace(end);
            if end == WatchState::Notified {
                on_deleted(target);
            }
            tracing::debug!(%target, state = ?end, "Deletion watch finished");
        });

        WatchHandle {
            target,
            cancel,
            state: state_rx,
            task,
        }
    }
}

async fn poll_until_terminal(
    gateway: &dyn RemoteGateway,
    target: WatchTarget,
    backoff: &ReconnectConfig,
    cancel: &CancellationToken,
) -> WatchState {
    let mut delay = backoff.initial_delay;

    loop {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return WatchState::Cancelled,
            result = gateway.poll_status(target) => result,
        };

        // The answer may have raced a cancel; a cancelled watch never acts.
        if cancel.is_cancelled() {
            tracing::debug!(%target, "Discarding long-poll answer after cancel");
            return WatchState::Cancelled;
        }

        match result {
            Ok(PollOutcome::Unchanged) => {
                tracing::trace!(%target, "Long-poll timed out, polling again");
                delay = backoff.initial_delay;
            }
            Ok(PollOutcome::Deleted) => {
                tracing::info!(%target, "Watched entity was deleted");
                return WatchState::Notified;
            }
            Err(e) => {
                tracing::warn!(
                    %target,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "Long-poll failed, retrying",
                );
                tokio::select! {
                    _ = cancel.cancelled() => return WatchState::Cancelled,
                    _ = tokio::time::sleep(delay) => {}
                }
                delay = next_delay(delay, backoff);
            }
        }
    }
}

/// Owner side of a running watch. Dropping it cancels the watch.
#[derive(Debug)]
pub struct WatchHandle {
    target: WatchTarget,
    cancel: CancellationToken,
    state: watch::Receiver<WatchState>,
    task: JoinHandle<()>,
}

impl WatchHandle {
    pub fn target(&self) -> WatchTarget {
        self.target
    }

    /// Stop watching. A poll already in flight is discarded when it returns.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn state(&self) -> WatchState {
        *self.state.borrow()
    }

    /// Wait until the watch reaches a terminal state.
    pub async fn wait_terminal(&mut self) -> WatchState {
        let reached = self.state.wait_for(WatchState::is_terminal).await.map(|state| *state);
        match reached {
            Ok(state) => state,
            Err(_) => self.state(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
