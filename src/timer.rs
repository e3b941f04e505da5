//! Delayed one-shot tasks
//!
//! Highlight clears and toast dismissal run after a fixed delay. They are
//! plain spawned tasks that can be cancelled; dropping a [`ScheduledTask`]
//! does not cancel it, so callers can fire and forget.

use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Handle to a task scheduled with [`schedule`]
#[derive(Debug)]
pub struct ScheduledTask {
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Stop the task if it has not run yet.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Whether the task has run or been cancelled.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Run `action` once after `delay`.
///
/// Must be called from inside a tokio runtime.
pub fn schedule<F>(delay: Duration, action: F) -> ScheduledTask
where
    F: FnOnce() + Send + 'static,
{
    let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        action();
    });
    ScheduledTask { handle }
}

/// Holds at most one pending task; scheduling a new one cancels the old one.
#[derive(Debug, Default)]
pub struct SupersedingTimer {
    pending: Mutex<Option<ScheduledTask>>,
}

impl SupersedingTimer {
    /// Create a timer with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel whatever is pending and schedule `action` after `delay`.
    pub fn replace<F>(&self, delay: Duration, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let task = schedule(delay, action);
        match self.pending.lock() {
            Ok(mut pending) => {
                if let Some(previous) = pending.replace(task) {
                    previous.cancel();
                }
            }
            Err(poisoned) => {
                tracing::warn!("Timer lock poisoned, recovering");
                if let Some(previous) = poisoned.into_inner().replace(task) {
                    previous.cancel();
                }
            }
        }
    }
}
