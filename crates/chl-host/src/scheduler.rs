//! Repeating timer callbacks.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Spawns repeating callbacks on a tokio runtime.
#[derive(Debug, Clone)]
pub struct TickScheduler {
    runtime: Handle,
}

impl TickScheduler {
    /// A scheduler on the given runtime.
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// A scheduler on the runtime of the calling task.
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Run `callback` every `interval`, starting one interval from now.
    /// Late ticks are skipped rather than bunched up.
    pub fn schedule_repeating<F>(&self, interval: Duration, mut callback: F) -> TickHandle
    where
        F: FnMut() + Send + 'static,
    {
        let task = self.runtime.spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            timer.tick().await;
            loop {
                timer.tick().await;
                callback();
            }
        });
        TickHandle { task }
    }
}

/// Handle to a repeating callback.
#[derive(Debug)]
pub struct TickHandle {
    task: JoinHandle<()>,
}

impl TickHandle {
    /// Stop the callback. No further invocations start after this returns.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Whether the callback has stopped.
    pub fn is_cancelled(&self) -> bool {
        self.task.is_finished()
    }
}
