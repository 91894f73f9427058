//! Background task executor
//!
//! Fire-and-forget writes (content edits, delivered upgrades) run here so the
//! caller can answer without waiting for them. Failures are logged, never
//! returned. `wait_idle` lets shutdown and tests wait for the queue to drain.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct Inner {
    in_flight: AtomicUsize,
    idle: Notify,
}

/// Decrements the in-flight count even if the task panics
struct InFlightGuard(Arc<Inner>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Spawns and tracks best-effort background work
#[derive(Debug, Clone, Default)]
pub struct BackgroundTasks {
    inner: Arc<Inner>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` on the runtime; an `Err` is logged with `name`
    pub fn spawn<F, E>(&self, name: &'static str, task: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        self.inner.in_flight.fetch_add(1, Ordering::AcqRel);
        let guard = InFlightGuard(Arc::clone(&self.inner));

        tokio::spawn(async move {
            let _guard = guard;
            match task.await {
                Ok(()) => debug!(task = name, "Background task finished"),
                Err(e) => warn!(task = name, error = %e, "Background task failed"),
            }
        });
    }

    /// Number of tasks spawned but not yet finished
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Wait until no task is in flight
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_idle_waits_for_tasks() {
        let tasks = BackgroundTasks::new();
        let done = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&done);
        tasks.spawn("sleep", async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            flag.store(true, Ordering::SeqCst);
            Ok::<(), String>(())
        });

        tasks.wait_idle().await;
        assert!(done.load(Ordering::SeqCst));
        assert_eq!(tasks.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let tasks = BackgroundTasks::new();
        tasks.spawn("fails", async { Err::<(), _>("boom") });
        tasks.wait_idle().await;
        assert_eq!(tasks.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle_with_nothing_running() {
        BackgroundTasks::new().wait_idle().await;
    }
}
