//! Bounded pool for fire-and-forget work (cache refreshes, broker sends).
//!
//! A task that finds the pool saturated is dropped with a warning; callers
//! never wait for a slot.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::infrastructure::metrics::LobbyMetrics;

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(2);

#[derive(Clone)]
pub struct BackgroundTasks {
    permits: Arc<Semaphore>,
    capacity: usize,
    metrics: Arc<LobbyMetrics>,
}

impl BackgroundTasks {
    pub fn new(capacity: usize, metrics: Arc<LobbyMetrics>) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            metrics,
        }
    }

    /// Run `task` in the background if a slot is free. Returns whether it was scheduled.
    pub fn spawn<F>(&self, name: &'static str, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(permit) => {
                tokio::spawn(async move {
                    task.await;
                    drop(permit);
                });
                true
            }
            Err(_) => {
                tracing::warn!(task = name, capacity = self.capacity, "Background pool saturated, dropping task");
                self.metrics.background_dropped();
                false
            }
        }
    }

    /// Slots currently in use.
    pub fn in_flight(&self) -> usize {
        self.capacity - self.permits.available_permits()
    }

    /// Wait until every scheduled task, including tasks spawned by tasks, has finished.
    ///
    /// Polls instead of acquiring every permit so a running task can still
    /// schedule follow-up work while someone waits.
    pub async fn idle(&self) {
        while self.in_flight() > 0 {
            tokio::time::sleep(IDLE_POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn runs_tasks_and_waits_for_idle() {
        let tasks = BackgroundTasks::new(4, Arc::new(LobbyMetrics::new()));
        let done = Arc::new(AtomicU32::new(0));

        for _ in 0..3 {
            let done = done.clone();
            assert!(tasks.spawn("count", async move {
                done.fetch_add(1, Ordering::SeqCst);
            }));
        }
        tasks.idle().await;

        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(tasks.in_flight(), 0);
    }

    #[tokio::test]
    async fn saturated_pool_drops_and_counts() {
        let metrics = Arc::new(LobbyMetrics::new());
        let tasks = BackgroundTasks::new(1, metrics.clone());
        let (release, wait) = tokio::sync::oneshot::channel::<()>();

        assert!(tasks.spawn("blocker", async move {
            let _ = wait.await;
        }));
        assert!(!tasks.spawn("extra", async {}));
        assert_eq!(metrics.snapshot().background_dropped, 1);

        let _ = release.send(());
        tasks.idle().await;
        assert!(tasks.spawn("after", async {}));
    }

    #[tokio::test]
    async fn idle_covers_follow_up_tasks() {
        let tasks = BackgroundTasks::new(2, Arc::new(LobbyMetrics::new()));
        let done = Arc::new(AtomicU32::new(0));

        let inner_tasks = tasks.clone();
        let inner_done = done.clone();
        assert!(tasks.spawn("outer", async move {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            inner_tasks.spawn("inner", async move {
                inner_done.fetch_add(1, Ordering::SeqCst);
            });
        }));
        tasks.idle().await;

        assert_eq!(done.load(Ordering::SeqCst), 1);
    }
}
