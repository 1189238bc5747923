//! Fire-and-forget background work.
//!
//! Feed regeneration triggered by a stale read, an explicit refresh or a
//! refresh-all sweep runs here, outside the caller's request. At most
//! `workers` tasks run at once; the rest wait for a permit.
//!
//! There is no deduplication: two submissions for the same source both run,
//! and whichever finishes last wins. Regeneration is idempotent, so this costs
//! a duplicate fetch, not correctness.

use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info_span};

#[derive(Debug, Clone)]
pub struct BackgroundTasks {
    permits: Arc<Semaphore>,
    running: Arc<Mutex<JoinSet<()>>>,
}

impl BackgroundTasks {
    /// A pool running at most `workers` tasks concurrently (minimum one).
    pub fn new(workers: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(workers.max(1))),
            running: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    /// Queue `task`. The caller never observes its completion.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit<Fut>(&self, label: &str, task: Fut)
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let span = info_span!("background", task = %label);
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());

        while let Some(done) = running.try_join_next() {
            if let Err(e) = done {
                error!(error = %e, "Background task panicked");
            }
        }

        running.spawn(
            async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };
                task.await;
            }
            .instrument(span),
        );
        debug!(task = %label, queued = running.len(), "Submitted background task");
    }

    /// Number of tasks submitted and not yet reaped.
    pub fn pending(&self) -> usize {
        self.running.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Wait for every submitted task, including ones submitted while waiting.
    ///
    /// Used at shutdown so queued regenerations are not lost with the process.
    pub async fn drain(&self) {
        loop {
            let mut batch = {
                let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
                std::mem::take(&mut *running)
            };
            if batch.is_empty() {
                return;
            }
            while let Some(done) = batch.join_next().await {
                if let Err(e) = done {
                    error!(error = %e, "Background task panicked");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_drain_waits_for_all_tasks() {
        let tasks = BackgroundTasks::new(2);
        let done = Arc::new(AtomicUsize::new(0));

        for i in 0..5 {
            let done = Arc::clone(&done);
            tasks.submit(&format!("t{i}"), async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }

        tasks.drain().await;
        assert_eq!(done.load(Ordering::SeqCst), 5);
        assert_eq!(tasks.pending(), 0);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let tasks = BackgroundTasks::new(2);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for i in 0..6 {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            tasks.submit(&format!("t{i}"), async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            });
        }

        tasks.drain().await;
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_tasks_submitted_during_drain_are_awaited() {
        let tasks = BackgroundTasks::new(1);
        let done = Arc::new(AtomicUsize::new(0));

        let inner_tasks = tasks.clone();
        let inner_done = Arc::clone(&done);
        tasks.submit("outer", async move {
            let d = Arc::clone(&inner_done);
            inner_tasks.submit("inner", async move {
                d.fetch_add(1, Ordering::SeqCst);
            });
            inner_done.fetch_add(1, Ordering::SeqCst);
        });

        tasks.drain().await;
        assert_eq!(done.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_panicking_task_does_not_poison_pool() {
        let tasks = BackgroundTasks::new(1);
        tasks.submit("boom", async { panic!("boom") });
        tasks.drain().await;

        let done = Arc::new(AtomicUsize::new(0));
        let d = Arc::clone(&done);
        tasks.submit("after", async move {
            d.fetch_add(1, Ordering::SeqCst);
        });
        tasks.drain().await;
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }
}
