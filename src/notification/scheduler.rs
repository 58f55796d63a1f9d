//! Deferred work scheduling for retries
//!
//! A retry never holds a thread for its delay: it hands a unit of work to a
//! [`Scheduler`] and returns. [`TokioScheduler`] runs it after a real sleep,
//! [`ManualScheduler`] queues it so tests can drive retries synchronously.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::warn;

/// A unit of deferred work
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Scheduling capability injected into the retriers
pub trait Scheduler: Send + Sync {
    /// Run `task` once `delay` has elapsed. Must return immediately.
    /// Scheduled tasks are not cancelable.
    fn schedule_after(&self, delay: Duration, task: Task);
}

/// Scheduler backed by a tokio runtime
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime of the calling context
    pub fn current() -> anyhow::Result<Self> {
        Ok(Self::new(Handle::try_current()?))
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(&self, delay: Duration, task: Task) {
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            // Collaborators may block (file locks, blocking HTTP)
            if let Err(e) = tokio::task::spawn_blocking(task).await {
                warn!(error = %e, "Scheduled retry task failed to complete");
            }
        });
    }
}

/// Scheduler that only queues work; tests run it explicitly
#[derive(Default)]
pub struct ManualScheduler {
    queue: Mutex<VecDeque<(Duration, Task)>>,
    delays: Mutex<Vec<Duration>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued tasks
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Every delay ever requested, in scheduling order
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Run the oldest queued task. Returns false when the queue is empty.
    pub fn run_next(&self) -> bool {
        // The lock is released before running: the task may schedule again
        let next = self.queue.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
        match next {
            Some((_, task)) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run until the queue is drained, including work scheduled along the way
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_after(&self, delay: Duration, task: Task) {
        self.delays.lock().unwrap_or_else(|e| e.into_inner()).push(delay);
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back((delay, task));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_manual_scheduler_queues_until_run() {
        let scheduler = ManualScheduler::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c = count.clone();
        scheduler.schedule_after(Duration::from_millis(10), Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(scheduler.pending(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        assert!(scheduler.run_next());
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!scheduler.run_next());
        assert_eq!(scheduler.delays(), vec![Duration::from_millis(10)]);
    }

    #[test]
    fn test_manual_scheduler_run_all_includes_rescheduled_work() {
        let scheduler = Arc::new(ManualScheduler::new());
        let count = Arc::new(AtomicUsize::new(0));

        let inner_scheduler = scheduler.clone();
        let c = count.clone();
        scheduler.schedule_after(Duration::from_secs(1), Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
            let c2 = c.clone();
            inner_scheduler.schedule_after(Duration::from_secs(2), Box::new(move || {
                c2.fetch_add(1, Ordering::SeqCst);
            }));
        }));

        assert_eq!(scheduler.run_all(), 2);
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(scheduler.delays(), vec![Duration::from_secs(1), Duration::from_secs(2)]);
    }

    #[tokio::test]
    async fn test_tokio_scheduler_runs_after_delay() {
        let scheduler = TokioScheduler::current().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();

        let started = std::time::Instant::now();
        scheduler.schedule_after(Duration::from_millis(50), Box::new(move || {
            let _ = tx.send(());
        }));

        rx.await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
