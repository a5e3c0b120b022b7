//! Cancelable delayed tasks.
//!
//! A [`CancelToken`] can only cancel a task that has not fired yet. Once the
//! delay elapses the task runs to completion even if the token is cancelled
//! afterwards.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::AbortHandle;

const PENDING: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

/// Handle to one scheduled task.
#[derive(Debug, Clone)]
pub struct CancelToken {
    state: Arc<AtomicU8>,
    abort: Option<AbortHandle>,
}

impl CancelToken {
    fn cancelled() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(CANCELLED)),
            abort: None,
        }
    }

    /// Cancel the task if it has not fired. Returns whether it was cancelled
    /// by this call.
    pub fn cancel(&self) -> bool {
        let won = self
            .state
            .compare_exchange(PENDING, CANCELLED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if won {
            if let Some(abort) = &self.abort {
                abort.abort();
            }
        }
        won
    }

    pub fn is_pending(&self) -> bool {
        self.state.load(Ordering::SeqCst) == PENDING
    }

    pub fn has_fired(&self) -> bool {
        self.state.load(Ordering::SeqCst) == FIRED
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::SeqCst) == CANCELLED
    }
}

/// Runs futures after a delay and keeps their tokens so they can all be
/// cancelled at once.
#[derive(Debug, Clone, Default)]
pub struct TaskScheduler {
    pending: Arc<Mutex<Vec<CancelToken>>>,
    closed: Arc<AtomicBool>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay`. After [`cancel_all`](Self::cancel_all) this
    /// returns an already-cancelled token and never runs the task.
    pub fn schedule<F>(&self, delay: Duration, task: F) -> CancelToken
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.closed.load(Ordering::SeqCst) {
            return CancelToken::cancelled();
        }

        let state = Arc::new(AtomicU8::new(PENDING));
        let task_state = Arc::clone(&state);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if task_state
                .compare_exchange(PENDING, FIRED, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                task.await;
            }
        });

        let token = CancelToken {
            state,
            abort: Some(handle.abort_handle()),
        };

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(CancelToken::is_pending);
        pending.push(token.clone());
        token
    }

    /// Tasks scheduled and not yet fired or cancelled.
    pub fn pending_count(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|t| t.is_pending())
            .count()
    }

    /// Cancel every pending task and refuse new ones. Returns how many were
    /// cancelled.
    pub fn cancel_all(&self) -> usize {
        self.closed.store(true, Ordering::SeqCst);
        let tokens: Vec<_> = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        tokens.iter().filter(|t| t.cancel()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter_task(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = Arc::clone(counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let scheduler = TaskScheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let token = scheduler.schedule(Duration::from_millis(100), counter_task(&runs));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(token.is_pending());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(token.has_fired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_fire() {
        let scheduler = TaskScheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let token = scheduler.schedule(Duration::from_millis(100), counter_task(&runs));

        assert!(token.cancel());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_fire_is_noop() {
        let scheduler = TaskScheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let token = scheduler.schedule(Duration::from_millis(10), counter_task(&runs));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!token.cancel());
        assert!(token.has_fired());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_closes_scheduler() {
        let scheduler = TaskScheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));
        scheduler.schedule(Duration::from_millis(100), counter_task(&runs));
        scheduler.schedule(Duration::from_millis(200), counter_task(&runs));
        assert_eq!(scheduler.pending_count(), 2);

        assert_eq!(scheduler.cancel_all(), 2);
        let late = scheduler.schedule(Duration::from_millis(10), counter_task(&runs));
        assert!(late.is_cancelled());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending_count(), 0);
    }
}
