//! Bounded worker pool with a process-wide slot budget.
//!
//! All pools in the process draw work slots from one shared budget, so a
//! pool spawned from inside a worker of an outer pool cannot oversubscribe
//! the machine. Constructing a pool releases one slot back to the budget
//! (the constructing context is now waiting, not computing); closing the
//! pool re-acquires it.
//!
//! A failing work item never kills the pool silently: failures are marshalled
//! back as tagged results, the host drains every in-flight item first and
//! then re-surfaces the first failure exactly as it occurred (worker panics
//! resume unwinding on the host).

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::join_all;
use futures::FutureExt;
use once_cell::sync::Lazy;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use crate::engine::CancelToken;
use crate::error::{Error, Result};

/// Process-wide work-slot budget shared by every pool.
static WORKER_SLOTS: Lazy<Arc<Semaphore>> = Lazy::new(|| {
    let slots = std::thread::available_parallelism().map_or(4, |n| n.get());
    Arc::new(Semaphore::new(slots))
});

/// What a worker sends home: the item's own outcome, or its panic payload.
type Marshalled<T> = std::result::Result<Result<T>, Box<dyn std::any::Any + Send>>;

/// A bounded pool of concurrent work items.
pub struct WorkerPool {
    label: String,
    budget: Arc<Semaphore>,
    /// Local bound; the effective parallelism is the smaller of this and the
    /// free slots in the shared budget.
    local: Arc<Semaphore>,
    cancel: CancelToken,
    closed: bool,
}

impl WorkerPool {
    /// Open a pool of at most `size` concurrent items on the shared budget.
    pub fn new(label: impl Into<String>, size: usize) -> Self {
        Self::on_budget(label, size, Arc::clone(&WORKER_SLOTS))
    }

    /// Open a pool on an explicit budget. Tests and embedding callers use
    /// this to bound a subtree of work independently of the process budget.
    pub fn on_budget(label: impl Into<String>, size: usize, budget: Arc<Semaphore>) -> Self {
        let label = label.into();
        // the constructing context now waits on results instead of computing,
        // so its slot returns to the budget for the pool's lifetime
        budget.add_permits(1);
        debug!(pool = %label, size, "opened worker pool");
        Self {
            label,
            budget,
            local: Arc::new(Semaphore::new(size)),
            cancel: CancelToken::new(),
            closed: false,
        }
    }

    /// Observe this token to make pool draining interruptible.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run all `work` items, bounded by the pool size and the shared budget.
    ///
    /// Results come back in submission order. When items fail, every other
    /// in-flight item is still drained before the first failure is
    /// re-surfaced; a panicking item resumes unwinding on the caller.
    pub async fn run<T, F>(&self, work: Vec<F>) -> Result<Vec<T>>
    where
        T: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let mut handles = Vec::with_capacity(work.len());
        for (index, item) in work.into_iter().enumerate() {
            self.cancel.check()?;
            let local = Arc::clone(&self.local);
            let budget = Arc::clone(&self.budget);
            let cancel = self.cancel.clone();
            handles.push(tokio::spawn(async move {
                let _local = local.acquire_owned().await.expect("pool semaphore closed");
                let _slot = budget.acquire_owned().await.expect("budget semaphore closed");
                if cancel.is_cancelled() {
                    return (index, Ok(Err(Error::Interrupted)));
                }
                let outcome: Marshalled<T> = AssertUnwindSafe(item).catch_unwind().await;
                (index, outcome)
            }));
        }

        // drain everything before surfacing any failure
        let mut values: Vec<Option<T>> = Vec::new();
        values.resize_with(handles.len(), || None);
        let mut first_error: Option<Error> = None;
        let mut first_panic: Option<Box<dyn std::any::Any + Send>> = None;
        let mut failures = 0usize;

        for joined in join_all(handles).await {
            let (index, outcome) = match joined {
                Ok(pair) => pair,
                Err(join_error) => {
                    // tokio only cancels tasks we never abort, so this is a panic
                    failures += 1;
                    if first_panic.is_none() {
                        first_panic = join_error.try_into_panic().ok();
                    }
                    continue;
                }
            };
            match outcome {
                Ok(Ok(value)) => values[index] = Some(value),
                Ok(Err(e)) => {
                    failures += 1;
                    if first_error.is_none() {
                        error!(pool = %self.label, index, error = %e, "work item failed");
                        first_error = Some(e);
                    } else {
                        debug!(pool = %self.label, index, "further work item failed");
                    }
                }
                Err(payload) => {
                    failures += 1;
                    if first_panic.is_none() {
                        error!(pool = %self.label, index, "work item panicked");
                        first_panic = Some(payload);
                    }
                }
            }
        }

        if let Some(payload) = first_panic {
            std::panic::resume_unwind(payload);
        }
        if let Some(e) = first_error {
            return Err(e);
        }
        if self.cancel.is_cancelled() {
            return Err(Error::Interrupted);
        }
        debug!(pool = %self.label, failures, "pool drained");
        Ok(values.into_iter().map(|v| v.expect("drained without failure")).collect())
    }

    /// Close the pool, taking its construction-time slot back out of the
    /// shared budget.
    pub async fn close(mut self) {
        self.budget
            .acquire()
            .await
            .expect("budget semaphore closed")
            .forget();
        self.closed = true;
        debug!(pool = %self.label, "closed worker pool");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.closed {
            // best effort: a loaded budget gives the slot back once a worker
            // releases it; `close()` is the reliable path
            let taken = self.budget.forget_permits(1);
            if taken == 0 {
                warn!(pool = %self.label, "dropped busy pool; slot reclaimed late");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn small_budget(slots: usize) -> Arc<Semaphore> {
        Arc::new(Semaphore::new(slots))
    }

    #[tokio::test]
    async fn test_results_in_submission_order() {
        let pool = WorkerPool::on_budget("t", 4, small_budget(4));
        let work: Vec<_> = (0..8u64)
            .map(|i| async move {
                tokio::time::sleep(std::time::Duration::from_millis(8 - i)).await;
                Ok(i)
            })
            .collect();
        let out = pool.run(work).await.unwrap();
        assert_eq!(out, (0..8).collect::<Vec<_>>());
        pool.close().await;
    }

    #[tokio::test]
    async fn test_failure_surfaces_after_all_items_drain() {
        let completed = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::on_budget("t", 2, small_budget(2));
        let work: Vec<_> = (0..5)
            .map(|i| {
                let completed = Arc::clone(&completed);
                async move {
                    if i == 2 {
                        return Err(Error::Tool("boom".into()));
                    }
                    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                    completed.fetch_add(1, Ordering::SeqCst);
                    Ok(i)
                }
            })
            .collect();

        let err = pool.run(work).await.unwrap_err();
        assert!(matches!(&err, Error::Tool(msg) if msg == "boom"));
        assert_eq!(
            completed.load(Ordering::SeqCst),
            4,
            "all other items must resolve before the failure surfaces"
        );
        pool.close().await;
    }

    #[tokio::test]
    async fn test_worker_panic_resumes_on_host() {
        let pool = WorkerPool::on_budget("t", 2, small_budget(2));
        let work: Vec<_> = (0..3)
            .map(|i| async move {
                if i == 1 {
                    panic!("worker exploded");
                }
                Ok(i)
            })
            .collect();

        let host = tokio::spawn(async move { pool.run(work).await });
        let join_error = host.await.unwrap_err();
        assert!(join_error.is_panic());
    }

    #[tokio::test]
    async fn test_nested_pool_does_not_deadlock_on_tight_budget() {
        // one slot in the whole budget: the outer worker takes it, then the
        // inner pool's construction releases one while the outer item waits
        let budget = small_budget(1);
        let inner_budget = Arc::clone(&budget);

        let pool = WorkerPool::on_budget("outer", 1, Arc::clone(&budget));
        let work = vec![async move {
            let inner = WorkerPool::on_budget("inner", 1, inner_budget);
            let out = inner.run(vec![async { Ok(21u64) }]).await?;
            inner.close().await;
            Ok(out[0] * 2)
        }];
        let out = pool.run(work).await.unwrap();
        assert_eq!(out, vec![42]);
        pool.close().await;
    }

    #[tokio::test]
    async fn test_cancelled_pool_reports_interrupted() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let pool = WorkerPool::on_budget("t", 2, small_budget(2)).with_cancel(cancel);
        let err = pool.run(vec![async { Ok(1) }]).await.unwrap_err();
        assert!(matches!(err, Error::Interrupted));
    }
}
