//! Fork-join evaluation on a bounded worker pool.
//!
//! DE and PSO submit one task per candidate and then wait for exactly that
//! many completions before the generation ends. A failing task does not stop
//! the others: the pool drains every task and then reports the first failure
//! in completion order.

use crate::error::{OptError, OptResult};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;

/// A bounded pool of worker threads.
pub struct WorkerPool {
    inner: ThreadPool,
}

impl WorkerPool {
    /// Creates a pool with `num_threads` workers; `0` picks rayon's default
    /// (one per logical CPU).
    pub fn new(num_threads: usize) -> OptResult<Self> {
        let inner = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("u-stochopt-worker-{i}"))
            .build()
            .map_err(|err| OptError::Worker(format!("cannot build worker pool: {err}")))?;
        Ok(Self { inner })
    }

    pub fn num_threads(&self) -> usize {
        self.inner.current_num_threads()
    }

    /// Runs every task and waits for all of them.
    ///
    /// Tasks start in submission order; with a single worker they also run
    /// to completion in that order. Results come back indexed by submission
    /// order.
    ///
    /// # Errors
    /// The first error (or panic, as [`OptError::Worker`]) observed among the
    /// completions, after all tasks have finished.
    pub fn fork_join<T, F>(&self, tasks: Vec<F>) -> OptResult<Vec<T>>
    where
        T: Send,
        F: FnOnce() -> OptResult<T> + Send,
    {
        let expected = tasks.len();
        let (sender, receiver) = mpsc::channel();

        // The scope returns once every spawned task has run; completions are
        // collected afterwards because a single-threaded pool cannot block
        // inside the scope while its tasks are still queued.
        self.inner.scope_fifo(|scope| {
            for (index, task) in tasks.into_iter().enumerate() {
                let sender = sender.clone();
                scope.spawn_fifo(move |_| {
                    let outcome = catch_unwind(AssertUnwindSafe(task))
                        .unwrap_or_else(|payload| Err(OptError::Worker(panic_message(&*payload))));
                    // the receiver outlives the scope
                    let _ = sender.send((index, outcome));
                });
            }
        });
        drop(sender);

        let mut results: Vec<Option<T>> = (0..expected).map(|_| None).collect();
        let mut first_error = None;
        for _ in 0..expected {
            let (index, outcome) = receiver
                .recv()
                .map_err(|_| OptError::Worker("worker finished without reporting".into()))?;
            match outcome {
                Ok(value) => results[index] = Some(value),
                Err(err) => {
                    tracing::warn!(task = index, error = %err, "worker task failed");
                    first_error.get_or_insert(err);
                }
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }
        results
            .into_iter()
            .map(|r| r.ok_or_else(|| OptError::Worker("missing task result".into())))
            .collect()
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("num_threads", &self.num_threads())
            .finish()
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("task panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("task panicked: {msg}")
    } else {
        "task panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn test_results_in_submission_order() {
        let pool = WorkerPool::new(4).unwrap();
        let tasks: Vec<_> = (0..32usize)
            .map(|i| move || -> OptResult<usize> { Ok(i * i) })
            .collect();
        let results = pool.fork_join(tasks).unwrap();
        assert_eq!(results, (0..32).map(|i| i * i).collect::<Vec<_>>());
    }

    #[test]
    fn test_single_worker_runs_fifo() {
        let pool = WorkerPool::new(1).unwrap();
        let order = Mutex::new(Vec::new());
        let tasks: Vec<_> = (0..10usize)
            .map(|i| {
                let order = &order;
                move || -> OptResult<()> {
                    order.lock().unwrap().push(i);
                    Ok(())
                }
            })
            .collect();
        pool.fork_join(tasks).unwrap();
        assert_eq!(order.into_inner().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_failure_drains_all_tasks() {
        let pool = WorkerPool::new(2).unwrap();
        let completed = AtomicUsize::new(0);
        let tasks: Vec<_> = (0..20usize)
            .map(|i| {
                let completed = &completed;
                move || {
                    completed.fetch_add(1, Ordering::SeqCst);
                    if i == 3 {
                        Err(OptError::invalid_argument("bad slot"))
                    } else {
                        Ok(i)
                    }
                }
            })
            .collect();
        let result = pool.fork_join(tasks);
        assert_eq!(result, Err(OptError::invalid_argument("bad slot")));
        assert_eq!(completed.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn test_panic_becomes_worker_error() {
        let pool = WorkerPool::new(2).unwrap();
        let tasks: Vec<Box<dyn FnOnce() -> OptResult<usize> + Send>> = vec![
            Box::new(|| Ok(1)),
            Box::new(|| panic!("evaluator exploded")),
        ];
        match pool.fork_join(tasks) {
            Err(OptError::Worker(msg)) => assert!(msg.contains("evaluator exploded")),
            other => panic!("expected worker error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_batch() {
        let pool = WorkerPool::new(1).unwrap();
        let tasks: Vec<fn() -> OptResult<u8>> = Vec::new();
        assert!(pool.fork_join(tasks).unwrap().is_empty());
    }
}
