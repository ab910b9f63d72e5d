//! Bounded work-pulling task pool.
//!
//! A fixed number of workers share one cursor over the task list. Each worker
//! claims the next index, runs the task, records the outcome, and claims
//! again until the cursor passes the end. A slow task only holds up the
//! worker running it.

use crate::error::TaskError;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;

/// Completion position reported after each task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Tasks finished so far, this one included
    pub done: usize,
    pub total: usize,
}

/// Result of one task.
#[derive(Debug)]
pub enum TaskOutcome<O> {
    Succeeded(O),
    Failed(TaskError),
}

impl<O> TaskOutcome<O> {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded(_))
    }
}

/// Outcomes of a finished pool run, in task order.
#[derive(Debug)]
pub struct PoolSummary<O> {
    pub outcomes: Vec<TaskOutcome<O>>,
    pub succeeded: usize,
    pub failed: usize,
}

/// Number of workers actually started for `requested` workers over `total` tasks.
pub fn effective_concurrency(requested: usize, total: usize) -> usize {
    requested.max(1).min(total.max(1))
}

/// Run every task through `worker` with at most `concurrency` in flight.
///
/// A task that returns an error or panics is recorded as failed; the pool
/// keeps going and always returns one outcome per task. `on_complete` runs
/// once per task, as soon as it finishes, with a completion counter
/// that increases by exactly one each call. Calls are serialized, so the
/// counter is seen in order. A panicking `on_complete` is logged and ignored.
pub async fn run_pool<T, O, E, F, Fut, C>(
    tasks: Vec<T>,
    concurrency: usize,
    worker: F,
    on_complete: C,
) -> PoolSummary<O>
where
    T: Clone + Send + Sync + 'static,
    O: Send + 'static,
    E: Into<TaskError> + Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, E>> + Send + 'static,
    C: Fn(Progress, &T, &TaskOutcome<O>) + Send + Sync + 'static,
{
    let total = tasks.len();
    if total == 0 {
        return PoolSummary {
            outcomes: Vec::new(),
            succeeded: 0,
            failed: 0,
        };
    }

    let workers = effective_concurrency(concurrency, total);
    tracing::debug!("Starting pool: {total} tasks, {workers} workers");

    let tasks = Arc::new(tasks);
    let worker = Arc::new(worker);
    let on_complete = Arc::new(on_complete);
    let cursor = Arc::new(AtomicUsize::new(0));
    let done = Arc::new(Mutex::new(0usize));
    let slots: Arc<Mutex<Vec<Option<TaskOutcome<O>>>>> =
        Arc::new(Mutex::new((0..total).map(|_| None).collect()));

    let mut set = JoinSet::new();
    for worker_id in 0..workers {
        let tasks = tasks.clone();
        let worker = worker.clone();
        let on_complete = on_complete.clone();
        let cursor = cursor.clone();
        let done = done.clone();
        let slots = slots.clone();

        set.spawn(async move {
            loop {
                let index = cursor.fetch_add(1, Ordering::SeqCst);
                if index >= total {
                    break;
                }
                let task = &tasks[index];
                tracing::trace!("Worker {worker_id} claimed task {index}");

                // The worker is called inside the spawned task too, so a panic
                // while building the future fails this task only.
                let job = worker.clone();
                let input = task.clone();
                let outcome = match tokio::spawn(async move { (*job)(input).await }).await {
                    Ok(Ok(value)) => TaskOutcome::Succeeded(value),
                    Ok(Err(e)) => TaskOutcome::Failed(e.into()),
                    Err(e) => TaskOutcome::Failed(TaskError::new(format!("task panicked: {e}"))),
                };

                report(&done, total, index, &*on_complete, task, &outcome);
                store(&slots, index, outcome);
            }
        });
    }

    while let Some(joined) = set.join_next().await {
        if let Err(e) = joined {
            tracing::error!("Pool worker stopped unexpectedly: {e}");
        }
    }

    let recorded = match Arc::try_unwrap(slots) {
        Ok(mutex) => mutex.into_inner().unwrap_or_else(|e| e.into_inner()),
        Err(shared) => {
            let mut guard = shared.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *guard)
        }
    };

    let outcomes: Vec<TaskOutcome<O>> = recorded
        .into_iter()
        .map(|slot| {
            slot.unwrap_or_else(|| {
                TaskOutcome::Failed(TaskError::new("worker stopped before recording a result"))
            })
        })
        .collect();

    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    PoolSummary {
        failed: total - succeeded,
        succeeded,
        outcomes,
    }
}

/// Count one finished task and hand it to `on_complete`, under one lock.
fn report<T, O, C>(
    done: &Mutex<usize>,
    total: usize,
    index: usize,
    on_complete: &C,
    task: &T,
    outcome: &TaskOutcome<O>,
) where
    C: Fn(Progress, &T, &TaskOutcome<O>),
{
    let mut done = done.lock().unwrap_or_else(|e| e.into_inner());
    *done += 1;
    let progress = Progress { done: *done, total };
    let called =
        std::panic::catch_unwind(AssertUnwindSafe(|| on_complete(progress, task, outcome)));
    if called.is_err() {
        tracing::error!("Progress callback panicked for task {index}");
    }
}

fn store<O>(slots: &Mutex<Vec<Option<TaskOutcome<O>>>>, index: usize, outcome: TaskOutcome<O>) {
    let mut guard = slots.lock().unwrap_or_else(|e| e.into_inner());
    guard[index] = Some(outcome);
}
