//! Durable task queue: ordered in-memory list mirrored into a `TaskStore`,
//! drained one task at a time.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::executor::Executor;
use super::flags::RuntimeFlags;
use super::retry::RetryPolicy;
use super::state::{QueueStatus, TaskState};
use super::store::TaskStore;
use crate::domain::{Outcome, OutcomeKind, SpoolError, TaskId, TaskMeta};
use crate::ports::Clock;
use crate::ports::clock::to_delta;
use crate::typed::{DynTask, Task, erase};

/// In-memory queue state. Only touched while holding the mutex.
struct QueueState {
    /// FIFO; the head is the only task ever executed.
    tasks: VecDeque<Box<dyn DynTask>>,

    store: TaskStore,

    /// Guards against two drain loops executing at once.
    is_processing: bool,

    /// Bumped by `clear()`; results of runs started before a clear are discarded.
    epoch: u64,

    /// One-shot wake-up for a head task still in backoff.
    wake_timer: Option<JoinHandle<()>>,
}

struct Inner {
    state: Mutex<QueueState>,
    executor: Executor,
    retry_policy: RetryPolicy,
    clock: Arc<dyn Clock>,
}

/// Durable, retrying, single-flight task queue.
///
/// Cloning yields another handle to the same queue. Must be used inside a
/// tokio runtime: `enqueue` and `resume` spawn the drain loop.
///
/// Head-of-line blocking: the head task is always the next one run, so a
/// head in backoff holds back everything behind it until it is due.
#[derive(Clone)]
pub struct TaskQueue {
    inner: Arc<Inner>,
}

impl TaskQueue {
    /// Assemble a queue from an opened store and the tasks loaded from it.
    ///
    /// Does not start draining; call `resume()` for that.
    pub fn new(
        store: TaskStore,
        tasks: Vec<Box<dyn DynTask>>,
        executor: Executor,
        retry_policy: RetryPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let state = QueueState {
            tasks: tasks.into(),
            store,
            is_processing: false,
            epoch: 0,
            wake_timer: None,
        };
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                executor,
                retry_policy,
                clock,
            }),
        }
    }

    /// Flags consulted before each execution.
    pub fn flags(&self) -> &RuntimeFlags {
        self.inner.executor.flags()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.inner.retry_policy
    }

    /// Append `task` unless a task with the same id is already queued.
    ///
    /// Returns `Ok(false)` for a duplicate. The task is persisted before this
    /// returns; execution happens in the background.
    pub async fn enqueue<T: Task>(&self, task: T) -> Result<bool, SpoolError> {
        self.enqueue_dyn(erase(task)).await
    }

    pub async fn enqueue_dyn(&self, task: Box<dyn DynTask>) -> Result<bool, SpoolError> {
        {
            let mut state = self.inner.state.lock().await;
            let id = &task.meta().id;
            if state.tasks.iter().any(|t| &t.meta().id == id) {
                debug!(task_id = %id, "task already queued, ignoring");
                return Ok(false);
            }

            state.store.add(task.as_ref())?;
            debug!(task_id = %id, task_type = task.task_type(), "task enqueued");
            state.tasks.push_back(task);
        }

        self.resume();
        Ok(true)
    }

    /// Re-trigger the drain loop, e.g. when the host returns to the foreground.
    pub fn resume(&self) {
        tokio::spawn(Arc::clone(&self.inner).drain());
    }

    /// Drop every pending task, in memory and in the store. No undo.
    ///
    /// A pending backoff timer is cancelled; a task already executing finishes
    /// but its result is discarded.
    pub async fn clear(&self) -> Result<(), SpoolError> {
        let mut state = self.inner.state.lock().await;
        state.store.clear()?;

        let dropped = state.tasks.len();
        state.tasks.clear();
        state.epoch += 1;
        if let Some(timer) = state.wake_timer.take() {
            timer.abort();
        }
        info!(dropped, "task queue cleared");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.inner.state.lock().await.tasks.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.state.lock().await.tasks.is_empty()
    }

    pub async fn contains(&self, id: &TaskId) -> bool {
        let state = self.inner.state.lock().await;
        state.tasks.iter().any(|t| &t.meta().id == id)
    }

    /// Bookkeeping of every queued task, in execution order.
    pub async fn pending(&self) -> Vec<TaskMeta> {
        let state = self.inner.state.lock().await;
        state.tasks.iter().map(|t| t.meta().clone()).collect()
    }

    pub async fn status(&self) -> QueueStatus {
        let now = self.inner.clock.now();
        let state = self.inner.state.lock().await;

        let mut status = QueueStatus::default();
        for (i, task) in state.tasks.iter().enumerate() {
            let running = i == 0 && state.is_processing;
            status.record(task.meta(), TaskState::classify(task.meta(), now, running));
        }
        status
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("retry_policy", &self.inner.retry_policy)
            .finish_non_exhaustive()
    }
}

impl Inner {
    /// Run due head tasks until the queue is empty, busy, or the head is in backoff.
    async fn drain(self: Arc<Self>) {
        loop {
            let (task, epoch) = {
                let mut state = self.state.lock().await;
                if state.is_processing {
                    return;
                }
                let now = self.clock.now();
                let next_attempt_at = match state.tasks.front() {
                    Some(head) if !head.meta().is_due(now) => head.meta().next_attempt_at,
                    Some(_) => None,
                    None => return,
                };
                if let Some(at) = next_attempt_at {
                    let delay = (at - now).to_std().unwrap_or_default();
                    self.schedule_wake(&mut state, delay);
                    return;
                }

                let Some(task) = state.tasks.front().map(|head| head.clone_box()) else {
                    return;
                };
                state.is_processing = true;
                (task, state.epoch)
            };

            // lock is not held while the task runs
            let outcome = self.executor.run(task.as_ref()).await;

            let mut state = self.state.lock().await;
            if state.epoch == epoch {
                self.settle(&mut state, task, outcome);
            } else {
                debug!(task_id = %task.meta().id, "queue cleared while task was running, result discarded");
            }
            state.is_processing = false;
        }
    }

    /// Apply an execution outcome to the head task.
    fn settle(&self, state: &mut QueueState, mut task: Box<dyn DynTask>, outcome: Outcome) {
        let id = task.meta().id.clone();
        let task_type = task.task_type();

        match outcome.kind {
            OutcomeKind::Succeeded => {
                info!(task_id = %id, task_type, retry_count = task.meta().retry_count, "task completed");
                remove_head(state, &id);
            }
            OutcomeKind::Unrecoverable => {
                warn!(task_id = %id, task_type, reason = outcome.reason(), "task dropped");
                remove_head(state, &id);
            }
            OutcomeKind::ShouldRetry => {
                let meta = task.meta_mut();
                meta.retry_count = meta.retry_count.saturating_add(1);
                let retry_count = meta.retry_count;

                if meta.is_exhausted() {
                    warn!(
                        task_id = %id, task_type, retry_count,
                        reason = outcome.reason(),
                        "retry budget exhausted, task dropped"
                    );
                    remove_head(state, &id);
                    return;
                }

                let delay = self.retry_policy.next_delay(retry_count);
                meta.next_attempt_at = Some(self.clock.now() + to_delta(delay));
                warn!(
                    task_id = %id, task_type, retry_count,
                    delay_secs = delay.as_secs(),
                    reason = outcome.reason(),
                    "task failed, retry scheduled"
                );

                if let Err(e) = state.store.add(task.as_ref()) {
                    error!(task_id = %id, error = %e, "failed to persist retry state");
                }
                if let Some(head) = state.tasks.front_mut() {
                    *head = task;
                }
            }
        }
    }

    /// Replace any pending wake-up with one firing after `delay`.
    ///
    /// The timer only spawns a fresh drain, so aborting it never cancels a
    /// running task.
    fn schedule_wake(self: &Arc<Self>, state: &mut QueueState, delay: Duration) {
        if let Some(timer) = state.wake_timer.take() {
            timer.abort();
        }

        debug!(delay_secs = delay.as_secs_f64(), "head task in backoff, scheduling wake-up");
        let weak: Weak<Self> = Arc::downgrade(self);
        state.wake_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                tokio::spawn(inner.drain());
            }
        }));
    }
}

fn remove_head(state: &mut QueueState, id: &TaskId) {
    state.tasks.pop_front();
    if let Err(e) = state.store.delete(id) {
        error!(task_id = %id, error = %e, "failed to remove task from store");
    }
}
