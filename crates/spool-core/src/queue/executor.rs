//! Executor: runs exactly one task and classifies the result.

use std::any::Any;

use tracing::{debug, error};

use super::flags::RuntimeFlags;
use crate::domain::Outcome;
use crate::typed::DynTask;

/// Runs a task after checking its required flags.
///
/// 1. Any required flag not set to `true` ⇒ `Unrecoverable`, `execute` is never called.
/// 2. `execute` returns `Ok` ⇒ `Succeeded`.
/// 3. `execute` returns `Err` ⇒ `ShouldRetry`.
/// 4. `execute` panics ⇒ `Unrecoverable` (it would panic again on every retry).
///
/// Must be called inside a tokio runtime: the task runs on its own tokio task.
#[derive(Debug, Clone)]
pub struct Executor {
    flags: RuntimeFlags,
}

impl Executor {
    pub fn new(flags: RuntimeFlags) -> Self {
        Self { flags }
    }

    pub fn flags(&self) -> &RuntimeFlags {
        &self.flags
    }

    pub async fn run(&self, task: &dyn DynTask) -> Outcome {
        if let Some(flag) = self.flags.first_missing(task.required_flags()) {
            return Outcome::unrecoverable(format!("required flag '{flag}' is not set"));
        }

        debug!(task_id = %task.meta().id, task_type = task.task_type(), "executing task");
        // a panicking task must not take the drain loop down with it
        let runnable = task.clone_box();
        let handle = tokio::spawn(async move { runnable.execute().await });
        match handle.await {
            Ok(Ok(())) => Outcome::succeeded(),
            Ok(Err(e)) => Outcome::should_retry(e.to_string()),
            Err(e) if e.is_panic() => {
                let message = panic_message(e.into_panic());
                error!(
                    task_id = %task.meta().id,
                    task_type = task.task_type(),
                    panic = %message,
                    "task panicked"
                );
                Outcome::unrecoverable(format!("task panicked: {message}"))
            }
            Err(e) => Outcome::should_retry(e.to_string()),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(s) => *s,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(s) => s.to_string(),
            Err(_) => "non-string panic payload".to_string(),
        },
    }
}
