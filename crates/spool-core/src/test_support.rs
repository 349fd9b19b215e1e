//! Test fixtures shared by the unit tests.
//!
//! Task behaviour is driven entirely by serialized fields, so a scripted task
//! behaves the same after a store round-trip. Executions are recorded in a
//! process-wide journal keyed by name; every test uses its own journal name.

use std::collections::HashMap;
use std::sync::{LazyLock, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{TaskError, TaskMeta};
use crate::queue::TaskQueue;
use crate::typed::{Task, TaskRegistry};

static JOURNALS: LazyLock<Mutex<HashMap<String, Vec<String>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn record(journal: &str, id: &str) {
    JOURNALS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(journal.to_string())
        .or_default()
        .push(id.to_string());
}

/// Ids executed under `journal`, in execution order.
pub fn executions(journal: &str) -> Vec<String> {
    JOURNALS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(journal)
        .cloned()
        .unwrap_or_default()
}

/// Fails its first `fail_first` attempts, then succeeds (or panics, if told to).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedTask {
    #[serde(flatten)]
    pub meta: TaskMeta,
    pub journal: String,
    #[serde(default)]
    pub fail_first: u32,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub panics: bool,
}

impl ScriptedTask {
    pub fn new(id: &str, journal: &str) -> Self {
        Self {
            meta: TaskMeta::new(id),
            journal: journal.to_string(),
            fail_first: 0,
            flags: Vec::new(),
            panics: false,
        }
    }

    pub fn fail_first(mut self, n: u32) -> Self {
        self.fail_first = n;
        self
    }

    pub fn always_fail(self) -> Self {
        self.fail_first(u32::MAX)
    }

    pub fn max_retry(mut self, n: u32) -> Self {
        self.meta.max_retry_count = n;
        self
    }

    pub fn requires(mut self, flag: &str) -> Self {
        self.flags.push(flag.to_string());
        self
    }

    /// Panic inside `execute` instead of returning.
    pub fn panics(mut self) -> Self {
        self.panics = true;
        self
    }
}

#[async_trait]
impl Task for ScriptedTask {
    const TYPE: &'static str = "test.scripted.v1";

    fn meta(&self) -> &TaskMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut TaskMeta {
        &mut self.meta
    }

    fn required_flags(&self) -> &[String] {
        &self.flags
    }

    async fn execute(&self) -> Result<(), TaskError> {
        record(&self.journal, self.meta.id.as_str());
        if self.panics {
            panic!("panicked on attempt {}", self.meta.retry_count + 1);
        }
        if self.meta.retry_count < self.fail_first {
            return Err(TaskError::new(format!(
                "scripted failure on attempt {}",
                self.meta.retry_count + 1
            )));
        }
        Ok(())
    }
}

/// A second task kind, gated behind one flag. Always succeeds when it runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatedTask {
    #[serde(flatten)]
    pub meta: TaskMeta,
    pub journal: String,
    pub flags: Vec<String>,
}

impl GatedTask {
    pub fn new(id: &str, journal: &str, flag: &str) -> Self {
        Self {
            meta: TaskMeta::new(id),
            journal: journal.to_string(),
            flags: vec![flag.to_string()],
        }
    }
}

#[async_trait]
impl Task for GatedTask {
    const TYPE: &'static str = "test.gated.v1";

    fn meta(&self) -> &TaskMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut TaskMeta {
        &mut self.meta
    }

    fn required_flags(&self) -> &[String] {
        &self.flags
    }

    async fn execute(&self) -> Result<(), TaskError> {
        record(&self.journal, self.meta.id.as_str());
        Ok(())
    }
}

pub fn registry() -> TaskRegistry {
    let mut registry = TaskRegistry::new();
    registry.register::<ScriptedTask>();
    registry.register::<GatedTask>();
    registry
}

const POLL: Duration = Duration::from_millis(50);
const MAX_POLLS: usize = 200_000;

/// Poll the queue (in virtual time) until `pred` holds for its pending tasks.
pub async fn wait_until(
    queue: &TaskQueue,
    mut pred: impl FnMut(&[TaskMeta]) -> bool,
) -> Vec<TaskMeta> {
    for _ in 0..MAX_POLLS {
        let pending = queue.pending().await;
        if pred(&pending) {
            return pending;
        }
        tokio::time::sleep(POLL).await;
    }
    panic!("queue never reached the expected state");
}

/// Poll until `journal` has at least `n` executions.
pub async fn wait_for_executions(journal: &str, n: usize) -> Vec<String> {
    for _ in 0..MAX_POLLS {
        let seen = executions(journal);
        if seen.len() >= n {
            return seen;
        }
        tokio::time::sleep(POLL).await;
    }
    panic!("journal '{journal}' never reached {n} executions");
}
