//! spool demo CLI
//!
//! タスクは `SPOOL_DIR`（デフォルト `.spool`）配下に永続化されるので、
//! 途中でプロセスを止めても次の `run` で続きから再開できる。
//!
//! ```text
//! spool enqueue <name> [fail-first] [--flag NAME]...
//! spool enqueue-gated <name> [--flag NAME]...
//! spool list
//! spool run [--flag NAME]...
//! spool clear
//! ```

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use spool_core::domain::{TaskError, TaskMeta};
use spool_core::impls::FileKvStore;
use spool_core::queue::RuntimeFlags;
use spool_core::typed::Task;
use spool_core::{QueueBuilder, QueueConfig, TaskQueue};

const GREETINGS_FLAG: &str = "greetings";

/// Prints a greeting, failing the first `fail_first` attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HelloTask {
    #[serde(flatten)]
    meta: TaskMeta,
    name: String,
    #[serde(default)]
    fail_first: u32,
}

#[async_trait]
impl Task for HelloTask {
    const TYPE: &'static str = "demo.hello.v1";

    fn meta(&self) -> &TaskMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut TaskMeta {
        &mut self.meta
    }

    async fn execute(&self) -> Result<(), TaskError> {
        if self.meta.retry_count < self.fail_first {
            return Err(TaskError::new(format!(
                "intentional failure ({} left)",
                self.fail_first - self.meta.retry_count
            )));
        }
        println!("Hello, {}!", self.name);
        Ok(())
    }
}

/// Same greeting, but only while the `greetings` flag is on.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GatedHelloTask {
    #[serde(flatten)]
    meta: TaskMeta,
    name: String,
    flags: Vec<String>,
}

#[async_trait]
impl Task for GatedHelloTask {
    const TYPE: &'static str = "demo.hello.gated.v1";

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
        println!("Hello (gated), {}!", self.name);
        Ok(())
    }
}

enum Command {
    Enqueue { name: String, fail_first: u32 },
    EnqueueGated { name: String },
    List,
    Run,
    Clear,
}

fn usage() -> &'static str {
    "usage: spool <enqueue <name> [fail-first] | enqueue-gated <name> | list | run | clear> [--flag NAME]..."
}

/// Split `args` into a command and the `--flag` values.
fn parse_args(args: &[String]) -> Result<(Command, Vec<String>), String> {
    let mut positional = Vec::new();
    let mut flags = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--flag" {
            let name = iter.next().ok_or("--flag needs a value")?;
            flags.push(name.clone());
        } else {
            positional.push(arg.as_str());
        }
    }

    let command = match positional.as_slice() {
        ["enqueue", name] => Command::Enqueue {
            name: name.to_string(),
            fail_first: 0,
        },
        ["enqueue", name, n] => Command::Enqueue {
            name: name.to_string(),
            fail_first: n
                .parse()
                .map_err(|e| format!("invalid fail-first {n:?}: {e}"))?,
        },
        ["enqueue-gated", name] => Command::EnqueueGated {
            name: name.to_string(),
        },
        ["list"] => Command::List,
        ["run"] => Command::Run,
        ["clear"] => Command::Clear,
        _ => return Err(usage().to_string()),
    };
    Ok((command, flags))
}

fn load_config() -> Result<QueueConfig, Box<dyn std::error::Error>> {
    match std::env::var_os("SPOOL_CONFIG") {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)?;
            Ok(QueueConfig::from_json(&raw)?)
        }
        None => Ok(QueueConfig::default()),
    }
}

/// Block until the queue is empty, reporting each change in its status.
async fn wait_until_drained(queue: &TaskQueue) {
    let mut last = None;
    loop {
        let status = queue.status().await;
        if status.total == 0 {
            tracing::info!("queue drained");
            return;
        }
        if last.as_ref() != Some(&status) {
            tracing::info!(
                total = status.total,
                due = status.due,
                waiting = status.waiting,
                running = status.running,
                next_wake_at = ?status.next_wake_at,
                "queue status"
            );
            last = Some(status);
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, flag_names) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(msg) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
    };

    let dir = std::env::var_os("SPOOL_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".spool"));

    let flags = RuntimeFlags::new();
    for name in &flag_names {
        flags.set_flag(name, true);
    }

    // (A) ストアを開き、永続化済みタスクを復元
    let queue = QueueBuilder::new(FileKvStore::open(&dir)?)
        .register::<HelloTask>()
        .register::<GatedHelloTask>()
        .expect_tasks(&[HelloTask::TYPE, GatedHelloTask::TYPE])
        .config(load_config()?)
        .flags(flags)
        .build()?;

    // (B) コマンド実行
    match command {
        Command::Enqueue { name, fail_first } => {
            let task = HelloTask {
                meta: TaskMeta::generated().with_max_retry_count(fail_first.saturating_add(1)),
                name,
                fail_first,
            };
            println!("enqueued {}", task.meta.id);
            queue.enqueue(task).await?;
            wait_until_drained(&queue).await;
        }
        Command::EnqueueGated { name } => {
            let task = GatedHelloTask {
                meta: TaskMeta::generated(),
                name,
                flags: vec![GREETINGS_FLAG.to_string()],
            };
            println!("enqueued {} (requires --flag {GREETINGS_FLAG})", task.meta.id);
            queue.enqueue(task).await?;
            wait_until_drained(&queue).await;
        }
        Command::List => {
            let pending = queue.pending().await;
            if pending.is_empty() {
                println!("(empty)");
            }
            for meta in pending {
                let next = meta
                    .next_attempt_at
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_else(|| "now".to_string());
                println!(
                    "{}  retry={}/{}  next={}",
                    meta.id, meta.retry_count, meta.max_retry_count, next
                );
            }
        }
        Command::Run => {
            // (C) 前回の続きから再開
            queue.resume();
            wait_until_drained(&queue).await;
        }
        Command::Clear => {
            queue.clear().await?;
            println!("cleared");
        }
    }

    Ok(())
}
