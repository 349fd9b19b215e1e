//! Queue module: persistence, execution, retry logic and the drain loop.

mod durable;
mod executor;
mod flags;
mod retry;
mod state;
mod store;

pub use durable::TaskQueue;
pub use executor::Executor;
pub use flags::RuntimeFlags;
pub use retry::RetryPolicy;
pub use state::{QueueStatus, TaskState};
pub use store::{TaskStore, UndecodableTaskPolicy};
