//! Domain model (ids, task bookkeeping, envelopes, outcomes, errors).

pub mod envelope;
pub mod errors;
pub mod ids;
pub mod outcome;
pub mod task;

pub use envelope::TaskEnvelope;
pub use errors::{SpoolError, StorageError, TaskError};
pub use ids::TaskId;
pub use outcome::{Outcome, OutcomeKind};
pub use task::{TaskMeta, TaskType};
