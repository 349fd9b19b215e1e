//! Outcome model: how one execution of a task is classified.
//!
//! The executor never returns a plain bool. Separating "failed, try again"
//! from "can never succeed in this process" keeps flag-gated tasks out of
//! endless retry loops.

use serde::{Deserialize, Serialize};

/// Tri-state classification of an execution.
///
/// Serialized as SCREAMING_SNAKE_CASE: SUCCEEDED / SHOULD_RETRY / UNRECOVERABLE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    /// The side effect completed.
    Succeeded,

    /// Recoverable failure; the queue schedules a retry.
    ShouldRetry,

    /// Discard immediately, without counting against the retry budget.
    Unrecoverable,
}

/// Result of one execution, with an optional human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub kind: OutcomeKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Outcome {
    pub fn succeeded() -> Self {
        Self {
            kind: OutcomeKind::Succeeded,
            reason: None,
        }
    }

    pub fn should_retry(reason: impl Into<String>) -> Self {
        Self {
            kind: OutcomeKind::ShouldRetry,
            reason: Some(reason.into()),
        }
    }

    pub fn unrecoverable(reason: impl Into<String>) -> Self {
        Self {
            kind: OutcomeKind::Unrecoverable,
            reason: Some(reason.into()),
        }
    }

    pub fn reason(&self) -> &str {
        self.reason.as_deref().unwrap_or("")
    }
}
