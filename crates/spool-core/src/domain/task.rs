use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::TaskId;

/// Type tag of a concrete task kind (the registry key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskType(String);

impl TaskType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity + retry bookkeeping carried by every task.
///
/// Concrete tasks embed this (usually with `#[serde(flatten)]`) so it is
/// persisted together with the task's own fields.
///
/// - `max_retry_count == 0` means unlimited retries.
/// - `next_attempt_at` in the future means "not due yet".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMeta {
    pub id: TaskId,

    #[serde(default)]
    pub retry_count: u32,

    #[serde(default)]
    pub max_retry_count: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_attempt_at: Option<DateTime<Utc>>,
}

impl TaskMeta {
    pub fn new(id: impl Into<TaskId>) -> Self {
        Self {
            id: id.into(),
            retry_count: 0,
            max_retry_count: 0,
            next_attempt_at: None,
        }
    }

    /// Meta with a freshly generated id.
    pub fn generated() -> Self {
        Self::new(TaskId::generate())
    }

    pub fn with_max_retry_count(mut self, max_retry_count: u32) -> Self {
        self.max_retry_count = max_retry_count;
        self
    }

    /// Is the task eligible to run at `now`?
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.next_attempt_at {
            Some(at) => at <= now,
            None => true,
        }
    }

    /// Has the retry budget been used up?
    pub fn is_exhausted(&self) -> bool {
        self.max_retry_count > 0 && self.retry_count >= self.max_retry_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn due_when_no_next_attempt() {
        let meta = TaskMeta::new("a");
        assert!(meta.is_due(Utc::now()));
    }

    #[test]
    fn not_due_until_next_attempt() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut meta = TaskMeta::new("a");
        meta.next_attempt_at = Some(now + chrono::Duration::seconds(2));

        assert!(!meta.is_due(now));
        assert!(meta.is_due(now + chrono::Duration::seconds(2)));
    }

    #[test]
    fn zero_max_retry_count_never_exhausts() {
        let mut meta = TaskMeta::new("a");
        meta.retry_count = 10_000;
        assert!(!meta.is_exhausted());

        let mut meta = TaskMeta::new("b").with_max_retry_count(3);
        meta.retry_count = 2;
        assert!(!meta.is_exhausted());
        meta.retry_count = 3;
        assert!(meta.is_exhausted());
    }

    #[test]
    fn missing_bookkeeping_fields_default_to_zero() {
        let meta: TaskMeta = serde_json::from_str(r#"{"id":"a"}"#).unwrap();
        assert_eq!(meta.retry_count, 0);
        assert_eq!(meta.max_retry_count, 0);
        assert!(meta.next_attempt_at.is_none());
    }
}
