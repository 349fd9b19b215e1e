//! Task state machine for the queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::TaskMeta;

/// Where a task sits in its lifecycle.
///
/// State transitions:
/// - Waiting -> Due (backoff elapsed)
/// - Due -> Running (drain loop picks the head)
/// - Running -> removed (succeeded / unrecoverable / exhausted)
/// - Running -> Waiting (retry scheduled)
///
/// Removed tasks have no state: they are gone from both the list and the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// `next_attempt_at` is still in the future.
    Waiting,

    /// Eligible to run.
    Due,

    /// Currently being executed.
    Running,
}

impl TaskState {
    pub fn classify(meta: &TaskMeta, now: DateTime<Utc>, running: bool) -> Self {
        if running {
            TaskState::Running
        } else if meta.is_due(now) {
            TaskState::Due
        } else {
            TaskState::Waiting
        }
    }
}

/// Point-in-time counts for observability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub total: usize,
    pub due: usize,
    pub waiting: usize,
    pub running: usize,

    /// Earliest `next_attempt_at` among waiting tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_wake_at: Option<DateTime<Utc>>,
}

impl QueueStatus {
    pub fn record(&mut self, meta: &TaskMeta, state: TaskState) {
        self.total += 1;
        match state {
            TaskState::Due => self.due += 1,
            TaskState::Running => self.running += 1,
            TaskState::Waiting => {
                self.waiting += 1;
                self.next_wake_at = match (self.next_wake_at, meta.next_attempt_at) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() + TimeDelta::seconds(secs)
    }

    #[test]
    fn classify_by_due_time_and_running() {
        let mut meta = TaskMeta::new("a");
        assert_eq!(TaskState::classify(&meta, at(0), false), TaskState::Due);
        assert_eq!(TaskState::classify(&meta, at(0), true), TaskState::Running);

        meta.next_attempt_at = Some(at(4));
        assert_eq!(TaskState::classify(&meta, at(0), false), TaskState::Waiting);
        assert_eq!(TaskState::classify(&meta, at(4), false), TaskState::Due);
    }

    #[test]
    fn status_tracks_earliest_wake() {
        let mut status = QueueStatus::default();

        let mut late = TaskMeta::new("late");
        late.next_attempt_at = Some(at(8));
        let mut soon = TaskMeta::new("soon");
        soon.next_attempt_at = Some(at(2));

        status.record(&late, TaskState::Waiting);
        status.record(&soon, TaskState::Waiting);
        status.record(&TaskMeta::new("due"), TaskState::Due);

        assert_eq!(status.total, 3);
        assert_eq!(status.waiting, 2);
        assert_eq!(status.due, 1);
        assert_eq!(status.next_wake_at, Some(at(2)));
    }
}
