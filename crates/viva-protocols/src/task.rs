//! Deferred AI task definition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of one-shot AI call a task defers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Generate an interview question script.
    QuestionGeneration,
    /// Score recorded answers against their criteria.
    AnswerScoring,
    /// Summarize a completed session for the dashboard.
    SessionSummary,
}

/// A deferred, retryable AI invocation.
///
/// Created when a synchronous AI call observes a rate-limit signal; updated
/// every runner cycle; terminated by success (`completed_at` set, immutable
/// afterwards) or by the runner routing it to a terminal failure once
/// `attempt_count` reaches `max_attempts`. The queue itself never enforces
/// the attempt cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryTask {
    /// Unique task ID.
    pub id: Uuid,
    /// User the original request belonged to.
    pub user_id: Uuid,
    /// Dispatch key for the runner.
    pub task_type: TaskType,
    /// Opaque payload handed back to the handler.
    pub payload: serde_json::Value,
    /// Earliest time the runner may consider this task.
    pub scheduled_retry_time: DateTime<Utc>,
    /// Attempts so far, counting the original failed call.
    pub attempt_count: u32,
    /// Cap the runner compares `attempt_count` against.
    pub max_attempts: u32,
    /// Message from the most recent failure.
    pub last_error: Option<String>,
    /// Set exactly once on terminal success.
    pub completed_at: Option<DateTime<Utc>>,
    /// Set exactly once when the runner gives up on the task.
    pub failed_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl RetryTask {
    /// Create a task for its first deferred attempt.
    pub fn new(
        user_id: Uuid,
        task_type: TaskType,
        payload: serde_json::Value,
        scheduled_retry_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            task_type,
            payload,
            scheduled_retry_time,
            attempt_count: 1,
            max_attempts: 5,
            last_error: None,
            completed_at: None,
            failed_at: None,
            created_at: Utc::now(),
        }
    }

    /// Override the attempt cap.
    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    /// Whether the task is due at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.completed_at.is_none() && self.failed_at.is_none() && self.scheduled_retry_time <= now
    }

    /// Whether the attempt budget is spent.
    pub fn attempts_exhausted(&self) -> bool {
        self.attempt_count >= self.max_attempts
    }

    /// Apply a patch, upholding the terminal-timestamp immutability:
    /// `completed_at` and `failed_at`, once set, never move.
    pub fn apply(&mut self, patch: &RetryTaskPatch) {
        if let Some(time) = patch.scheduled_retry_time {
            self.scheduled_retry_time = time;
        }
        if let Some(count) = patch.attempt_count {
            self.attempt_count = count;
        }
        if let Some(error) = &patch.last_error {
            self.last_error = Some(error.clone());
        }
        if self.completed_at.is_none() {
            self.completed_at = patch.completed_at;
        }
        if self.failed_at.is_none() {
            self.failed_at = patch.failed_at;
        }
    }
}

/// Partial update applied to a persisted task. `None` fields are left
/// untouched. Stores must ignore `completed_at` when it is already set on
/// the row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetryTaskPatch {
    pub scheduled_retry_time: Option<DateTime<Utc>>,
    pub attempt_count: Option<u32>,
    pub last_error: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
}
