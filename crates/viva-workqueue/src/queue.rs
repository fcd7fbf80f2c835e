//! Durable retry queue over the repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use viva_protocols::task::{RetryTask, RetryTaskPatch, TaskType};
use viva_protocols::{InterviewRepository, StoreError};

use crate::config::QueueConfig;

/// Store-backed queue of deferred AI invocations.
///
/// The queue is bookkeeping only: it guarantees a task is never handed
/// out before its scheduled retry time, but it does not enforce the
/// attempt cap - the runner compares `attempt_count` against
/// `max_attempts` when routing failures.
pub struct RetryQueue {
    repository: Arc<dyn InterviewRepository>,
    config: QueueConfig,
}

impl RetryQueue {
    /// Create a queue over a repository.
    pub fn new(repository: Arc<dyn InterviewRepository>, config: QueueConfig) -> Self {
        Self { repository, config }
    }

    /// Queue configuration.
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Persist a new task for deferred execution. The task starts at
    /// `attempt_count = 1`, counting the original failed call.
    pub async fn queue_task(
        &self,
        user_id: Uuid,
        task_type: TaskType,
        payload: serde_json::Value,
        scheduled_retry_time: DateTime<Utc>,
        max_attempts: Option<u32>,
    ) -> Result<Uuid, StoreError> {
        let task = RetryTask::new(user_id, task_type, payload, scheduled_retry_time)
            .with_max_attempts(max_attempts.unwrap_or(self.config.default_max_attempts));
        let id = task.id;

        self.repository.create_retry_task(&task).await?;
        info!(
            "Queued {:?} task {} for {} (retry at {})",
            task_type, id, user_id, scheduled_retry_time
        );
        Ok(id)
    }

    /// Due tasks: not terminal and scheduled at or before now, ascending
    /// by scheduled time, at most `limit`.
    pub async fn pending_tasks(&self, limit: usize) -> Result<Vec<RetryTask>, StoreError> {
        self.repository.list_due_tasks(Utc::now(), limit).await
    }

    /// Push a task's next consideration time forward without counting an
    /// attempt. Used by the runner to claim a task before processing it.
    pub async fn claim_task(
        &self,
        task_id: Uuid,
        lease_until: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        debug!("Claiming task {} until {}", task_id, lease_until);
        self.repository
            .update_retry_task(
                task_id,
                &RetryTaskPatch {
                    scheduled_retry_time: Some(lease_until),
                    ..Default::default()
                },
            )
            .await
    }

    /// Record a failed attempt and reschedule. Never sets a terminal
    /// timestamp; the next retry time is clamped strictly into the
    /// future.
    pub async fn retry_task(
        &self,
        task_id: Uuid,
        next_retry_time: DateTime<Utc>,
        error: &str,
    ) -> Result<(), StoreError> {
        let task = self
            .repository
            .get_retry_task(task_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("retry task {}", task_id)))?;

        let next_retry_time = next_retry_time.max(Utc::now() + chrono::Duration::seconds(1));
        debug!(
            "Retrying task {} (attempt {} -> {}) at {}",
            task_id,
            task.attempt_count,
            task.attempt_count + 1,
            next_retry_time
        );

        self.repository
            .update_retry_task(
                task_id,
                &RetryTaskPatch {
                    scheduled_retry_time: Some(next_retry_time),
                    attempt_count: Some(task.attempt_count + 1),
                    last_error: Some(error.to_string()),
                    ..Default::default()
                },
            )
            .await
    }

    /// Terminal success. Idempotent: the stored `completed_at` never
    /// moves once set.
    pub async fn complete_task(&self, task_id: Uuid) -> Result<(), StoreError> {
        info!("Task {} completed", task_id);
        self.repository
            .update_retry_task(
                task_id,
                &RetryTaskPatch {
                    completed_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await
    }

    /// Terminal non-retry outcome, surfaced to monitoring via the task
    /// row only.
    pub async fn fail_task(&self, task_id: Uuid, error: &str) -> Result<(), StoreError> {
        info!("Task {} failed terminally: {}", task_id, error);
        self.repository
            .update_retry_task(
                task_id,
                &RetryTaskPatch {
                    last_error: Some(error.to_string()),
                    failed_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
