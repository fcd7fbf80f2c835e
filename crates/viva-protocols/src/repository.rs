//! Persistence seam consumed by the engine.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::session::{Session, SessionPatch};
use crate::task::{RetryTask, RetryTaskPatch};
use crate::turn::Turn;

/// Repository for sessions, turns, and retry tasks.
///
/// Contention is row-scoped; retry-task updates are last-write-wins.
/// Implementations must uphold two invariants: `create_turn` upserts on
/// (session_id, turn_number) so a re-flush never duplicates a turn, and
/// `update_retry_task` ignores `completed_at` in the patch when the row
/// already has one.
#[async_trait]
pub trait InterviewRepository: Send + Sync {
    /// Persist a turn, upserting on (session_id, turn_number).
    async fn create_turn(&self, turn: &Turn) -> Result<(), StoreError>;

    /// All turns for a session, ordered by `turn_number`.
    async fn list_turns(&self, session_id: Uuid) -> Result<Vec<Turn>, StoreError>;

    /// Load a session.
    async fn get_session(&self, id: Uuid) -> Result<Option<Session>, StoreError>;

    /// Apply a partial update to a session.
    async fn update_session(&self, id: Uuid, patch: &SessionPatch) -> Result<(), StoreError>;

    /// Persist a new session.
    async fn create_session(&self, session: &Session) -> Result<(), StoreError>;

    /// Persist a new retry task.
    async fn create_retry_task(&self, task: &RetryTask) -> Result<(), StoreError>;

    /// Tasks with no `completed_at` and `scheduled_retry_time <= now`,
    /// ascending by `scheduled_retry_time`, at most `limit` rows.
    async fn list_due_tasks(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<RetryTask>, StoreError>;

    /// Load a retry task.
    async fn get_retry_task(&self, id: Uuid) -> Result<Option<RetryTask>, StoreError>;

    /// Apply a partial update to a retry task.
    async fn update_retry_task(&self, id: Uuid, patch: &RetryTaskPatch) -> Result<(), StoreError>;
}
