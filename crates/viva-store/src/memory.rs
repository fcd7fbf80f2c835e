//! In-memory repository for tests and in-process embedding.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use viva_protocols::session::{Session, SessionPatch};
use viva_protocols::task::{RetryTask, RetryTaskPatch};
use viva_protocols::turn::Turn;
use viva_protocols::{InterviewRepository, StoreError};

/// Repository backed by RwLock'd maps. Mirrors the durable store's
/// semantics: turns upsert on (session_id, turn_number), terminal task
/// timestamps never move once set.
pub struct MemoryRepository {
    sessions: RwLock<HashMap<Uuid, Session>>,
    turns: RwLock<HashMap<(Uuid, u32), Turn>>,
    tasks: RwLock<HashMap<Uuid, RetryTask>>,
    transcripts: RwLock<HashMap<Uuid, Vec<Turn>>>,
}

impl MemoryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            turns: RwLock::new(HashMap::new()),
            tasks: RwLock::new(HashMap::new()),
            transcripts: RwLock::new(HashMap::new()),
        }
    }

    /// Transcript written at finalization, if any. Test hook; the
    /// dashboard reads transcripts outside this crate.
    pub async fn transcript(&self, session_id: Uuid) -> Option<Vec<Turn>> {
        self.transcripts.read().await.get(&session_id).cloned()
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InterviewRepository for MemoryRepository {
    async fn create_turn(&self, turn: &Turn) -> Result<(), StoreError> {
        let mut turns = self.turns.write().await;
        turns.insert((turn.session_id, turn.turn_number), turn.clone());
        Ok(())
    }

    async fn list_turns(&self, session_id: Uuid) -> Result<Vec<Turn>, StoreError> {
        let turns = self.turns.read().await;
        let mut rows: Vec<Turn> = turns
            .values()
            .filter(|t| t.session_id == session_id)
            .cloned()
            .collect();
        rows.sort_by_key(|t| t.turn_number);
        Ok(rows)
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<Session>, StoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(&id).cloned())
    }

    async fn update_session(&self, id: Uuid, patch: &SessionPatch) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("session {}", id)))?;
        session.apply(patch);

        if let Some(transcript) = &patch.transcript {
            self.transcripts
                .write()
                .await
                .insert(id, transcript.clone());
        }
        Ok(())
    }

    async fn create_session(&self, session: &Session) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn create_retry_task(&self, task: &RetryTask) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn list_due_tasks(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<RetryTask>, StoreError> {
        let tasks = self.tasks.read().await;
        let mut due: Vec<RetryTask> = tasks.values().filter(|t| t.is_due(now)).cloned().collect();
        due.sort_by_key(|t| t.scheduled_retry_time);
        due.truncate(limit);
        Ok(due)
    }

    async fn get_retry_task(&self, id: Uuid) -> Result<Option<RetryTask>, StoreError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.get(&id).cloned())
    }

    async fn update_retry_task(&self, id: Uuid, patch: &RetryTaskPatch) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("retry task {}", id)))?;
        task.apply(patch);
        Ok(())
    }
}
