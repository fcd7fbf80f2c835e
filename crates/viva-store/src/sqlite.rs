//! SQLite repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::params;
use std::path::Path;
use tokio_rusqlite::Connection;
use tracing::debug;
use uuid::Uuid;

use viva_protocols::question::Question;
use viva_protocols::session::{Session, SessionPatch, SessionStatus};
use viva_protocols::task::{RetryTask, RetryTaskPatch, TaskType};
use viva_protocols::turn::{Speaker, Turn, TurnKind};
use viva_protocols::{InterviewRepository, StoreError};

use crate::schema::init_schema;

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;

/// SQLite-backed repository.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Create a new in-memory database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        conn.call(|conn| Ok(init_schema(conn)?))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(Self { conn })
    }

    /// Create a new file-backed database.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(path.clone())
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        conn.call(|conn| Ok(init_schema(conn)?))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        debug!("SqliteRepository initialized at {:?}", path);
        Ok(Self { conn })
    }
}

fn parse_dt(s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(e.to_string()))
}

fn parse_uuid(s: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| conversion_error(e.to_string()))
}

fn conversion_error(message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        message.into(),
    )
}

fn status_to_str(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::InProgress => "in_progress",
        SessionStatus::Completed => "completed",
        SessionStatus::Abandoned => "abandoned",
    }
}

fn status_from_str(s: &str) -> rusqlite::Result<SessionStatus> {
    match s {
        "in_progress" => Ok(SessionStatus::InProgress),
        "completed" => Ok(SessionStatus::Completed),
        "abandoned" => Ok(SessionStatus::Abandoned),
        other => Err(conversion_error(format!("unknown session status: {}", other))),
    }
}

fn speaker_to_str(speaker: Speaker) -> &'static str {
    match speaker {
        Speaker::Ai => "ai",
        Speaker::User => "user",
    }
}

fn speaker_from_str(s: &str) -> rusqlite::Result<Speaker> {
    match s {
        "ai" => Ok(Speaker::Ai),
        "user" => Ok(Speaker::User),
        other => Err(conversion_error(format!("unknown speaker: {}", other))),
    }
}

fn kind_to_str(kind: TurnKind) -> &'static str {
    match kind {
        TurnKind::Introduction => "introduction",
        TurnKind::Question => "question",
        TurnKind::FollowUp => "follow_up",
        TurnKind::Answer => "answer",
        TurnKind::Conclusion => "conclusion",
    }
}

fn kind_from_str(s: &str) -> rusqlite::Result<TurnKind> {
    match s {
        "introduction" => Ok(TurnKind::Introduction),
        "question" => Ok(TurnKind::Question),
        "follow_up" => Ok(TurnKind::FollowUp),
        "answer" => Ok(TurnKind::Answer),
        "conclusion" => Ok(TurnKind::Conclusion),
        other => Err(conversion_error(format!("unknown turn kind: {}", other))),
    }
}

fn task_type_to_str(task_type: TaskType) -> &'static str {
    match task_type {
        TaskType::QuestionGeneration => "question_generation",
        TaskType::AnswerScoring => "answer_scoring",
        TaskType::SessionSummary => "session_summary",
    }
}

fn task_type_from_str(s: &str) -> rusqlite::Result<TaskType> {
    match s {
        "question_generation" => Ok(TaskType::QuestionGeneration),
        "answer_scoring" => Ok(TaskType::AnswerScoring),
        "session_summary" => Ok(TaskType::SessionSummary),
        other => Err(conversion_error(format!("unknown task type: {}", other))),
    }
}

fn turn_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Turn> {
    let session_id: String = row.get(0)?;
    let turn_number: u32 = row.get(1)?;
    let speaker: String = row.get(2)?;
    let content: String = row.get(3)?;
    let kind: Option<String> = row.get(4)?;
    let question_id: Option<String> = row.get(5)?;
    let created_at: String = row.get(6)?;

    Ok(Turn {
        session_id: parse_uuid(&session_id)?,
        turn_number,
        speaker: speaker_from_str(&speaker)?,
        content,
        kind: kind.as_deref().map(kind_from_str).transpose()?,
        question_id: question_id.as_deref().map(parse_uuid).transpose()?,
        created_at: parse_dt(&created_at)?,
    })
}

fn session_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
    let id: String = row.get(0)?;
    let user_id: String = row.get(1)?;
    let status: String = row.get(2)?;
    let script: String = row.get(3)?;
    let current_question: usize = row.get(4)?;
    let introduction_complete: bool = row.get(5)?;
    let conversation_mode: bool = row.get(6)?;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;
    let completed_at: Option<String> = row.get(9)?;

    let script: Vec<Question> =
        serde_json::from_str(&script).map_err(|e| conversion_error(e.to_string()))?;

    Ok(Session {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        status: status_from_str(&status)?,
        script,
        current_question,
        introduction_complete,
        conversation_mode,
        created_at: parse_dt(&created_at)?,
        updated_at: parse_dt(&updated_at)?,
        completed_at: completed_at.as_deref().map(parse_dt).transpose()?,
    })
}

fn task_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RetryTask> {
    let id: String = row.get(0)?;
    let user_id: String = row.get(1)?;
    let task_type: String = row.get(2)?;
    let payload: String = row.get(3)?;
    let scheduled_retry_time: String = row.get(4)?;
    let attempt_count: u32 = row.get(5)?;
    let max_attempts: u32 = row.get(6)?;
    let last_error: Option<String> = row.get(7)?;
    let completed_at: Option<String> = row.get(8)?;
    let failed_at: Option<String> = row.get(9)?;
    let created_at: String = row.get(10)?;

    Ok(RetryTask {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        task_type: task_type_from_str(&task_type)?,
        payload: serde_json::from_str(&payload).map_err(|e| conversion_error(e.to_string()))?,
        scheduled_retry_time: parse_dt(&scheduled_retry_time)?,
        attempt_count,
        max_attempts,
        last_error,
        completed_at: completed_at.as_deref().map(parse_dt).transpose()?,
        failed_at: failed_at.as_deref().map(parse_dt).transpose()?,
        created_at: parse_dt(&created_at)?,
    })
}

const TASK_COLUMNS: &str = "id, user_id, task_type, payload, scheduled_retry_time, \
     attempt_count, max_attempts, last_error, completed_at, failed_at, created_at";

fn write_task(conn: &rusqlite::Connection, task: &RetryTask) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO retry_tasks (id, user_id, task_type, payload, scheduled_retry_time,
             attempt_count, max_attempts, last_error, completed_at, failed_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT(id) DO UPDATE SET
             scheduled_retry_time = excluded.scheduled_retry_time,
             attempt_count = excluded.attempt_count,
             last_error = excluded.last_error,
             completed_at = excluded.completed_at,
             failed_at = excluded.failed_at",
        params![
            task.id.to_string(),
            task.user_id.to_string(),
            task_type_to_str(task.task_type),
            serde_json::to_string(&task.payload)
                .map_err(|e| conversion_error(e.to_string()))?,
            task.scheduled_retry_time.to_rfc3339(),
            task.attempt_count,
            task.max_attempts,
            task.last_error,
            task.completed_at.map(|t| t.to_rfc3339()),
            task.failed_at.map(|t| t.to_rfc3339()),
            task.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

#[async_trait]
impl InterviewRepository for SqliteRepository {
    async fn create_turn(&self, turn: &Turn) -> Result<(), StoreError> {
        let turn = turn.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO turns (session_id, turn_number, speaker, content, kind,
                         question_id, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(session_id, turn_number) DO UPDATE SET
                         speaker = excluded.speaker,
                         content = excluded.content,
                         kind = excluded.kind,
                         question_id = excluded.question_id",
                    params![
                        turn.session_id.to_string(),
                        turn.turn_number,
                        speaker_to_str(turn.speaker),
                        turn.content,
                        turn.kind.map(kind_to_str),
                        turn.question_id.map(|id| id.to_string()),
                        turn.created_at.to_rfc3339(),
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    async fn list_turns(&self, session_id: Uuid) -> Result<Vec<Turn>, StoreError> {
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT session_id, turn_number, speaker, content, kind, question_id,
                         created_at
                     FROM turns WHERE session_id = ?1 ORDER BY turn_number",
                )?;
                let turns = stmt
                    .query_map([session_id.to_string()], turn_from_row)?
                    .collect::<rusqlite::Result<Vec<Turn>>>()?;
                Ok(turns)
            })
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    async fn get_session(&self, id: Uuid) -> Result<Option<Session>, StoreError> {
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, status, script, current_question,
                         introduction_complete, conversation_mode, created_at, updated_at,
                         completed_at
                     FROM sessions WHERE id = ?1",
                )?;
                match stmt.query_row([id.to_string()], session_from_row) {
                    Ok(session) => Ok(Some(session)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    async fn update_session(&self, id: Uuid, patch: &SessionPatch) -> Result<(), StoreError> {
        let patch = patch.clone();
        let found = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, status, script, current_question,
                         introduction_complete, conversation_mode, created_at, updated_at,
                         completed_at
                     FROM sessions WHERE id = ?1",
                )?;
                let mut session = match stmt.query_row([id.to_string()], session_from_row) {
                    Ok(session) => session,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(false),
                    Err(e) => return Err(e.into()),
                };
                session.apply(&patch);

                conn.execute(
                    "UPDATE sessions SET status = ?2, current_question = ?3,
                         introduction_complete = ?4, updated_at = ?5, completed_at = ?6
                     WHERE id = ?1",
                    params![
                        id.to_string(),
                        status_to_str(session.status),
                        session.current_question,
                        session.introduction_complete,
                        session.updated_at.to_rfc3339(),
                        session.completed_at.map(|t| t.to_rfc3339()),
                    ],
                )?;

                if let Some(transcript) = &patch.transcript {
                    let transcript = serde_json::to_string(transcript)
                        .map_err(|e| conversion_error(e.to_string()))?;
                    conn.execute(
                        "UPDATE sessions SET transcript = ?2 WHERE id = ?1",
                        params![id.to_string(), transcript],
                    )?;
                }
                Ok(true)
            })
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        if !found {
            return Err(StoreError::NotFound(format!("session {}", id)));
        }
        Ok(())
    }

    async fn create_session(&self, session: &Session) -> Result<(), StoreError> {
        let session = session.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO sessions (id, user_id, status, script, current_question,
                         introduction_complete, conversation_mode, created_at, updated_at,
                         completed_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    params![
                        session.id.to_string(),
                        session.user_id.to_string(),
                        status_to_str(session.status),
                        serde_json::to_string(&session.script)
                            .map_err(|e| conversion_error(e.to_string()))?,
                        session.current_question,
                        session.introduction_complete,
                        session.conversation_mode,
                        session.created_at.to_rfc3339(),
                        session.updated_at.to_rfc3339(),
                        session.completed_at.map(|t| t.to_rfc3339()),
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    async fn create_retry_task(&self, task: &RetryTask) -> Result<(), StoreError> {
        let task = task.clone();
        self.conn
            .call(move |conn| {
                write_task(conn, &task)?;
                Ok(())
            })
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    async fn list_due_tasks(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<RetryTask>, StoreError> {
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM retry_tasks
                     WHERE completed_at IS NULL AND failed_at IS NULL
                         AND scheduled_retry_time <= ?1
                     ORDER BY scheduled_retry_time ASC
                     LIMIT ?2",
                    TASK_COLUMNS
                ))?;
                let tasks = stmt
                    .query_map(params![now.to_rfc3339(), limit], task_from_row)?
                    .collect::<rusqlite::Result<Vec<RetryTask>>>()?;
                Ok(tasks)
            })
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    async fn get_retry_task(&self, id: Uuid) -> Result<Option<RetryTask>, StoreError> {
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM retry_tasks WHERE id = ?1",
                    TASK_COLUMNS
                ))?;
                match stmt.query_row([id.to_string()], task_from_row) {
                    Ok(task) => Ok(Some(task)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    async fn update_retry_task(&self, id: Uuid, patch: &RetryTaskPatch) -> Result<(), StoreError> {
        let patch = patch.clone();
        let found = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM retry_tasks WHERE id = ?1",
                    TASK_COLUMNS
                ))?;
                let mut task = match stmt.query_row([id.to_string()], task_from_row) {
                    Ok(task) => task,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(false),
                    Err(e) => return Err(e.into()),
                };
                task.apply(&patch);
                write_task(conn, &task)?;
                Ok(true)
            })
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        if !found {
            return Err(StoreError::NotFound(format!("retry task {}", id)));
        }
        Ok(())
    }
}
