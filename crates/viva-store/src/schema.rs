//! Database schema management.

use rusqlite::Connection;
use tokio_rusqlite::Error;

/// Initialize the database schema.
pub fn init_schema(conn: &Connection) -> Result<(), Error> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

const SCHEMA: &str = r#"
-- Interview sessions
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    status TEXT NOT NULL,
    script TEXT NOT NULL,
    current_question INTEGER NOT NULL,
    introduction_complete INTEGER NOT NULL,
    conversation_mode INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    completed_at TEXT,
    transcript TEXT
);

-- Conversation turns, keyed so a re-flush upserts instead of duplicating
CREATE TABLE IF NOT EXISTS turns (
    session_id TEXT NOT NULL,
    turn_number INTEGER NOT NULL,
    speaker TEXT NOT NULL,
    content TEXT NOT NULL,
    kind TEXT,
    question_id TEXT,
    created_at TEXT NOT NULL,
    PRIMARY KEY (session_id, turn_number)
);

-- Deferred AI invocations
CREATE TABLE IF NOT EXISTS retry_tasks (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    task_type TEXT NOT NULL,
    payload TEXT NOT NULL,
    scheduled_retry_time TEXT NOT NULL,
    attempt_count INTEGER NOT NULL,
    max_attempts INTEGER NOT NULL,
    last_error TEXT,
    completed_at TEXT,
    failed_at TEXT,
    created_at TEXT NOT NULL
);

-- Indexes for the hot paths
CREATE INDEX IF NOT EXISTS idx_turns_session ON turns(session_id, turn_number);
CREATE INDEX IF NOT EXISTS idx_retry_tasks_due
    ON retry_tasks(scheduled_retry_time)
    WHERE completed_at IS NULL AND failed_at IS NULL;
"#;
