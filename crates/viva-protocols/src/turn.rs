//! Conversation turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Ai,
    User,
}

/// What role a turn plays in the interview script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    Introduction,
    Question,
    FollowUp,
    Answer,
    Conclusion,
}

/// One atomic utterance in a session.
///
/// `turn_number` is strictly increasing from 1 within a session, with no
/// gaps or duplicates. Persistence is keyed on (session_id, turn_number),
/// so re-writing a turn is an upsert, never a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Owning session.
    pub session_id: Uuid,
    /// 1-based position within the session.
    pub turn_number: u32,
    /// Speaker.
    pub speaker: Speaker,
    /// Utterance text.
    pub content: String,
    /// Role of this turn in the script, when known.
    pub kind: Option<TurnKind>,
    /// Question this turn asks or answers, when applicable.
    pub question_id: Option<Uuid>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Create a turn at the given position.
    pub fn new(
        session_id: Uuid,
        turn_number: u32,
        speaker: Speaker,
        content: impl Into<String>,
    ) -> Self {
        Self {
            session_id,
            turn_number,
            speaker,
            content: content.into(),
            kind: None,
            question_id: None,
            created_at: Utc::now(),
        }
    }

    /// Tag the turn with its script role.
    pub fn with_kind(mut self, kind: TurnKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Associate the turn with a question.
    pub fn with_question(mut self, question_id: Uuid) -> Self {
        self.question_id = Some(question_id);
        self
    }
}
