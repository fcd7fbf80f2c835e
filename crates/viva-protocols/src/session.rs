//! Interview session state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::question::Question;
use crate::turn::Turn;

/// Session lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Interview is live or resumable.
    InProgress,
    /// Script exhausted or explicitly concluded.
    Completed,
    /// Ended by the user before completion.
    Abandoned,
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::InProgress
    }
}

/// One interview attempt bound to a fixed, ordered question script.
///
/// Owned by the application; mutated only through [`SessionPatch`] applied
/// by the conversation flow and the finalize operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session ID.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Current status.
    pub status: SessionStatus,
    /// Ordered question script. Immutable once generated.
    pub script: Vec<Question>,
    /// Index of the question currently being asked.
    pub current_question: usize,
    /// Whether the introduction exchange has completed.
    pub introduction_complete: bool,
    /// Whether the session runs in live conversational mode.
    pub conversation_mode: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Set exactly once, at completion or abandonment.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a new in-progress session over a question script.
    pub fn new(user_id: Uuid, script: Vec<Question>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            status: SessionStatus::InProgress,
            script,
            current_question: 0,
            introduction_complete: false,
            conversation_mode: true,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// The question currently pointed at, if the script is not exhausted.
    pub fn current(&self) -> Option<&Question> {
        self.script.get(self.current_question)
    }

    /// Whether every scripted question has been asked.
    pub fn script_exhausted(&self) -> bool {
        self.current_question >= self.script.len()
    }

    /// Apply a patch. `completed_at`, once set, never moves; the
    /// transcript is a storage concern and is not applied here.
    pub fn apply(&mut self, patch: &SessionPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(index) = patch.current_question {
            self.current_question = index;
        }
        if let Some(flag) = patch.introduction_complete {
            self.introduction_complete = flag;
        }
        if self.completed_at.is_none() {
            self.completed_at = patch.completed_at;
        }
        self.updated_at = Utc::now();
    }
}

/// Partial update applied to a persisted session. `None` fields are left
/// untouched by the repository.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionPatch {
    pub status: Option<SessionStatus>,
    pub current_question: Option<usize>,
    pub introduction_complete: Option<bool>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Ordered denormalized transcript written at finalization.
    pub transcript: Option<Vec<Turn>>,
}

impl SessionPatch {
    /// Patch that marks a session terminally finished with a timestamp.
    pub fn finished(status: SessionStatus, transcript: Vec<Turn>) -> Self {
        Self {
            status: Some(status),
            completed_at: Some(Utc::now()),
            transcript: Some(transcript),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::{Difficulty, QuestionCategory};

    fn script(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| {
                Question::new(
                    i as u32,
                    QuestionCategory::Behavioral,
                    Difficulty::Medium,
                    format!("Question {}", i),
                )
            })
            .collect()
    }

    #[test]
    fn test_session_new() {
        let session = Session::new(Uuid::new_v4(), script(3));
        assert_eq!(session.status, SessionStatus::InProgress);
        assert_eq!(session.current_question, 0);
        assert!(!session.introduction_complete);
        assert!(session.completed_at.is_none());
    }

    #[test]
    fn test_script_exhausted() {
        let mut session = Session::new(Uuid::new_v4(), script(2));
        assert!(!session.script_exhausted());
        assert!(session.current().is_some());

        session.current_question = 2;
        assert!(session.script_exhausted());
        assert!(session.current().is_none());
    }
}
