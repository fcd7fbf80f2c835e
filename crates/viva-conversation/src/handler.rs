//! Deferred answer-scoring task handler.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use viva_protocols::task::RetryTask;
use viva_protocols::turn::{Speaker, Turn, TurnKind};
use viva_protocols::{InterviewRepository, TaskError};
use viva_workqueue::TaskHandler;

use crate::recorder::AnswerRecorder;

/// Scores a finished session's answers through an [`AnswerRecorder`].
///
/// Payload: `{"sessionId": "<uuid>"}`. Registered with the retry runner
/// under `TaskType::AnswerScoring`; a rate-limited provider propagates
/// out typed so the runner requeues at the resume time.
pub struct AnswerScoringHandler {
    repository: Arc<dyn InterviewRepository>,
    recorder: Arc<dyn AnswerRecorder>,
}

impl AnswerScoringHandler {
    /// Create a handler.
    pub fn new(repository: Arc<dyn InterviewRepository>, recorder: Arc<dyn AnswerRecorder>) -> Self {
        Self {
            repository,
            recorder,
        }
    }
}

#[async_trait]
impl TaskHandler for AnswerScoringHandler {
    async fn handle(&self, task: &RetryTask) -> Result<(), TaskError> {
        let session_id = task
            .payload
            .get("sessionId")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| TaskError::Terminal("payload missing sessionId".to_string()))?;

        let session = self
            .repository
            .get_session(session_id)
            .await?
            .ok_or_else(|| TaskError::Terminal(format!("session {} not found", session_id)))?;
        let turns = self.repository.list_turns(session_id).await?;

        let pairs = answer_pairs(&turns);
        if pairs.is_empty() {
            warn!("Session {} has no answers to score", session_id);
            return Ok(());
        }

        for (question_id, answer) in pairs {
            let Some(question) = session.script.iter().find(|q| q.id == question_id) else {
                warn!(
                    "Answer references unknown question {} in session {}",
                    question_id, session_id
                );
                continue;
            };

            let evaluation = self.recorder.record(&session, question, &answer).await?;
            debug!(
                "Session {} question {} scored {:?}",
                session_id, question.order, evaluation.score
            );
        }
        Ok(())
    }
}

/// Pair each question with the concatenated user answers that follow
/// it, up to the next AI prompt.
fn answer_pairs(turns: &[Turn]) -> Vec<(Uuid, String)> {
    let mut pairs: Vec<(Uuid, String)> = Vec::new();
    let mut current: Option<Uuid> = None;

    for turn in turns {
        match turn.speaker {
            Speaker::Ai => {
                if matches!(turn.kind, Some(TurnKind::Question) | Some(TurnKind::FollowUp)) {
                    current = turn.question_id;
                }
            }
            Speaker::User => {
                if let Some(question_id) = current {
                    match pairs.last_mut() {
                        Some((last_id, text)) if *last_id == question_id => {
                            text.push(' ');
                            text.push_str(&turn.content);
                        }
                        _ => pairs.push((question_id, turn.content.clone())),
                    }
                }
            }
        }
    }
    pairs
}
