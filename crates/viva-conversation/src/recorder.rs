//! Answer recording strategies.
//!
//! Two interchangeable ways of capturing per-answer evaluations sit
//! behind one trait: tool-call-driven saving while the live turn is
//! still open, and post-hoc scoring of the finished transcript through
//! the one-shot provider client.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use viva_protocols::question::Question;
use viva_protocols::session::Session;
use viva_protocols::wire::FunctionCall;
use viva_protocols::TaskError;
use viva_provider::{GeminiClient, GenerateContentRequest};

/// One recorded evaluation of an answer.
#[derive(Debug, Clone)]
pub struct AnswerEvaluation {
    pub question_id: Uuid,
    /// 0-5 when the evaluator produced one.
    pub score: Option<f32>,
    pub notes: Option<String>,
}

/// Records an answer's evaluation.
#[async_trait]
pub trait AnswerRecorder: Send + Sync {
    /// Produce the evaluation for one answer.
    async fn record(
        &self,
        session: &Session,
        question: &Question,
        answer: &str,
    ) -> Result<AnswerEvaluation, TaskError>;
}

/// Live strategy: the model calls a `record_answer` tool during the
/// turn; evaluations arrive through [`note_function_call`] and `record`
/// hands back what the live session already produced.
///
/// [`note_function_call`]: ToolCallRecorder::note_function_call
pub struct ToolCallRecorder {
    evaluations: Mutex<HashMap<Uuid, AnswerEvaluation>>,
}

impl ToolCallRecorder {
    /// Tool name the live session advertises to the model.
    pub const TOOL_NAME: &'static str = "record_answer";

    /// Create an empty recorder.
    pub fn new() -> Self {
        Self {
            evaluations: Mutex::new(HashMap::new()),
        }
    }

    /// Feed one live tool call. Returns the question it evaluated, or
    /// `None` when the call is not a usable `record_answer`.
    pub async fn note_function_call(&self, call: &FunctionCall) -> Option<Uuid> {
        if call.name != Self::TOOL_NAME {
            return None;
        }

        let question_id = call
            .args
            .get("questionId")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok());
        let Some(question_id) = question_id else {
            warn!("record_answer call without a usable questionId: {}", call.args);
            return None;
        };

        let evaluation = AnswerEvaluation {
            question_id,
            score: call.args.get("score").and_then(|v| v.as_f64()).map(|s| s as f32),
            notes: call
                .args
                .get("notes")
                .and_then(|v| v.as_str())
                .map(String::from),
        };
        debug!("Live evaluation recorded for question {}", question_id);
        self.evaluations.lock().await.insert(question_id, evaluation);
        Some(question_id)
    }
}

impl Default for ToolCallRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnswerRecorder for ToolCallRecorder {
    async fn record(
        &self,
        _session: &Session,
        question: &Question,
        _answer: &str,
    ) -> Result<AnswerEvaluation, TaskError> {
        self.evaluations
            .lock()
            .await
            .get(&question.id)
            .cloned()
            .ok_or_else(|| {
                TaskError::Transient(format!(
                    "no live evaluation recorded for question {}",
                    question.id
                ))
            })
    }
}

/// Post-hoc strategy: score the answer against the question's criteria
/// with a one-shot generate call. Rate limits propagate typed so the
/// retry queue can reschedule at the provider's resume time.
pub struct TranscriptScoringRecorder {
    client: Arc<GeminiClient>,
    model: String,
}

impl TranscriptScoringRecorder {
    /// Create a recorder scoring through the given client and model.
    pub fn new(client: Arc<GeminiClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    fn prompt(question: &Question, answer: &str) -> String {
        format!(
            "Score this interview answer from 0 to 5.\n\
             Question: {}\n\
             Evaluation criteria: {}\n\
             Answer: {}\n\
             Reply with the numeric score first, then one sentence of feedback.",
            question.prompt,
            question.evaluation_criteria.join("; "),
            answer
        )
    }
}

#[async_trait]
impl AnswerRecorder for TranscriptScoringRecorder {
    async fn record(
        &self,
        _session: &Session,
        question: &Question,
        answer: &str,
    ) -> Result<AnswerEvaluation, TaskError> {
        let request = GenerateContentRequest::from_prompt(Self::prompt(question, answer))
            .with_system_instruction("You are a rigorous but fair interview evaluator.");

        let response = self.client.generate_content(&self.model, &request).await?;
        let text = response
            .first_text()
            .ok_or_else(|| TaskError::Transient("empty scoring response".to_string()))?;

        Ok(AnswerEvaluation {
            question_id: question.id,
            score: parse_score(&text),
            notes: Some(text),
        })
    }
}

/// First numeric token in the evaluator's reply, clamped to 0-5.
fn parse_score(text: &str) -> Option<f32> {
    text.split(|c: char| !c.is_ascii_digit() && c != '.')
        .find_map(|token| token.parse::<f32>().ok())
        .map(|score| score.clamp(0.0, 5.0))
}
