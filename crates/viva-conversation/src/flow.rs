//! Conversation state machine.

use std::collections::HashSet;

use tracing::{debug, info, warn};
use uuid::Uuid;

use viva_protocols::session::{Session, SessionPatch, SessionStatus};
use viva_protocols::turn::{Speaker, Turn, TurnKind};

use crate::config::ConversationConfig;
use crate::policy::FollowUpPolicy;

/// What the flow decided in response to input.
#[derive(Debug)]
pub enum FlowStep {
    /// AI turn to speak and persist; the interview continues.
    Reply(Turn),
    /// Conclusion turn; the session is completed and the transcript
    /// should be finalized now.
    Concluded(Turn),
}

impl FlowStep {
    /// The emitted AI turn, whichever way the flow went.
    pub fn turn(&self) -> &Turn {
        match self {
            FlowStep::Reply(turn) | FlowStep::Concluded(turn) => turn,
        }
    }
}

/// Drives one interview session turn-by-turn.
///
/// The loop within a session is strictly sequential: one outstanding
/// exchange at a time, `turn_number = existing turn count + 1` at every
/// append. Sessions do not share state; one flow instance belongs to one
/// session.
pub struct ConversationFlow {
    session: Session,
    turns: Vec<Turn>,
    follow_up_asked: HashSet<Uuid>,
    policy: Box<dyn FollowUpPolicy>,
    config: ConversationConfig,
}

impl ConversationFlow {
    /// Start a flow for a fresh session.
    pub fn new(session: Session, policy: Box<dyn FollowUpPolicy>, config: ConversationConfig) -> Self {
        Self {
            session,
            turns: Vec::new(),
            follow_up_asked: HashSet::new(),
            policy,
            config,
        }
    }

    /// Reopen an existing session by replaying its persisted turns.
    ///
    /// The presence of an introduction turn means resume, not restart:
    /// [`begin`] will emit nothing and the next user turn continues from
    /// the stored question pointer. Follow-up bookkeeping is rebuilt from
    /// the replayed turns.
    ///
    /// [`begin`]: ConversationFlow::begin
    pub fn resume(
        session: Session,
        turns: Vec<Turn>,
        policy: Box<dyn FollowUpPolicy>,
        config: ConversationConfig,
    ) -> Self {
        let follow_up_asked = turns
            .iter()
            .filter(|t| t.kind == Some(TurnKind::FollowUp))
            .filter_map(|t| t.question_id)
            .collect();

        debug!(
            "Resuming session {} with {} persisted turn(s)",
            session.id,
            turns.len()
        );
        Self {
            session,
            turns,
            follow_up_asked,
            policy,
            config,
        }
    }

    /// The session as this flow sees it.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// All turns, in order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Patch capturing the flow's current pointer and flags, for
    /// persisting between exchanges.
    pub fn state_patch(&self) -> SessionPatch {
        SessionPatch {
            status: Some(self.session.status),
            current_question: Some(self.session.current_question),
            introduction_complete: Some(self.session.introduction_complete),
            ..Default::default()
        }
    }

    /// Open the conversation. Emits the introduction turn, or nothing
    /// when one was already spoken (resumed session).
    pub fn begin(&mut self) -> Option<Turn> {
        let already_introduced = self
            .turns
            .iter()
            .any(|t| t.kind == Some(TurnKind::Introduction));
        if already_introduced {
            return None;
        }

        info!("Session {} starting", self.session.id);
        Some(self.append_ai(self.config.introduction.clone(), TurnKind::Introduction, None))
    }

    /// Feed one user utterance and get the AI's next turn.
    ///
    /// Returns `None` when the session is no longer in progress; input
    /// after conclusion is dropped.
    pub fn on_user_turn(&mut self, content: &str) -> Option<FlowStep> {
        if self.session.status != SessionStatus::InProgress {
            warn!(
                "Session {} received input while {:?}; ignoring",
                self.session.id, self.session.status
            );
            return None;
        }

        // The first user turn after the introduction is the greeting
        // exchange; the script starts right after it.
        if !self.session.introduction_complete {
            self.append_user(content, None, None);
            self.session.introduction_complete = true;
            return Some(self.ask_current_or_conclude());
        }

        let Some(question) = self.session.current().cloned() else {
            self.append_user(content, None, None);
            return Some(self.conclude());
        };

        self.append_user(content, Some(TurnKind::Answer), Some(question.id));

        if self.policy.needs_follow_up(&question, content)
            && !self.follow_up_asked.contains(&question.id)
        {
            self.follow_up_asked.insert(question.id);
            debug!(
                "Session {} follow-up on question {}",
                self.session.id, question.order
            );
            let prompt = self.policy.follow_up_prompt(&question);
            return Some(FlowStep::Reply(self.append_ai(
                prompt,
                TurnKind::FollowUp,
                Some(question.id),
            )));
        }

        self.session.current_question += 1;
        Some(self.ask_current_or_conclude())
    }

    /// User-initiated end: immediately mark the session terminal,
    /// regardless of where the question pointer is. Returns the status
    /// the caller should finalize with.
    pub fn end(&mut self) -> SessionStatus {
        if self.session.status == SessionStatus::InProgress {
            self.session.status = if self.session.script_exhausted() {
                SessionStatus::Completed
            } else {
                SessionStatus::Abandoned
            };
        }
        info!(
            "Session {} ended by user as {:?}",
            self.session.id, self.session.status
        );
        self.session.status
    }

    fn ask_current_or_conclude(&mut self) -> FlowStep {
        match self.session.current().cloned() {
            Some(question) => FlowStep::Reply(self.append_ai(
                question.prompt.clone(),
                TurnKind::Question,
                Some(question.id),
            )),
            None => self.conclude(),
        }
    }

    fn conclude(&mut self) -> FlowStep {
        self.session.status = SessionStatus::Completed;
        info!("Session {} script exhausted; concluding", self.session.id);
        FlowStep::Concluded(self.append_ai(
            self.config.conclusion.clone(),
            TurnKind::Conclusion,
            None,
        ))
    }

    fn append_ai(&mut self, content: String, kind: TurnKind, question_id: Option<Uuid>) -> Turn {
        self.append(Speaker::Ai, content, Some(kind), question_id)
    }

    fn append_user(&mut self, content: &str, kind: Option<TurnKind>, question_id: Option<Uuid>) {
        self.append(Speaker::User, content.to_string(), kind, question_id);
    }

    fn append(
        &mut self,
        speaker: Speaker,
        content: String,
        kind: Option<TurnKind>,
        question_id: Option<Uuid>,
    ) -> Turn {
        let turn_number = self.turns.len() as u32 + 1;
        let mut turn = Turn::new(self.session.id, turn_number, speaker, content);
        turn.kind = kind;
        turn.question_id = question_id;
        self.turns.push(turn.clone());
        turn
    }
}

#[cfg(test)]
#[path = "flow_tests.rs"]
mod tests;
