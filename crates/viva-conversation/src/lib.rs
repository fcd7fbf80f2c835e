//! # Viva Conversation
//!
//! The scripted-but-adaptive interview loop: a [`ConversationFlow`]
//! decides what the AI says next (introduction, question, one follow-up
//! per question, conclusion), a [`TurnBuffer`] persists turns in batches
//! without blocking the live loop, and [`AnswerRecorder`] strategies
//! capture per-answer evaluations either during the live turn or
//! post-hoc.

pub mod buffer;
pub mod config;
pub mod flow;
pub mod handler;
pub mod policy;
pub mod recorder;

pub use buffer::{FinalizeReport, FlushReport, TurnBuffer, TurnWriteError};
pub use config::ConversationConfig;
pub use flow::{ConversationFlow, FlowStep};
pub use handler::AnswerScoringHandler;
pub use policy::{AnswerHeuristicPolicy, FollowUpPolicy};
pub use recorder::{AnswerEvaluation, AnswerRecorder, ToolCallRecorder, TranscriptScoringRecorder};
