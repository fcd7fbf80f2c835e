//! # Viva Protocols
//!
//! Shared definitions for the interview engine crates.
//! Contains the data model, streaming wire envelopes, the repository
//! trait, and the error taxonomy - no I/O lives here.
//!
//! ## Core Types
//!
//! - [`Session`] - one interview attempt bound to a question script
//! - [`Question`] - one scripted interview question
//! - [`Turn`] - one atomic utterance, ordered by `turn_number`
//! - [`RetryTask`] - one deferred AI invocation with retry bookkeeping
//! - [`InterviewRepository`] - persistence seam consumed by the core

pub mod error;
pub mod question;
pub mod repository;
pub mod session;
pub mod task;
pub mod turn;
pub mod wire;

pub use error::{LiveError, StoreError, TaskError};
pub use question::{Difficulty, Question, QuestionCategory};
pub use repository::InterviewRepository;
pub use session::{Session, SessionPatch, SessionStatus};
pub use task::{RetryTask, RetryTaskPatch, TaskType};
pub use turn::{Speaker, Turn, TurnKind};
