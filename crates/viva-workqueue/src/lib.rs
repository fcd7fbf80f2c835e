//! # Viva Workqueue
//!
//! Durable retry queue for deferred one-shot AI calls.
//!
//! ## Features
//!
//! - Store-backed queue ordered by scheduled retry time
//! - Exponential backoff with rate-limit resume-at precedence
//! - Periodic runner with per-task failure isolation
//! - Claim-by-bump lease against overlapping runner passes

pub mod backoff;
pub mod config;
pub mod queue;
pub mod runner;

pub use backoff::next_retry_time;
pub use config::QueueConfig;
pub use queue::RetryQueue;
pub use runner::{RetryRunner, RunReport, TaskHandler};
