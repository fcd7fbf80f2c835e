//! # Viva Provider
//!
//! Synchronous client for the generative AI REST endpoint, used by the
//! retryable one-shot calls (question generation, answer scoring,
//! session summaries). Rate limits map to a typed error carrying a
//! resume-at time so the retry queue can reschedule precisely.

pub mod client;
pub mod types;

pub use client::GeminiClient;
pub use types::{Candidate, GenerateContentRequest, GenerateContentResponse};
