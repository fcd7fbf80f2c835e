//! Conversation configuration.

use serde::{Deserialize, Serialize};

/// Conversation flow and buffering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Pending turns at which the buffer asks to be flushed. Kept small
    /// (5-10) to bound data loss on a dropped session.
    #[serde(default = "default_flush_threshold")]
    pub flush_threshold: usize,

    /// Text of the AI introduction turn.
    #[serde(default = "default_introduction")]
    pub introduction: String,

    /// Text of the AI conclusion turn.
    #[serde(default = "default_conclusion")]
    pub conclusion: String,
}

fn default_flush_threshold() -> usize {
    8
}

fn default_introduction() -> String {
    "Welcome, and thanks for taking the time today. I'll ask you a series of \
     interview questions; answer in as much detail as feels natural. Ready \
     when you are."
        .to_string()
}

fn default_conclusion() -> String {
    "That was the last question - thank you. Your interview is complete and \
     your responses have been recorded. You'll find feedback on your \
     dashboard shortly."
        .to_string()
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            flush_threshold: default_flush_threshold(),
            introduction: default_introduction(),
            conclusion: default_conclusion(),
        }
    }
}
