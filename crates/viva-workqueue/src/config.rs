//! Queue configuration.

use serde::{Deserialize, Serialize};

/// Queue and runner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Default attempt cap for new tasks.
    #[serde(default = "default_max_attempts")]
    pub default_max_attempts: u32,

    /// Base backoff delay in seconds.
    #[serde(default = "default_base_delay")]
    pub base_delay_secs: u64,

    /// Backoff delay cap in seconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_secs: u64,

    /// Maximum due tasks fetched per runner cycle.
    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,

    /// How far a claim bumps a task's scheduled time while it is being
    /// processed.
    #[serde(default = "default_lease")]
    pub lease_secs: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay() -> u64 {
    300
}

fn default_max_delay() -> u64 {
    1800
}

fn default_batch_limit() -> usize {
    10
}

fn default_lease() -> u64 {
    60
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            default_max_attempts: default_max_attempts(),
            base_delay_secs: default_base_delay(),
            max_delay_secs: default_max_delay(),
            batch_limit: default_batch_limit(),
            lease_secs: default_lease(),
        }
    }
}
