//! Live client configuration.

use std::time::Duration;

use viva_protocols::wire::{Content, GenerationConfig};

const DEFAULT_ENDPOINT: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// Configuration for one live streaming session.
#[derive(Debug, Clone)]
pub struct LiveConfig {
    /// WebSocket endpoint.
    pub endpoint: String,
    /// API key appended as a query parameter.
    pub api_key: String,
    /// Model sent in the setup handshake.
    pub model: String,
    /// Generation configuration sent in the setup handshake.
    pub generation_config: Option<GenerationConfig>,
    /// System instruction sent in the setup handshake.
    pub system_instruction: Option<String>,
    /// Bounded wait for connection establishment.
    pub connect_timeout: Duration,
    /// Keepalive ping interval while connected.
    pub heartbeat_interval: Duration,
    /// Reconnection policy for retryable closes.
    pub reconnect: ReconnectConfig,
}

impl LiveConfig {
    /// Create a config with defaults for everything but credentials and
    /// model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            generation_config: None,
            system_instruction: None,
            connect_timeout: Duration::from_secs(10),
            heartbeat_interval: Duration::from_secs(20),
            reconnect: ReconnectConfig::default(),
        }
    }

    /// Set the system instruction.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Set the generation configuration.
    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }

    /// Full connection URL.
    pub(crate) fn url(&self) -> String {
        format!("{}?key={}", self.endpoint, self.api_key)
    }

    /// System instruction as a wire content block.
    pub(crate) fn system_content(&self) -> Option<Content> {
        self.system_instruction
            .as_ref()
            .map(|text| Content::text("system", text.clone()))
    }
}

/// Reconnection backoff policy.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Maximum reconnection attempts before giving up.
    pub max_attempts: u32,
    /// Delay before the first reconnection attempt.
    pub base_delay: Duration,
    /// Cap on the per-attempt delay.
    pub max_delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl ReconnectConfig {
    /// Delay for a 0-based attempt: `base * 2^attempt`, capped at
    /// `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let millis = self.base_delay.as_millis() as f64 * 2f64.powi(attempt as i32);
        let millis = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(millis as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_carries_key() {
        let config = LiveConfig::new("secret", "models/test");
        assert!(config.url().ends_with("?key=secret"));
    }

    #[test]
    fn test_delay_doubles_from_base() {
        let reconnect = ReconnectConfig {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
        };
        assert_eq!(reconnect.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(reconnect.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(reconnect.delay_for_attempt(2), Duration::from_millis(400));
    }

    #[test]
    fn test_delay_capped() {
        let reconnect = ReconnectConfig {
            max_attempts: 10,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        };
        assert_eq!(reconnect.delay_for_attempt(9), Duration::from_secs(30));
    }
}
