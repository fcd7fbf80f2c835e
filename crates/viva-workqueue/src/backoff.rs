//! Retry backoff policy.

use chrono::{DateTime, Duration, Utc};

use viva_protocols::TaskError;

use crate::config::QueueConfig;

/// Backoff delay for a 1-based attempt: `min(cap, base * 2^(attempt-1))`.
pub fn backoff_delay(config: &QueueConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(31);
    let secs = config
        .base_delay_secs
        .saturating_mul(1u64 << exponent)
        .min(config.max_delay_secs);
    Duration::seconds(secs as i64)
}

/// Next retry time for a task that failed on its `attempt`-th try.
///
/// A rate-limit error carrying a resume-at time wins over computed
/// backoff. The result is always strictly in the future.
pub fn next_retry_time(
    config: &QueueConfig,
    attempt: u32,
    error: &TaskError,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let proposed = match error {
        TaskError::RateLimited { resume_at } => *resume_at,
        _ => now + backoff_delay(config, attempt),
    };
    proposed.max(now + Duration::seconds(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> QueueConfig {
        QueueConfig {
            base_delay_secs: 300,
            max_delay_secs: 1800,
            ..Default::default()
        }
    }

    #[test]
    fn test_delay_doubles_per_attempt() {
        let config = config();
        assert_eq!(backoff_delay(&config, 1), Duration::seconds(300));
        assert_eq!(backoff_delay(&config, 2), Duration::seconds(600));
        assert_eq!(backoff_delay(&config, 3), Duration::seconds(1200));
    }

    #[test]
    fn test_delay_capped() {
        let config = config();
        assert_eq!(backoff_delay(&config, 4), Duration::seconds(1800));
        assert_eq!(backoff_delay(&config, 30), Duration::seconds(1800));
    }

    #[test]
    fn test_rate_limit_resume_at_wins() {
        let now = Utc::now();
        let resume_at = now + Duration::minutes(10);
        let error = TaskError::RateLimited { resume_at };

        assert_eq!(next_retry_time(&config(), 1, &error, now), resume_at);
    }

    #[test]
    fn test_stale_resume_at_clamped_to_future() {
        let now = Utc::now();
        let error = TaskError::RateLimited {
            resume_at: now - Duration::minutes(5),
        };

        assert!(next_retry_time(&config(), 1, &error, now) > now);
    }

    #[test]
    fn test_transient_uses_backoff() {
        let now = Utc::now();
        let error = TaskError::Transient("503".to_string());

        assert_eq!(
            next_retry_time(&config(), 2, &error, now),
            now + Duration::seconds(600)
        );
    }
}
