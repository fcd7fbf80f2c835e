//! Retryable task errors.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::StoreError;

/// Errors from one-shot AI task execution. The runner routes on these:
/// `RateLimited` requeues at the carried resume time, `Transient` is
/// subject to backoff and max-attempts, `Terminal` is never retried.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Upstream rate limit carrying the time the provider asked us to
    /// resume at.
    #[error("Rate limited: resume at {resume_at}")]
    RateLimited { resume_at: DateTime<Utc> },

    /// Generic failure worth retrying with backoff.
    #[error("Transient failure: {0}")]
    Transient(String),

    /// Failure that retrying cannot fix.
    #[error("Terminal failure: {0}")]
    Terminal(String),

    /// The task's own bookkeeping write failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl TaskError {
    /// Whether the runner should retry after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskError::RateLimited { .. } | TaskError::Transient(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(TaskError::RateLimited { resume_at: Utc::now() }.is_retryable());
        assert!(TaskError::Transient("503".to_string()).is_retryable());
        assert!(!TaskError::Terminal("bad request".to_string()).is_retryable());
        assert!(!TaskError::Store(StoreError::Query("locked".to_string())).is_retryable());
    }

    #[test]
    fn test_rate_limited_display() {
        let err = TaskError::RateLimited { resume_at: Utc::now() };
        assert!(err.to_string().contains("Rate limited"));
    }
}
