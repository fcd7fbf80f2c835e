//! Close-event classification.
//!
//! Classification is a pure function of the close code and reason; state
//! transitions and reconnection live in the client, which consumes the
//! [`CloseDisposition`] this module produces.

/// Why the connection closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCategory {
    /// Clean end of stream requested by a peer.
    Normal,
    /// Credentials rejected.
    AuthRejected,
    /// Policy violation reported by the server.
    PolicyViolation,
    /// Usage quota exhausted.
    QuotaExceeded,
    /// Abnormal or network-level closure.
    Abnormal,
    /// Server-side fault.
    ServerError,
    /// Anything else.
    Unknown,
}

/// Classification result consumed by the client's supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseDisposition {
    /// Whether reconnection should be attempted.
    pub retryable: bool,
    pub category: CloseCategory,
}

/// Classify a close event into retryable vs terminal.
///
/// Authentication and policy violations and quota exhaustion are terminal;
/// abnormal and network closures are retryable. Normal closure is terminal
/// but clean. The reason text is consulted for servers that report quota
/// or credential failures under a generic code.
pub fn classify_close(code: u16, reason: &str) -> CloseDisposition {
    let reason_lower = reason.to_lowercase();

    if reason_lower.contains("quota") || reason_lower.contains("resource exhausted") {
        return CloseDisposition {
            retryable: false,
            category: CloseCategory::QuotaExceeded,
        };
    }
    if reason_lower.contains("api key") || reason_lower.contains("unauthenticated") {
        return CloseDisposition {
            retryable: false,
            category: CloseCategory::AuthRejected,
        };
    }

    match code {
        1000 => CloseDisposition {
            retryable: false,
            category: CloseCategory::Normal,
        },
        1008 => CloseDisposition {
            retryable: false,
            category: CloseCategory::PolicyViolation,
        },
        1011 | 1012 | 1013 => CloseDisposition {
            retryable: true,
            category: CloseCategory::ServerError,
        },
        1001 | 1006 => CloseDisposition {
            retryable: true,
            category: CloseCategory::Abnormal,
        },
        _ => CloseDisposition {
            retryable: true,
            category: CloseCategory::Unknown,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_closure_terminal() {
        let d = classify_close(1000, "");
        assert!(!d.retryable);
        assert_eq!(d.category, CloseCategory::Normal);
    }

    #[test]
    fn test_abnormal_closure_retryable() {
        let d = classify_close(1006, "");
        assert!(d.retryable);
        assert_eq!(d.category, CloseCategory::Abnormal);
    }

    #[test]
    fn test_going_away_retryable() {
        assert!(classify_close(1001, "going away").retryable);
    }

    #[test]
    fn test_policy_violation_terminal() {
        let d = classify_close(1008, "policy violation");
        assert!(!d.retryable);
        assert_eq!(d.category, CloseCategory::PolicyViolation);
    }

    #[test]
    fn test_server_error_retryable() {
        let d = classify_close(1011, "internal error");
        assert!(d.retryable);
        assert_eq!(d.category, CloseCategory::ServerError);
    }

    #[test]
    fn test_quota_in_reason_terminal_regardless_of_code() {
        let d = classify_close(1011, "Quota exceeded for model");
        assert!(!d.retryable);
        assert_eq!(d.category, CloseCategory::QuotaExceeded);
    }

    #[test]
    fn test_bad_api_key_terminal() {
        let d = classify_close(1006, "API key not valid");
        assert!(!d.retryable);
        assert_eq!(d.category, CloseCategory::AuthRejected);
    }

    #[test]
    fn test_unknown_code_retryable() {
        let d = classify_close(4999, "");
        assert!(d.retryable);
        assert_eq!(d.category, CloseCategory::Unknown);
    }
}
