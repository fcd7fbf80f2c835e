//! Persistence errors.

use thiserror::Error;

/// Errors from the persistence repository. Write failures are reported as
/// partial success by the callers that batch - never fatal to the live
/// conversational loop.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Could not open or reach the store.
    #[error("Store connection error: {0}")]
    Connection(String),

    /// A read or write failed.
    #[error("Store query error: {0}")]
    Query(String),

    /// Row not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Payload could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = StoreError::NotFound("session 42".to_string());
        assert!(err.to_string().contains("session 42"));
    }
}
