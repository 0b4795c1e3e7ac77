//! Error types for GovernAI
//!
//! This module defines the error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for GovernAI operations
///
/// Covers configuration loading, API interactions, usage metering,
/// and local persistence failures.
#[derive(Error, Debug)]
pub enum GovernaiError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The API answered with a non-success status
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code returned by the API
        status: u16,
        /// Detail text extracted from the response body
        message: String,
    },

    /// The API could not be reached at all
    #[error("Network error: {0}")]
    Network(String),

    /// Input rejected before any request was made
    #[error("Validation error: {0}")]
    Validation(String),

    /// Free-tier usage threshold reached without a paid entitlement
    #[error("Usage limit reached: limit={limit}, used={used}")]
    UsageLimitReached {
        /// Configured free query threshold
        limit: u32,
        /// Queries consumed so far
        used: u32,
    },

    /// Usage storage errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type alias for GovernAI operations
///
/// Uses `anyhow::Error` as the error type so call sites can attach context
/// while still downcasting to [`GovernaiError`] where needed.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = GovernaiError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_api_error_display() {
        let error = GovernaiError::Api {
            status: 404,
            message: "Contract not found".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "API error (status 404): Contract not found"
        );
    }

    #[test]
    fn test_usage_limit_display() {
        let error = GovernaiError::UsageLimitReached { limit: 5, used: 5 };
        let s = error.to_string();
        assert!(s.contains("limit=5"));
        assert!(s.contains("used=5"));
    }

    #[test]
    fn test_validation_error_display() {
        let error = GovernaiError::Validation("query is empty".to_string());
        assert_eq!(error.to_string(), "Validation error: query is empty");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GovernaiError>();
    }

    #[test]
    fn test_storage_error_display() {
        let error = GovernaiError::Storage("database connection failed".to_string());
        assert_eq!(
            error.to_string(),
            "Storage error: database connection failed"
        );
    }
}
