//! Error types for the Turnstile rate limiter.

use thiserror::Error;

use crate::ratelimit::ActionClass;

/// Main error type for Turnstile operations.
#[derive(Error, Debug)]
pub enum TurnstileError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller exceeded a ceiling for the given action class
    #[error("Too many requests for {class} traffic")]
    RateLimited { class: ActionClass },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TurnstileError {
    /// HTTP status code a request-handling layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            TurnstileError::RateLimited { .. } => 429,
            TurnstileError::Config(_) | TurnstileError::Io(_) | TurnstileError::Json(_) => 500,
        }
    }
}

/// Result type alias for Turnstile operations.
pub type Result<T> = std::result::Result<T, TurnstileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_maps_to_429() {
        let err = TurnstileError::RateLimited {
            class: ActionClass::Login,
        };
        assert_eq!(err.status_code(), 429);
        assert_eq!(err.to_string(), "Too many requests for login traffic");
    }

    #[test]
    fn test_config_error_is_server_error() {
        let err = TurnstileError::Config("bad".to_string());
        assert_eq!(err.status_code(), 500);
    }
}
