//! LLM error types

use std::fmt;
use thiserror::Error;

/// LLM error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
}

impl LlmError {
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Network, message)
    }

    pub fn model_not_found(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::ModelNotFound, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::ServerError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::InvalidRequest, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Unknown, message)
    }
}

/// Error classification, used for logging only. The engine never retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Connection refused, timeouts, truncated bodies
    Network,
    /// Model is not pulled on the server (404)
    ModelNotFound,
    /// Server error (5xx)
    ServerError,
    /// Bad request (400)
    InvalidRequest,
    /// Anything else, including undecodable responses
    Unknown,
}

impl fmt::Display for LlmErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Network => "network",
            Self::ModelNotFound => "model_not_found",
            Self::ServerError => "server_error",
            Self::InvalidRequest => "invalid_request",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_kind() {
        assert_eq!(LlmError::network("x").kind, LlmErrorKind::Network);
        assert_eq!(LlmError::model_not_found("x").kind, LlmErrorKind::ModelNotFound);
        assert_eq!(LlmError::server_error("x").kind, LlmErrorKind::ServerError);
        assert_eq!(LlmError::invalid_request("x").kind, LlmErrorKind::InvalidRequest);
        assert_eq!(LlmError::unknown("x").kind, LlmErrorKind::Unknown);
    }

    #[test]
    fn test_display_is_message() {
        let err = LlmError::network("Connection failed: refused");
        assert_eq!(err.to_string(), "Connection failed: refused");
        assert_eq!(err.kind.to_string(), "network");
    }
}
