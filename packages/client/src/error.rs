//! Client Error Types
//!
//! One error type for everything the client surfaces: transport failures,
//! server rejections and local validation.

use notespace_core::models::ValidationError;
use thiserror::Error;

/// Client operation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Input rejected, locally or by the server (HTTP 400)
    #[error("{message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// The referenced note does not exist (HTTP 404)
    #[error("Note not found: {message}")]
    NotFound { message: String },

    /// The request never produced a response (connect failure, timeout)
    #[error("Network error: {0}")]
    Transport(String),

    /// The server answered with an error status other than 400/404
    #[error("Server error ({status}): {message}")]
    Server {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The server answered with a body the client cannot understand
    #[error("Unexpected response: {0}")]
    Protocol(String),

    /// A mutation attempt was driven through an illegal state change
    #[error("Invalid mutation transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}

impl ClientError {
    /// Whether repeating the same request may succeed
    ///
    /// Only failures that say nothing about the request itself qualify:
    /// transport errors and 5xx responses.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(_) => true,
            ClientError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation { .. })
    }
}

impl From<ValidationError> for ClientError {
    fn from(err: ValidationError) -> Self {
        ClientError::Validation {
            field: Some(err.field().to_string()),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Protocol(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::Server {
                status: status.as_u16(),
                code: None,
                message: err.to_string(),
            }
        } else {
            // connect, timeout, request, body and redirect failures
            ClientError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ClientError::Transport("reset".into()).is_retryable());
        assert!(ClientError::Server {
            status: 503,
            code: None,
            message: "busy".into()
        }
        .is_retryable());
        assert!(!ClientError::Server {
            status: 409,
            code: Some("CONSTRAINT_VIOLATION".into()),
            message: "dup".into()
        }
        .is_retryable());
        assert!(!ClientError::NotFound {
            message: "x".into()
        }
        .is_retryable());
        assert!(!ClientError::from(ValidationError::MissingField("title".into())).is_retryable());
    }

    #[test]
    fn test_validation_error_keeps_field() {
        let err = ClientError::from(ValidationError::MissingField("content".into()));
        assert_eq!(
            err,
            ClientError::Validation {
                message: "Missing required field: content".into(),
                field: Some("content".into()),
            }
        );
    }
}
