//! HTTP error handling
//!
//! Every failed request answers with the same JSON body:
//! `{ "message": ..., "code": ..., "details": ... }`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use notespace_core::models::ValidationError;
use notespace_core::services::NoteServiceError;
use serde::{Deserialize, Serialize};

pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
pub const NOTE_NOT_FOUND: &str = "NOTE_NOT_FOUND";
pub const CONSTRAINT_VIOLATION: &str = "CONSTRAINT_VIOLATION";
pub const DATABASE_ERROR: &str = "DATABASE_ERROR";

/// JSON error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    /// For validation errors, the offending field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HttpError {
    /// Create a new HTTP error
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    /// Create a new HTTP error with details
    pub fn with_details(
        message: impl Into<String>,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: Some(details.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            NOTE_NOT_FOUND => StatusCode::NOT_FOUND,
            VALIDATION_ERROR => StatusCode::BAD_REQUEST,
            CONSTRAINT_VIOLATION => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ValidationError> for HttpError {
    fn from(err: ValidationError) -> Self {
        HttpError::with_details(err.to_string(), VALIDATION_ERROR, err.field())
    }
}

impl From<NoteServiceError> for HttpError {
    fn from(err: NoteServiceError) -> Self {
        match err {
            NoteServiceError::NoteNotFound { id } => {
                HttpError::new(format!("Note not found: {}", id), NOTE_NOT_FOUND)
            }
            NoteServiceError::ValidationFailed(e) => e.into(),
            NoteServiceError::DatabaseError(e) if e.is_constraint_violation() => {
                tracing::warn!(error = %e, "Write rejected by constraint");
                HttpError::new(e.to_string(), CONSTRAINT_VIOLATION)
            }
            NoteServiceError::DatabaseError(e) => {
                tracing::error!(error = %e, "Database operation failed");
                HttpError::new(e.to_string(), DATABASE_ERROR)
            }
        }
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        HttpError::with_details(rejection.body_text(), VALIDATION_ERROR, "body")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            HttpError::new("x", NOTE_NOT_FOUND).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            HttpError::new("x", VALIDATION_ERROR).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            HttpError::new("x", DATABASE_ERROR).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_error_carries_field() {
        let err: HttpError = ValidationError::MissingField("title".to_string()).into();
        assert_eq!(err.code, VALIDATION_ERROR);
        assert_eq!(err.details.as_deref(), Some("title"));
    }
}
