//! Service Layer Error Types
//!
//! This module defines error types for the note access functions.

use crate::db::DatabaseError;
use crate::models::ValidationError;
use thiserror::Error;

/// Service operation errors
#[derive(Error, Debug)]
pub enum NoteServiceError {
    /// Note not found by ID (for this owner)
    #[error("Note not found: {id}")]
    NoteNotFound { id: String },

    /// Input rejected before touching the store
    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// Database operation failed
    #[error("Database operation failed: {0}")]
    DatabaseError(#[from] DatabaseError),
}

impl NoteServiceError {
    /// Create a note not found error
    pub fn note_not_found(id: impl Into<String>) -> Self {
        Self::NoteNotFound { id: id.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoteNotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationFailed(_))
    }
}
