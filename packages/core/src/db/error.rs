//! Note store errors
//!
//! Everything the libsql layer can report, split so the access functions can
//! map a rejected write differently from a broken database.

use std::path::PathBuf;
use thiserror::Error;

/// SQLite primary result code for constraint failures
const SQLITE_CONSTRAINT: i32 = 19;

/// Errors raised by `DatabaseService` and `NoteStore` implementations
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Cannot open note database {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        source: libsql::Error,
    },

    /// Table or index creation failed at startup
    #[error("Note schema setup failed: {0}")]
    SchemaFailed(String),

    #[error("No permission to create note database at {path}")]
    PermissionDenied { path: PathBuf },

    /// Creating the database directory failed
    #[error("Database directory error: {0}")]
    Io(#[from] std::io::Error),

    #[error("libsql error: {0}")]
    Libsql(#[from] libsql::Error),

    /// A statement failed for a reason other than a constraint
    #[error("Query failed: {context}")]
    QueryFailed { context: String },

    /// A write hit the primary key or the idempotency index
    #[error("Constraint violation: {context}")]
    ConstraintViolation { context: String },

    /// A stored row could not be read back as a note
    #[error("Corrupt row: {context}")]
    CorruptRow { context: String },
}

impl DatabaseError {
    pub fn open_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::OpenFailed { path, source }
    }

    pub fn schema_failed(msg: impl Into<String>) -> Self {
        Self::SchemaFailed(msg.into())
    }

    pub fn permission_denied(path: PathBuf) -> Self {
        Self::PermissionDenied { path }
    }

    pub fn query_failed(context: impl Into<String>) -> Self {
        Self::QueryFailed {
            context: context.into(),
        }
    }

    pub fn constraint_violation(context: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            context: context.into(),
        }
    }

    pub fn corrupt_row(context: impl Into<String>) -> Self {
        Self::CorruptRow {
            context: context.into(),
        }
    }

    /// Classify a failed write, keeping constraint failures distinguishable
    ///
    /// Extended result codes carry the primary code in the low byte.
    pub fn from_write(context: &str, err: libsql::Error) -> Self {
        match &err {
            libsql::Error::SqliteFailure(code, message) if code & 0xff == SQLITE_CONSTRAINT => {
                Self::constraint_violation(format!("{}: {}", context, message))
            }
            _ => Self::query_failed(format!("{}: {}", context, err)),
        }
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::ConstraintViolation { .. })
    }
}
