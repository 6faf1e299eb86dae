//! Note Data Structures
//!
//! This module defines the `Note` struct and the request/response shapes of
//! the note access functions.
//!
//! # Examples
//!
//! ```rust
//! use notespace_core::models::{CreateNoteInput, NoteLimits};
//!
//! let input = CreateNoteInput::new("  Groceries ", "milk, eggs");
//! let new_note = input.validate(&NoteLimits::default()).unwrap();
//! assert_eq!(new_note.title, "Groceries");
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Maximum title length in characters (after trimming)
pub const MAX_TITLE_LENGTH: usize = 255;

/// Default maximum content length in characters (after trimming)
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 20_000;

/// Page size used when a list request omits `limit`
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page a single list request may ask for
pub const MAX_PAGE_SIZE: u32 = 100;

/// Maximum length of a client-supplied idempotency key
pub const MAX_IDEMPOTENCY_KEY_LENGTH: usize = 128;

/// Owner used when a caller does not identify itself
pub const DEFAULT_OWNER: &str = "default";

/// HTTP header carrying the owner id
pub const OWNER_HEADER: &str = "x-notespace-owner";

/// Maximum length of an owner id
pub const MAX_OWNER_LENGTH: usize = 128;

/// Validation errors for note access functions
///
/// Raised before any store access; every variant names the offending field
/// so it can be surfaced as a field-level message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Field '{field}' exceeds {max} characters")]
    TooLong { field: String, max: usize },

    #[error("Invalid note ID format: {0}")]
    InvalidId(String),

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("Page limit must be between 1 and {max}, got {limit}")]
    LimitOutOfRange { limit: u32, max: u32 },
}

impl ValidationError {
    /// Name of the request field this error refers to
    pub fn field(&self) -> &str {
        match self {
            ValidationError::MissingField(field) => field,
            ValidationError::TooLong { field, .. } => field,
            ValidationError::InvalidId(_) => "id",
            ValidationError::InvalidCursor(_) => "cursor",
            ValidationError::LimitOutOfRange { .. } => "limit",
        }
    }
}

/// Note identifier (UUID v4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(Uuid);

impl NoteId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a caller-supplied identifier
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| ValidationError::InvalidId(raw.to_string()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for NoteId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for NoteId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A persisted note.
///
/// # Fields
///
/// - `id`: Server-assigned unique identifier, never reused
/// - `title`: Trimmed, 1 to 255 characters
/// - `content`: Trimmed, at least one character
/// - `created_at`: Creation timestamp, the sort and pagination key
///
/// Notes are immutable once created; the only other lifecycle step is deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Validated insert payload handed to the note store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub idempotency_key: Option<String>,
}

/// Field limits enforced at the validation boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteLimits {
    pub max_title_length: usize,
    pub max_content_length: usize,
}

impl Default for NoteLimits {
    fn default() -> Self {
        Self {
            max_title_length: MAX_TITLE_LENGTH,
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
        }
    }
}

/// Create request
///
/// `idempotency_key` makes a repeated create (e.g. an automatic retry after a
/// dropped response) return the originally created note instead of a second row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteInput {
    // Missing fields read as empty so they fail validation like blank ones
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl CreateNoteInput {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            idempotency_key: None,
        }
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Trim and check every field, producing the payload for the store.
    ///
    /// Lengths are counted in characters, not bytes.
    pub fn validate(&self, limits: &NoteLimits) -> Result<NewNote, ValidationError> {
        let title = required_field("title", &self.title, limits.max_title_length)?;
        let content = required_field("content", &self.content, limits.max_content_length)?;

        let idempotency_key = match self.idempotency_key.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(key) if key.chars().count() > MAX_IDEMPOTENCY_KEY_LENGTH => {
                return Err(ValidationError::TooLong {
                    field: "idempotencyKey".to_string(),
                    max: MAX_IDEMPOTENCY_KEY_LENGTH,
                });
            }
            Some(key) => Some(key.to_string()),
        };

        Ok(NewNote {
            title,
            content,
            idempotency_key,
        })
    }
}

fn required_field(name: &str, raw: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(name.to_string()));
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: name.to_string(),
            max,
        });
    }
    Ok(trimmed.to_string())
}

/// List request: `cursor` is the `createdAt` of the last note already seen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotesQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl ListNotesQuery {
    pub fn first_page(limit: u32) -> Self {
        Self {
            cursor: None,
            limit: Some(limit),
        }
    }

    pub fn after(cursor: DateTime<Utc>, limit: u32) -> Self {
        Self {
            cursor: Some(cursor),
            limit: Some(limit),
        }
    }

    /// Effective page size, defaulting to 20 and bounded to [1, 100]
    pub fn resolved_limit(&self) -> Result<u32, ValidationError> {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(ValidationError::LimitOutOfRange {
                limit,
                max: MAX_PAGE_SIZE,
            });
        }
        Ok(limit)
    }
}

/// One page of the newest-first note list
///
/// `has_more` is computed by the server, so callers never have to infer the
/// end of the sequence from a short page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePage {
    pub notes: Vec<Note>,
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<DateTime<Utc>>,
}

impl NotePage {
    /// Build a page from a scan that asked for `limit + 1` rows.
    pub fn from_scan(mut notes: Vec<Note>, limit: u32) -> Self {
        let limit = limit as usize;
        let has_more = notes.len() > limit;
        notes.truncate(limit);

        let next_cursor = if has_more {
            notes.last().map(|note| note.created_at)
        } else {
            None
        };

        Self {
            notes,
            has_more,
            next_cursor,
        }
    }
}

/// Delete response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteConfirmation {
    pub id: NoteId,
    pub deleted: bool,
}
