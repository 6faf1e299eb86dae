//! Data Models
//!
//! This module contains the data structures shared by the server and the
//! client:
//!
//! - `Note` - The only persisted entity
//! - `NotePage` / `ListNotesQuery` - Cursor pagination request and response
//! - `CreateNoteInput` - Create request with field validation
//! - `time` - Clock abstraction used for `created_at` assignment

mod note;
pub mod time;

pub use note::{
    CreateNoteInput, DeleteConfirmation, ListNotesQuery, NewNote, Note, NoteId, NoteLimits,
    NotePage, ValidationError, DEFAULT_MAX_CONTENT_LENGTH, DEFAULT_OWNER, DEFAULT_PAGE_SIZE,
    MAX_IDEMPOTENCY_KEY_LENGTH, MAX_OWNER_LENGTH, MAX_PAGE_SIZE, MAX_TITLE_LENGTH, OWNER_HEADER,
};
