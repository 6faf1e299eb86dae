//! NoteSpace Core
//!
//! This crate provides the note model, the libsql-backed note store and the
//! note access functions for the NoteSpace note-taking service.
//!
//! # Architecture
//!
//! - **Single table**: Notes live in one `notes` table scoped by `owner_id`
//! - **Cursor pagination**: Lists are ordered newest-first and paged by `created_at`
//! - **libsql/Turso**: Embedded SQLite-compatible database
//! - **Immutable notes**: Notes are created and deleted, never updated
//!
//! # Modules
//!
//! - [`models`] - Wire and domain types (Note, NotePage, validation)
//! - [`utils`] - Shared helpers (timestamp formatting)
//! - [`db`] - Database layer with libsql integration (feature `store`)
//! - [`services`] - Note access functions (feature `store`)

pub mod models;
pub mod utils;

#[cfg(feature = "store")]
pub mod db;
#[cfg(feature = "store")]
pub mod services;

// Re-export commonly used types
pub use models::*;
#[cfg(feature = "store")]
pub use services::*;
