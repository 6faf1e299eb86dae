//! Database Layer
//!
//! This module handles all database interactions using libsql:
//!
//! - Database initialization and connection management (`DatabaseService`)
//! - The `NoteStore` abstraction consumed by the access functions
//! - `TursoStore`, the libsql implementation of `NoteStore`
//! - Domain events emitted after successful mutations
//!
//! # Architecture
//!
//! `DatabaseService` owns the SQL and returns raw `NoteRecord`s. `TursoStore`
//! converts records into `Note`s, assigns identifiers and timestamps, and
//! handles idempotent inserts.

mod database;
mod error;
pub mod events;
mod note_store;
mod turso_store;

pub use database::{DatabaseService, DbInsertNoteParams, NoteRecord};
pub use error::DatabaseError;
pub use events::DomainEvent;
pub use note_store::{InsertResult, NoteStore};
pub use turso_store::{format_timestamp_for_storage, parse_stored_timestamp, TursoStore};
