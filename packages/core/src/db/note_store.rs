//! NoteStore Trait - Database Abstraction Layer
//!
//! This module defines the `NoteStore` trait consumed by `NoteService`. The
//! access functions only ever talk to this trait, so tests can swap in a
//! store backed by a temporary database file.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async
//! 2. **Owner scoping**: Every method takes the owner id; no call can see or
//!    touch another owner's notes
//! 3. **Typed errors**: Methods return `DatabaseError` so constraint failures
//!    stay distinguishable from infrastructure failures
//!
//! # Examples
//!
//! ```rust,no_run
//! use notespace_core::db::{DatabaseService, NoteStore, TursoStore};
//! use notespace_core::models::NewNote;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./notes.db")).await?);
//!     let store: Arc<dyn NoteStore> = Arc::new(TursoStore::new(db).await?);
//!
//!     let inserted = store
//!         .insert_note(
//!             "default",
//!             NewNote {
//!                 title: "Groceries".to_string(),
//!                 content: "milk".to_string(),
//!                 idempotency_key: None,
//!             },
//!         )
//!         .await?;
//!     assert!(inserted.created);
//!     Ok(())
//! }
//! ```

use crate::db::error::DatabaseError;
use crate::models::{NewNote, Note, NoteId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Outcome of an insert
///
/// `created` is false when the idempotency key matched an existing note; in
/// that case `note` is the note created by the earlier request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertResult {
    pub note: Note,
    pub created: bool,
}

/// Abstraction layer for note persistence
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a single store can be shared by
/// every request handler.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Persist a validated note, assigning its id and `created_at`
    ///
    /// `created_at` must be strictly greater than that of any note previously
    /// inserted through this store.
    async fn insert_note(&self, owner_id: &str, note: NewNote)
        -> Result<InsertResult, DatabaseError>;

    /// Point lookup; `Ok(None)` when the note does not exist for this owner
    async fn get_note(&self, owner_id: &str, id: &NoteId) -> Result<Option<Note>, DatabaseError>;

    /// Remove a note, returning it; `Ok(None)` when nothing matched
    async fn delete_note(
        &self,
        owner_id: &str,
        id: &NoteId,
    ) -> Result<Option<Note>, DatabaseError>;

    /// Newest-first scan of up to `limit` notes created strictly before `cursor`
    async fn scan_page(
        &self,
        owner_id: &str,
        cursor: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<Note>, DatabaseError>;

    /// Newest `created_at` in the store, if any note exists
    async fn latest_created_at(&self) -> Result<Option<DateTime<Utc>>, DatabaseError>;
}
