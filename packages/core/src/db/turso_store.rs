//! TursoStore - NoteStore Implementation for Turso/libsql Backend
//!
//! TursoStore wraps `DatabaseService` and delegates the SQL to its `db_*`
//! methods. On top of that it:
//!
//! 1. **Assigns identity**: fresh UUID v4 ids and strictly increasing
//!    `created_at` values from a [`MonotonicClock`]
//! 2. **Converts rows**: `NoteRecord` → `Note`
//! 3. **Deduplicates creates**: a repeated idempotency key returns the
//!    original note
//!
//! # Examples
//!
//! ```rust,no_run
//! use notespace_core::db::{DatabaseService, NoteStore, TursoStore};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/test.db")).await?);
//!     let store: Arc<dyn NoteStore> = Arc::new(TursoStore::new(db).await?);
//!
//!     let first_page = store.scan_page("default", None, 20).await?;
//!     println!("{} notes", first_page.len());
//!     Ok(())
//! }
//! ```

use crate::db::database::{DatabaseService, DbInsertNoteParams, NoteRecord};
use crate::db::error::DatabaseError;
use crate::db::note_store::{InsertResult, NoteStore};
use crate::models::time::{MonotonicClock, SystemTimeProvider, TimeProvider};
use crate::models::{NewNote, Note, NoteId};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;

/// Render a timestamp in the fixed-width storage format
///
/// Always six fractional digits and a `Z` suffix, so lexical order of the
/// stored text equals chronological order.
pub fn format_timestamp_for_storage(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored `created_at` value
pub fn parse_stored_timestamp(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            DatabaseError::corrupt_row(format!("Unable to parse timestamp '{}' as RFC3339", s))
        })
}

/// Round a cursor up to the next whole microsecond
///
/// Stored values are microsecond-precise, so every row strictly before the
/// original cursor is also strictly before the rounded one.
fn ceil_to_micros(ts: DateTime<Utc>) -> DateTime<Utc> {
    let sub_micro = ts.timestamp_subsec_nanos() % 1_000;
    if sub_micro == 0 {
        ts
    } else {
        ts + chrono::Duration::nanoseconds(i64::from(1_000 - sub_micro))
    }
}

/// TursoStore implements NoteStore for the libsql backend
pub struct TursoStore {
    db: Arc<DatabaseService>,
    clock: MonotonicClock,
}

impl TursoStore {
    /// Create a store on the system clock
    ///
    /// The clock is seeded with the newest persisted `created_at`, so
    /// timestamps keep increasing across restarts even if the wall clock
    /// moved backwards in between.
    pub async fn new(db: Arc<DatabaseService>) -> Result<Self, DatabaseError> {
        Self::with_time_provider(db, Arc::new(SystemTimeProvider)).await
    }

    /// Create a store driven by a custom time source
    pub async fn with_time_provider(
        db: Arc<DatabaseService>,
        provider: Arc<dyn TimeProvider>,
    ) -> Result<Self, DatabaseError> {
        let store = Self {
            db,
            clock: MonotonicClock::new(provider),
        };

        if let Some(latest) = store.latest_created_at().await? {
            store.clock.seed(latest);
        }

        Ok(store)
    }

    fn record_to_note(record: NoteRecord) -> Result<Note, DatabaseError> {
        let id = NoteId::parse(&record.id).map_err(|_| {
            DatabaseError::corrupt_row(format!("Stored note id '{}' is not a UUID", record.id))
        })?;
        let created_at = parse_stored_timestamp(&record.created_at)?;

        Ok(Note {
            id,
            title: record.title,
            content: record.content,
            created_at,
        })
    }

    async fn find_by_idempotency_key(
        &self,
        owner_id: &str,
        key: &str,
    ) -> Result<Option<Note>, DatabaseError> {
        self.db
            .db_find_by_idempotency_key(owner_id, key)
            .await?
            .map(Self::record_to_note)
            .transpose()
    }
}

#[async_trait]
impl NoteStore for TursoStore {
    async fn insert_note(
        &self,
        owner_id: &str,
        note: NewNote,
    ) -> Result<InsertResult, DatabaseError> {
        if let Some(key) = note.idempotency_key.as_deref() {
            if let Some(existing) = self.find_by_idempotency_key(owner_id, key).await? {
                tracing::debug!(owner_id, id = %existing.id, "Idempotent create replayed");
                return Ok(InsertResult {
                    note: existing,
                    created: false,
                });
            }
        }

        let id = NoteId::new();
        let created_at = self.clock.next();
        let id_str = id.to_string();
        let created_at_str = format_timestamp_for_storage(&created_at);

        let result = self
            .db
            .db_insert_note(DbInsertNoteParams {
                id: &id_str,
                owner_id,
                title: &note.title,
                content: &note.content,
                created_at: &created_at_str,
                idempotency_key: note.idempotency_key.as_deref(),
            })
            .await;

        match result {
            Ok(()) => Ok(InsertResult {
                note: Note {
                    id,
                    title: note.title,
                    content: note.content,
                    created_at,
                },
                created: true,
            }),
            // A concurrent request with the same key won the insert race
            Err(err) if err.is_constraint_violation() => {
                if let Some(key) = note.idempotency_key.as_deref() {
                    if let Some(existing) = self.find_by_idempotency_key(owner_id, key).await? {
                        return Ok(InsertResult {
                            note: existing,
                            created: false,
                        });
                    }
                }
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    async fn get_note(&self, owner_id: &str, id: &NoteId) -> Result<Option<Note>, DatabaseError> {
        self.db
            .db_get_note(owner_id, &id.to_string())
            .await?
            .map(Self::record_to_note)
            .transpose()
    }

    async fn delete_note(
        &self,
        owner_id: &str,
        id: &NoteId,
    ) -> Result<Option<Note>, DatabaseError> {
        self.db
            .db_delete_note(owner_id, &id.to_string())
            .await?
            .map(Self::record_to_note)
            .transpose()
    }

    async fn scan_page(
        &self,
        owner_id: &str,
        cursor: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<Note>, DatabaseError> {
        let cursor_str = cursor.map(|c| format_timestamp_for_storage(&ceil_to_micros(c)));

        self.db
            .db_scan_notes(owner_id, cursor_str.as_deref(), i64::from(limit))
            .await?
            .into_iter()
            .map(Self::record_to_note)
            .collect()
    }

    async fn latest_created_at(&self) -> Result<Option<DateTime<Utc>>, DatabaseError> {
        self.db
            .db_latest_created_at()
            .await?
            .as_deref()
            .map(parse_stored_timestamp)
            .transpose()
    }
}
