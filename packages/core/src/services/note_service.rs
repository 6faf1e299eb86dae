//! Note Service - Note Access Functions
//!
//! This module provides the four remote-callable operations on notes:
//!
//! - `list_notes` - newest-first, cursor-paginated listing
//! - `get_note` - point lookup by id
//! - `create_note` - validated insert, optionally idempotent
//! - `delete_note` - hard delete
//!
//! Every operation validates its input before the store is touched, so a
//! client that skips its own form checks still cannot insert bad rows.
//! All operations are scoped to an owner id.

use crate::db::events::DomainEvent;
use crate::db::NoteStore;
use crate::models::{
    CreateNoteInput, DeleteConfirmation, ListNotesQuery, Note, NoteId, NoteLimits, NotePage,
};
use crate::services::error::NoteServiceError;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Broadcast channel capacity for domain events.
///
/// Slow subscribers lag and skip events rather than block mutations.
const DOMAIN_EVENT_CHANNEL_CAPACITY: usize = 128;

/// Note access functions over a [`NoteStore`]
///
/// Cheap to clone; clones share the store and the event channel.
///
/// # Examples
///
/// ```no_run
/// # use notespace_core::db::{DatabaseService, TursoStore};
/// # use notespace_core::services::NoteService;
/// # use notespace_core::models::{CreateNoteInput, ListNotesQuery};
/// # use std::path::PathBuf;
/// # use std::sync::Arc;
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let db = Arc::new(DatabaseService::new(PathBuf::from("./notes.db")).await?);
/// let service = NoteService::new(Arc::new(TursoStore::new(db).await?));
///
/// let note = service
///     .create_note("default", CreateNoteInput::new("Groceries", "milk"))
///     .await?;
/// let page = service.list_notes("default", &ListNotesQuery::default()).await?;
/// assert_eq!(page.notes[0].id, note.id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn NoteStore>,
    limits: NoteLimits,
    event_tx: broadcast::Sender<DomainEvent>,
}

impl NoteService {
    /// Create a service with the default field limits
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self::with_limits(store, NoteLimits::default())
    }

    /// Create a service with custom field limits (e.g. a configured content bound)
    pub fn with_limits(store: Arc<dyn NoteStore>, limits: NoteLimits) -> Self {
        let (event_tx, _) = broadcast::channel(DOMAIN_EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            limits,
            event_tx,
        }
    }

    pub fn limits(&self) -> &NoteLimits {
        &self.limits
    }

    /// Subscribe to domain events
    ///
    /// Each subscriber receives every `NoteCreated`/`NoteDeleted` emitted
    /// after it subscribed.
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<DomainEvent> {
        self.event_tx.subscribe()
    }

    /// Ignores send errors; having no subscribers is normal.
    fn emit_event(&self, event: DomainEvent) {
        let _ = self.event_tx.send(event);
    }

    /// List one page of notes, newest first
    ///
    /// Fetches `limit + 1` rows so `has_more` is exact: it is false when the
    /// remaining rows fit this page, including when they fill it exactly.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if `limit` is outside `[1, 100]`
    /// - `DatabaseError` if the scan fails
    pub async fn list_notes(
        &self,
        owner_id: &str,
        query: &ListNotesQuery,
    ) -> Result<NotePage, NoteServiceError> {
        let limit = query.resolved_limit()?;

        let rows = self
            .store
            .scan_page(owner_id, query.cursor, limit + 1)
            .await?;
        let page = NotePage::from_scan(rows, limit);

        tracing::debug!(
            owner_id,
            cursor = ?query.cursor,
            limit,
            returned = page.notes.len(),
            has_more = page.has_more,
            "Listed notes"
        );
        Ok(page)
    }

    /// Get a note by id
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if `id` is not a UUID
    /// - `NoteNotFound` if no such note exists for this owner
    pub async fn get_note(&self, owner_id: &str, id: &str) -> Result<Note, NoteServiceError> {
        let note_id = NoteId::parse(id)?;

        self.store
            .get_note(owner_id, &note_id)
            .await?
            .ok_or_else(|| NoteServiceError::note_not_found(note_id.to_string()))
    }

    /// Create a note
    ///
    /// Title and content are trimmed before storage. When the input carries an
    /// idempotency key that was already used by this owner, the original note
    /// is returned and no event is emitted.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` for an empty or oversized field (nothing is inserted)
    /// - `DatabaseError` if the insert fails
    pub async fn create_note(
        &self,
        owner_id: &str,
        input: CreateNoteInput,
    ) -> Result<Note, NoteServiceError> {
        let new_note = match input.validate(&self.limits) {
            Ok(new_note) => new_note,
            Err(e) => {
                tracing::debug!(owner_id, field = e.field(), "Rejected note create: {}", e);
                return Err(e.into());
            }
        };

        let inserted = self.store.insert_note(owner_id, new_note).await?;

        if inserted.created {
            tracing::info!(owner_id, id = %inserted.note.id, "Created note");
            self.emit_event(DomainEvent::NoteCreated {
                owner_id: owner_id.to_string(),
                note: inserted.note.clone(),
            });
        } else {
            tracing::info!(owner_id, id = %inserted.note.id, "Replayed idempotent create");
        }

        Ok(inserted.note)
    }

    /// Delete a note
    ///
    /// A second delete of the same id reports `NoteNotFound`.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if `id` is not a UUID
    /// - `NoteNotFound` if no such note exists for this owner
    pub async fn delete_note(
        &self,
        owner_id: &str,
        id: &str,
    ) -> Result<DeleteConfirmation, NoteServiceError> {
        let note_id = NoteId::parse(id)?;

        match self.store.delete_note(owner_id, &note_id).await? {
            Some(deleted) => {
                tracing::info!(owner_id, id = %deleted.id, "Deleted note");
                self.emit_event(DomainEvent::NoteDeleted {
                    owner_id: owner_id.to_string(),
                    id: deleted.id,
                });
                Ok(DeleteConfirmation {
                    id: deleted.id,
                    deleted: true,
                })
            }
            None => Err(NoteServiceError::note_not_found(note_id.to_string())),
        }
    }
}

impl std::fmt::Debug for NoteService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteService")
            .field("limits", &self.limits)
            .field("subscribers", &self.event_tx.receiver_count())
            .finish()
    }
}
