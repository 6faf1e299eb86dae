//! Optimistic Mutation Controller
//!
//! Wraps create and delete so the note list reflects a mutation before the
//! server has confirmed it:
//!
//! 1. Cancel any in-flight refetch so it cannot overwrite the edit
//! 2. Snapshot the cache
//! 3. Apply the speculative edit
//! 4. Call the server
//! 5. Reconcile with the server's answer, or restore the snapshot on failure
//!
//! Each attempt walks `Idle -> Pending -> Committed | RolledBack` and every
//! transition is broadcast as a [`MutationEvent`].

use notespace_core::models::time::{truncate_to_micros, SystemTimeProvider, TimeProvider};
use notespace_core::models::{CreateNoteInput, DeleteConfirmation, Note, NoteId, NoteLimits};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::cache::NoteCache;
use crate::error::ClientError;
use crate::transport::NoteApi;

/// Capacity of the mutation event channel
const MUTATION_EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Delete,
}

/// Lifecycle of one mutation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    Idle,
    Pending,
    Committed,
    RolledBack,
}

impl MutationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationState::Idle => "idle",
            MutationState::Pending => "pending",
            MutationState::Committed => "committed",
            MutationState::RolledBack => "rolled_back",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MutationState::Committed | MutationState::RolledBack)
    }

    /// Validate a state change; only `Idle -> Pending` and `Pending -> terminal` are legal
    pub fn transition(self, next: MutationState) -> Result<MutationState, ClientError> {
        match (self, next) {
            (MutationState::Idle, MutationState::Pending)
            | (MutationState::Pending, MutationState::Committed)
            | (MutationState::Pending, MutationState::RolledBack) => Ok(next),
            (from, to) => Err(ClientError::InvalidTransition {
                from: from.as_str(),
                to: to.as_str(),
            }),
        }
    }
}

/// One create or delete going through the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationAttempt {
    pub id: u64,
    pub kind: MutationKind,
    /// Placeholder id while pending, server id once a create commits
    pub note_id: Option<NoteId>,
    state: MutationState,
}

impl MutationAttempt {
    pub fn new(id: u64, kind: MutationKind, note_id: Option<NoteId>) -> Self {
        Self {
            id,
            kind,
            note_id,
            state: MutationState::Idle,
        }
    }

    pub fn state(&self) -> MutationState {
        self.state
    }

    pub fn advance(&mut self, next: MutationState) -> Result<(), ClientError> {
        self.state = self.state.transition(next)?;
        Ok(())
    }
}

/// What happened to an attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationPhase {
    /// Speculative edit applied, server call in flight
    Pending,
    Committed,
    RolledBack { error: ClientError },
    /// Input failed local validation; the cache was never touched
    Rejected { error: ClientError },
}

/// Broadcast on every attempt transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationEvent {
    pub attempt_id: u64,
    pub kind: MutationKind,
    pub note_id: Option<NoteId>,
    pub phase: MutationPhase,
}

/// Applies creates and deletes optimistically against a [`NoteCache`]
pub struct OptimisticController {
    api: Arc<dyn NoteApi>,
    cache: NoteCache,
    clock: Arc<dyn TimeProvider>,
    limits: NoteLimits,
    event_tx: broadcast::Sender<MutationEvent>,
    next_attempt: AtomicU64,
}

impl OptimisticController {
    pub fn new(api: Arc<dyn NoteApi>, cache: NoteCache) -> Self {
        Self::with_time_provider(api, cache, Arc::new(SystemTimeProvider))
    }

    /// Controller whose placeholder timestamps come from `clock`
    pub fn with_time_provider(
        api: Arc<dyn NoteApi>,
        cache: NoteCache,
        clock: Arc<dyn TimeProvider>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(MUTATION_EVENT_CHANNEL_CAPACITY);
        Self {
            api,
            cache,
            clock,
            limits: NoteLimits::default(),
            event_tx,
            next_attempt: AtomicU64::new(1),
        }
    }

    /// Override the local validation limits (keep in line with the server's)
    pub fn with_limits(mut self, limits: NoteLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn cache(&self) -> &NoteCache {
        &self.cache
    }

    pub fn api(&self) -> &Arc<dyn NoteApi> {
        &self.api
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MutationEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, attempt: &MutationAttempt, phase: MutationPhase) {
        let event = MutationEvent {
            attempt_id: attempt.id,
            kind: attempt.kind,
            note_id: attempt.note_id,
            phase,
        };
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    fn start_attempt(&self, kind: MutationKind, note_id: Option<NoteId>) -> MutationAttempt {
        let id = self.next_attempt.fetch_add(1, Ordering::Relaxed);
        MutationAttempt::new(id, kind, note_id)
    }

    /// Create a note, showing it in the cache before the server confirms it
    ///
    /// Returns the note as created by the server. On failure the cache is
    /// restored to exactly its state before the call.
    pub async fn create_note(&self, title: &str, content: &str) -> Result<Note, ClientError> {
        let new_note = match CreateNoteInput::new(title, content).validate(&self.limits) {
            Ok(new_note) => new_note,
            Err(e) => {
                let error = ClientError::from(e);
                let attempt = self.start_attempt(MutationKind::Create, None);
                tracing::debug!("Create rejected locally: {}", error);
                self.emit(
                    &attempt,
                    MutationPhase::Rejected {
                        error: error.clone(),
                    },
                );
                return Err(error);
            }
        };

        self.cache.cancel_refetch();
        let snapshot = self.cache.snapshot().await;

        let placeholder = Note {
            id: NoteId::new(),
            title: new_note.title,
            content: new_note.content,
            created_at: truncate_to_micros(self.clock.now()),
        };
        let mut attempt = self.start_attempt(MutationKind::Create, Some(placeholder.id));

        let page_size = self.cache.page_size() as usize;
        let speculative = placeholder.clone();
        self.cache
            .update(|data| data.insert_placeholder(speculative, page_size))
            .await;
        attempt.advance(MutationState::Pending)?;
        self.emit(&attempt, MutationPhase::Pending);

        // The placeholder id doubles as idempotency key so retries never duplicate
        let request = CreateNoteInput::new(placeholder.title.clone(), placeholder.content.clone())
            .with_idempotency_key(placeholder.id.to_string());

        match self.api.create(&request).await {
            Ok(note) => {
                let confirmed = note.clone();
                self.cache
                    .update(|data| data.confirm_placeholder(&placeholder.id, confirmed))
                    .await;
                attempt.advance(MutationState::Committed)?;
                attempt.note_id = Some(note.id);
                tracing::info!(placeholder_id = %placeholder.id, note_id = %note.id, "Note created");
                self.emit(&attempt, MutationPhase::Committed);
                Ok(note)
            }
            Err(error) => {
                self.cache.restore(snapshot).await;
                attempt.advance(MutationState::RolledBack)?;
                tracing::warn!(placeholder_id = %placeholder.id, "Create rolled back: {}", error);
                self.emit(
                    &attempt,
                    MutationPhase::RolledBack {
                        error: error.clone(),
                    },
                );
                Err(error)
            }
        }
    }

    /// Delete a note, hiding it from the cache before the server confirms it
    pub async fn delete_note(&self, id: &NoteId) -> Result<DeleteConfirmation, ClientError> {
        self.cache.cancel_refetch();
        let snapshot = self.cache.snapshot().await;

        let mut attempt = self.start_attempt(MutationKind::Delete, Some(*id));
        self.cache.update(|data| data.remove(id)).await;
        attempt.advance(MutationState::Pending)?;
        self.emit(&attempt, MutationPhase::Pending);

        match self.api.delete(id).await {
            Ok(confirmation) => {
                attempt.advance(MutationState::Committed)?;
                tracing::info!(note_id = %id, "Note deleted");
                self.emit(&attempt, MutationPhase::Committed);
                Ok(confirmation)
            }
            Err(error) => {
                self.cache.restore(snapshot).await;
                attempt.advance(MutationState::RolledBack)?;
                tracing::warn!(note_id = %id, "Delete rolled back: {}", error);
                self.emit(
                    &attempt,
                    MutationPhase::RolledBack {
                        error: error.clone(),
                    },
                );
                Err(error)
            }
        }
    }
}

impl std::fmt::Debug for OptimisticController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimisticController")
            .field("cache", &self.cache)
            .field("limits", &self.limits)
            .field("subscribers", &self.event_tx.receiver_count())
            .finish()
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;
