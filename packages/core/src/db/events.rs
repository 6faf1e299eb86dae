//! Domain Events
//!
//! Events emitted by `NoteService` after a mutation has been persisted.
//! Subscribers (server log forwarding, tests) receive them through a tokio
//! broadcast channel, so the store itself stays unaware of who is listening.
//!
//! # Event Flow
//!
//! 1. `NoteService` persists a create or delete
//! 2. The matching `DomainEvent` is sent on the broadcast channel
//! 3. Every subscriber receives its own copy

use crate::models::{Note, NoteId};
use serde::{Deserialize, Serialize};

/// Domain events emitted by NoteService
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DomainEvent {
    /// A new note was persisted (idempotent replays do not emit)
    #[serde(rename_all = "camelCase")]
    NoteCreated { owner_id: String, note: Note },

    /// A note was removed
    #[serde(rename_all = "camelCase")]
    NoteDeleted { owner_id: String, id: NoteId },
}

impl DomainEvent {
    /// Stable event name, used as the log/wire discriminator
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::NoteCreated { .. } => "noteCreated",
            DomainEvent::NoteDeleted { .. } => "noteDeleted",
        }
    }

    pub fn owner_id(&self) -> &str {
        match self {
            DomainEvent::NoteCreated { owner_id, .. } | DomainEvent::NoteDeleted { owner_id, .. } => {
                owner_id
            }
        }
    }
}
