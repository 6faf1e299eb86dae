//! Terminal presentation of the note list
//!
//! [`render_table`] is a pure function of the cache contents, so it can be
//! called again at any moment (for instance while a mutation is pending) and
//! always reflects the latest speculative state. [`NoteListView`] binds it to
//! a cache and controller and turns mutation events into notifications.

use notespace_core::models::{DeleteConfirmation, Note, NoteId};
use notespace_core::utils::{format_timestamp, DateFormatOptions};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::cache::{FetchOutcome, NoteCache, PagedNotes};
use crate::controller::{MutationEvent, MutationKind, MutationPhase, OptimisticController};
use crate::error::ClientError;

const TITLE_WIDTH: usize = 32;
const CONTENT_WIDTH: usize = 48;
const ELLIPSIS: char = '…';

/// First line of `text`, cut to `max` characters
fn preview(text: &str, max: usize) -> String {
    let mut lines = text.lines();
    let first = lines.next().unwrap_or_default();
    let continues = lines.next().is_some();
    let count = first.chars().count();

    if count <= max && !continues {
        return first.to_string();
    }

    let mut cut: String = first.chars().take(count.min(max.saturating_sub(1))).collect();
    cut.push(ELLIPSIS);
    cut
}

/// Render loaded notes as a text table
///
/// Pending placeholders are marked with `*`. `None` means nothing has been
/// loaded yet.
pub fn render_table(data: Option<&PagedNotes>, format: &DateFormatOptions) -> String {
    let Some(data) = data else {
        return "Loading notes…\n".to_string();
    };
    if data.is_empty() {
        return "No notes yet.\n".to_string();
    }

    let rows: Vec<(bool, String, String, String)> = data
        .notes()
        .map(|note| {
            (
                data.is_pending(&note.id),
                preview(&note.title, TITLE_WIDTH),
                format_timestamp(note.created_at, format),
                preview(&note.content, CONTENT_WIDTH),
            )
        })
        .collect();

    let title_width = rows
        .iter()
        .map(|(_, title, _, _)| title.chars().count())
        .max()
        .unwrap_or(0)
        .max("TITLE".len());
    let created_width = rows
        .iter()
        .map(|(_, _, created, _)| created.chars().count())
        .max()
        .unwrap_or(0)
        .max("CREATED".len());

    let mut out = format!(
        "  {:<title_width$}  {:<created_width$}  CONTENT\n",
        "TITLE", "CREATED"
    );
    for (pending, title, created, content) in rows {
        let marker = if pending { '*' } else { ' ' };
        out.push_str(
            format!("{marker} {title:<title_width$}  {created:<created_width$}  {content}")
                .trim_end(),
        );
        out.push('\n');
    }

    if data.has_more() {
        out.push_str("(more available…)\n");
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Transient message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    /// Notification for a mutation event, if it warrants one
    pub fn from_event(event: &MutationEvent) -> Option<Self> {
        let noun = match event.kind {
            MutationKind::Create => "create",
            MutationKind::Delete => "delete",
        };
        match &event.phase {
            MutationPhase::Pending => None,
            MutationPhase::Committed => Some(Notification::info(match event.kind {
                MutationKind::Create => "Note created",
                MutationKind::Delete => "Note deleted",
            })),
            MutationPhase::RolledBack { error } => Some(Notification::error(format!(
                "Could not {} note: {}",
                noun, error
            ))),
            MutationPhase::Rejected { error } => Some(Notification::error(error.to_string())),
        }
    }
}

/// Note list screen: table, pagination and mutations
pub struct NoteListView {
    controller: Arc<OptimisticController>,
    format: DateFormatOptions,
    events: broadcast::Receiver<MutationEvent>,
}

impl NoteListView {
    pub fn new(controller: Arc<OptimisticController>, format: DateFormatOptions) -> Self {
        let events = controller.subscribe();
        Self {
            controller,
            format,
            events,
        }
    }

    fn cache(&self) -> &NoteCache {
        self.controller.cache()
    }

    /// Load the first page if nothing is cached yet
    pub async fn load(&self) -> Result<FetchOutcome, ClientError> {
        if self.cache().is_loaded().await {
            return Ok(FetchOutcome::Applied);
        }
        self.cache()
            .fetch_first_page(self.controller.api().as_ref())
            .await
    }

    pub async fn load_more(&self) -> Result<FetchOutcome, ClientError> {
        self.cache()
            .fetch_next_page(self.controller.api().as_ref())
            .await
    }

    pub async fn has_more(&self) -> bool {
        self.cache()
            .data()
            .await
            .map_or(false, |data| data.has_more())
    }

    pub async fn render(&self) -> String {
        render_table(self.cache().data().await.as_ref(), &self.format)
    }

    pub async fn create(&self, title: &str, content: &str) -> Result<Note, ClientError> {
        self.controller.create_note(title, content).await
    }

    pub async fn delete(&self, id: &NoteId) -> Result<DeleteConfirmation, ClientError> {
        self.controller.delete_note(id).await
    }

    /// Notifications raised since the last call
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        let mut notifications = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => notifications.extend(Notification::from_event(&event)),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!("Dropped {} mutation events", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        notifications
    }
}
