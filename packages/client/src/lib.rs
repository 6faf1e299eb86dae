//! NoteSpace Client
//!
//! Client side of NoteSpace: talks to the note server, mirrors the note list
//! in a paginated cache and applies creates and deletes optimistically.
//!
//! # Modules
//!
//! - [`transport`] - `NoteApi` trait and its HTTP implementation
//! - [`retry`] - Exponential backoff decorator for any `NoteApi`
//! - [`cache`] - Paginated in-memory mirror of the note list
//! - [`controller`] - Snapshot, speculative apply, commit or rollback
//! - [`presentation`] - Text table rendering and the note list view
//! - [`config`] - Client settings and wiring
//!
//! # Example
//!
//! ```rust,no_run
//! use notespace_client::{ClientConfig, NoteListView};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), notespace_client::ClientError> {
//! let config = ClientConfig::default();
//! let controller = Arc::new(config.build_controller()?);
//! let view = NoteListView::new(controller, config.date_format);
//!
//! view.load().await?;
//! view.create("Groceries", "milk, eggs").await?;
//! println!("{}", view.render().await);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod presentation;
pub mod retry;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use cache::{FetchOutcome, NoteCache, PagedNotes};
pub use config::ClientConfig;
pub use controller::{
    MutationAttempt, MutationEvent, MutationKind, MutationPhase, MutationState,
    OptimisticController,
};
pub use error::ClientError;
pub use presentation::{render_table, Notification, NotificationLevel, NoteListView};
pub use retry::{RetryPolicy, RetryingApi};
pub use transport::{HttpNoteApi, NoteApi};
