//! Business Services
//!
//! - `NoteService` - the note access functions (list, get, create, delete)
//!
//! Services sit between the database layer and the transports, enforcing
//! validation and emitting domain events.

pub mod error;
pub mod note_service;

pub use error::NoteServiceError;
pub use note_service::NoteService;
