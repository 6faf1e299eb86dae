//! Note endpoints
//!
//! Thin HTTP adapters over `NoteService`. Input parsing failures are reported
//! with the same `VALIDATION_ERROR` body as service-level validation.
//!
//! # Endpoints
//!
//! - `GET /api/health` - Health check endpoint
//! - `GET /api/notes?cursor=&limit=` - One page of notes, newest first
//! - `GET /api/notes/:id` - Get a note by ID
//! - `POST /api/notes` - Create a note
//! - `DELETE /api/notes/:id` - Delete a note
//!
//! Every note route reads the owner from the `x-notespace-owner` header.

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequestParts, Path, Query, State,
    },
    http::{request::Parts, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::http_error::VALIDATION_ERROR;
use crate::{AppState, HttpError};
use notespace_core::models::{
    CreateNoteInput, DeleteConfirmation, ListNotesQuery, Note, NotePage, ValidationError,
    DEFAULT_OWNER, MAX_OWNER_LENGTH, OWNER_HEADER,
};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

/// Owner id taken from the request header
///
/// A missing or blank header selects the default owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(OWNER_HEADER) else {
            return Ok(Owner(DEFAULT_OWNER.to_string()));
        };

        let owner = value
            .to_str()
            .map_err(|_| {
                HttpError::with_details(
                    "Owner header must be visible ASCII",
                    VALIDATION_ERROR,
                    OWNER_HEADER,
                )
            })?
            .trim();

        if owner.is_empty() {
            return Ok(Owner(DEFAULT_OWNER.to_string()));
        }
        if owner.chars().count() > MAX_OWNER_LENGTH {
            return Err(HttpError::with_details(
                format!("Owner exceeds {} characters", MAX_OWNER_LENGTH),
                VALIDATION_ERROR,
                OWNER_HEADER,
            ));
        }

        Ok(Owner(owner.to_string()))
    }
}

/// Raw list query string; parsed by hand so bad values get a JSON error body
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    cursor: Option<String>,
    limit: Option<String>,
}

impl ListParams {
    fn into_query(self) -> Result<ListNotesQuery, HttpError> {
        let cursor = match self.cursor.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|_| ValidationError::InvalidCursor(raw.to_string()))?,
            ),
        };

        let limit = match self.limit.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<u32>().map_err(|_| {
                HttpError::with_details(
                    format!("Page limit must be a positive integer, got '{}'", raw),
                    VALIDATION_ERROR,
                    "limit",
                )
            })?),
        };

        Ok(ListNotesQuery { cursor, limit })
    }
}

/// Health check endpoint
///
/// ```bash
/// curl http://localhost:3001/api/health
/// ```
async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// List one page of notes
///
/// ```bash
/// curl "http://localhost:3001/api/notes?limit=20"
/// curl "http://localhost:3001/api/notes?limit=20&cursor=2025-01-03T09:00:00.000000Z"
/// ```
async fn list_notes(
    State(state): State<AppState>,
    owner: Owner,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<NotePage>, HttpError> {
    let Query(params) = params.map_err(|rejection| {
        HttpError::with_details(rejection.body_text(), VALIDATION_ERROR, "query")
    })?;
    let query = params.into_query()?;

    let page = state.note_service.list_notes(&owner.0, &query).await?;
    Ok(Json(page))
}

/// Get a note by ID
async fn get_note(
    State(state): State<AppState>,
    owner: Owner,
    Path(id): Path<String>,
) -> Result<Json<Note>, HttpError> {
    let note = state.note_service.get_note(&owner.0, &id).await?;
    Ok(Json(note))
}

/// Create a note
///
/// ```bash
/// curl -X POST http://localhost:3001/api/notes \
///   -H "Content-Type: application/json" \
///   -d '{"title": "Groceries", "content": "milk, eggs"}'
/// ```
async fn create_note(
    State(state): State<AppState>,
    owner: Owner,
    body: Result<Json<CreateNoteInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Note>), HttpError> {
    let Json(input) = body?;

    let note = state.note_service.create_note(&owner.0, input).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// Delete a note
async fn delete_note(
    State(state): State<AppState>,
    owner: Owner,
    Path(id): Path<String>,
) -> Result<Json<DeleteConfirmation>, HttpError> {
    let confirmation = state.note_service.delete_note(&owner.0, &id).await?;
    Ok(Json(confirmation))
}

/// Create router with note endpoints
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/notes", get(list_notes).post(create_note))
        .route("/api/notes/:id", get(get_note).delete(delete_note))
        .with_state(state)
}
