//! Note API transport
//!
//! [`NoteApi`] is the seam between the client logic and the network. The
//! cache and the optimistic controller only ever call this trait, so tests
//! can substitute an in-memory implementation and production code can stack
//! decorators such as [`crate::retry::RetryingApi`].

use async_trait::async_trait;
use chrono::SecondsFormat;
use notespace_core::models::{
    CreateNoteInput, DeleteConfirmation, ListNotesQuery, Note, NoteId, NotePage, OWNER_HEADER,
};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ClientError;

/// The four note access functions, as seen from the client
#[async_trait]
pub trait NoteApi: Send + Sync {
    async fn list(&self, query: &ListNotesQuery) -> Result<NotePage, ClientError>;

    async fn get(&self, id: &NoteId) -> Result<Note, ClientError>;

    async fn create(&self, input: &CreateNoteInput) -> Result<Note, ClientError>;

    async fn delete(&self, id: &NoteId) -> Result<DeleteConfirmation, ClientError>;
}

#[async_trait]
impl<T: NoteApi + ?Sized> NoteApi for Arc<T> {
    async fn list(&self, query: &ListNotesQuery) -> Result<NotePage, ClientError> {
        (**self).list(query).await
    }

    async fn get(&self, id: &NoteId) -> Result<Note, ClientError> {
        (**self).get(id).await
    }

    async fn create(&self, input: &CreateNoteInput) -> Result<Note, ClientError> {
        (**self).create(input).await
    }

    async fn delete(&self, id: &NoteId) -> Result<DeleteConfirmation, ClientError> {
        (**self).delete(id).await
    }
}

/// Error body returned by the server
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    code: String,
    #[serde(default)]
    details: Option<String>,
}

/// `NoteApi` over HTTP
#[derive(Debug, Clone)]
pub struct HttpNoteApi {
    client: reqwest::Client,
    base_url: String,
    owner: String,
}

impl HttpNoteApi {
    /// Create a client for the server at `base_url` acting as `owner`
    pub fn new(
        base_url: impl Into<String>,
        owner: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            owner: owner.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_owner(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(OWNER_HEADER, &self.owner)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = self.with_owner(request).send().await?;
        let status = response.status();

        if status.is_success() {
            return response.json::<T>().await.map_err(ClientError::from);
        }

        Err(error_from_response(status, response).await)
    }
}

/// Map an error status (and its JSON body, when present) to a `ClientError`
async fn error_from_response(status: StatusCode, response: Response) -> ClientError {
    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<ErrorBody>(&text).ok();
    let message = match &body {
        Some(body) => body.message.clone(),
        None if text.is_empty() => status.to_string(),
        None => text,
    };

    match status {
        StatusCode::BAD_REQUEST => ClientError::Validation {
            message,
            field: body.and_then(|b| b.details),
        },
        StatusCode::NOT_FOUND => ClientError::NotFound { message },
        _ => ClientError::Server {
            status: status.as_u16(),
            code: body.map(|b| b.code),
            message,
        },
    }
}

#[async_trait]
impl NoteApi for HttpNoteApi {
    async fn list(&self, query: &ListNotesQuery) -> Result<NotePage, ClientError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(cursor) = query.cursor {
            params.push(("cursor", cursor.to_rfc3339_opts(SecondsFormat::Micros, true)));
        }

        let request = self.client.get(self.url("/api/notes")).query(&params);
        self.send(request).await
    }

    async fn get(&self, id: &NoteId) -> Result<Note, ClientError> {
        let request = self.client.get(self.url(&format!("/api/notes/{}", id)));
        self.send(request).await
    }

    async fn create(&self, input: &CreateNoteInput) -> Result<Note, ClientError> {
        let request = self.client.post(self.url("/api/notes")).json(input);
        self.send(request).await
    }

    async fn delete(&self, id: &NoteId) -> Result<DeleteConfirmation, ClientError> {
        let request = self.client.delete(self.url(&format!("/api/notes/{}", id)));
        self.send(request).await
    }
}
