//! Automatic retry with exponential backoff
//!
//! [`RetryingApi`] wraps any [`NoteApi`] and repeats calls that failed for
//! reasons unrelated to the request itself (transport errors, 5xx).
//!
//! # Retry Behavior
//!
//! - **Retry on**: `ClientError::Transport` and 5xx `ClientError::Server`
//! - **Backoff**: `base_delay * 2^attempt`, capped at `max_delay`
//! - **Other errors**: Fail immediately without retry
//!
//! Creates are safe to repeat only because the optimistic controller sends
//! an idempotency key with each one. A delete that answers `NotFound` on a
//! repeat is reported as success: the earlier attempt removed the note but
//! its response was lost.
//!
//! # Example
//!
//! ```rust,no_run
//! use notespace_client::retry::{RetryPolicy, RetryingApi};
//! use notespace_client::transport::HttpNoteApi;
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let http = HttpNoteApi::new("http://127.0.0.1:3001", "default", Duration::from_secs(10))?;
//! // 3 attempts in total: immediate, +1s, +2s
//! let api = RetryingApi::new(http, RetryPolicy::default());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use notespace_core::models::{CreateNoteInput, DeleteConfirmation, ListNotesQuery, Note, NoteId, NotePage};
use std::future::Future;
use std::time::Duration;

use crate::error::ClientError;
use crate::transport::NoteApi;

/// Backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first (1 = no retries)
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt + 1` (attempt 0 is the first failure)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

/// `NoteApi` decorator applying a [`RetryPolicy`] to every call
#[derive(Debug, Clone)]
pub struct RetryingApi<A> {
    inner: A,
    policy: RetryPolicy,
}

impl<A: NoteApi> RetryingApi<A> {
    pub fn new(inner: A, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// Run `call` until it succeeds, fails terminally, or attempts run out
    ///
    /// `call` receives the zero-based attempt number.
    async fn run<T, F, Fut>(&self, operation: &'static str, call: F) -> Result<T, ClientError>
    where
        F: Fn(u32) -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match call(attempt).await {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::debug!(
                            "{} succeeded after {} retry(ies)",
                            operation,
                            attempt
                        );
                    }
                    return Ok(value);
                }

                Err(e) if e.is_retryable() && attempt + 1 < max_attempts => {
                    let delay = self.policy.delay_for(attempt);
                    tracing::warn!(
                        "{} failed on attempt {}/{}: {}. Retrying in {:?}",
                        operation,
                        attempt + 1,
                        max_attempts,
                        e,
                        delay
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }

                Err(e) => {
                    if e.is_retryable() {
                        tracing::warn!(
                            "Max attempts ({}) exhausted for {}: {}",
                            max_attempts,
                            operation,
                            e
                        );
                    }
                    return Err(e);
                }
            }
        }
    }
}

#[async_trait]
impl<A: NoteApi> NoteApi for RetryingApi<A> {
    async fn list(&self, query: &ListNotesQuery) -> Result<NotePage, ClientError> {
        self.run("list", |_| self.inner.list(query)).await
    }

    async fn get(&self, id: &NoteId) -> Result<Note, ClientError> {
        self.run("get", |_| self.inner.get(id)).await
    }

    async fn create(&self, input: &CreateNoteInput) -> Result<Note, ClientError> {
        if input.idempotency_key.is_none() {
            tracing::debug!("Retrying create without an idempotency key may duplicate notes");
        }
        self.run("create", |_| self.inner.create(input)).await
    }

    async fn delete(&self, id: &NoteId) -> Result<DeleteConfirmation, ClientError> {
        self.run("delete", |attempt| async move {
            match self.inner.delete(id).await {
                Err(e) if e.is_not_found() && attempt > 0 => {
                    tracing::debug!(%id, "Delete landed on an earlier attempt");
                    Ok(DeleteConfirmation {
                        id: *id,
                        deleted: true,
                    })
                }
                other => other,
            }
        })
        .await
    }
}
