//! Client-side note cache
//!
//! Mirrors the paginated "all notes, newest first" list in memory. There is
//! exactly one query identity, so the cache holds a single entry: the pages
//! loaded so far plus the pagination state the server reported for them.
//!
//! # Consistency
//!
//! Every fetch records the cache generation when it starts and only writes
//! its result if the generation is unchanged when it finishes.
//! [`NoteCache::cancel_refetch`] bumps the generation, so once it returns no
//! fetch that was already in flight can overwrite the cache. The optimistic
//! controller relies on this before taking a snapshot.
//!
//! Pages are never evicted.

use chrono::{DateTime, Utc};
use notespace_core::models::{ListNotesQuery, Note, NoteId, NotePage};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tokio::task::{AbortHandle, JoinHandle};

use crate::error::ClientError;
use crate::transport::NoteApi;

/// Loaded pages of the note list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PagedNotes {
    pages: Vec<Vec<Note>>,
    /// Cursor each page was fetched with (`None` for the first page)
    page_cursors: Vec<Option<DateTime<Utc>>>,
    has_more: bool,
    next_cursor: Option<DateTime<Utc>>,
    /// Ids of optimistic placeholders not yet confirmed by the server
    placeholders: HashSet<NoteId>,
}

impl PagedNotes {
    pub fn from_first_page(page: NotePage) -> Self {
        Self {
            pages: vec![page.notes],
            page_cursors: vec![None],
            has_more: page.has_more,
            next_cursor: page.next_cursor,
            placeholders: HashSet::new(),
        }
    }

    /// Append a page fetched with `cursor`, skipping notes already present
    pub fn push_page(&mut self, cursor: Option<DateTime<Utc>>, page: NotePage) {
        let seen: HashSet<NoteId> = self.notes().map(|note| note.id).collect();
        let notes = page
            .notes
            .into_iter()
            .filter(|note| !seen.contains(&note.id))
            .collect();

        self.pages.push(notes);
        self.page_cursors.push(cursor);
        self.has_more = page.has_more;
        self.next_cursor = page.next_cursor;
    }

    pub fn pages(&self) -> &[Vec<Note>] {
        &self.pages
    }

    pub fn page_cursors(&self) -> &[Option<DateTime<Utc>>] {
        &self.page_cursors
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Cursor for the page after the last loaded one
    ///
    /// Prefers the server-reported cursor: optimistic edits change which note
    /// sits at the end of the loaded list, the server's position does not.
    pub fn next_cursor(&self) -> Option<DateTime<Utc>> {
        self.next_cursor
            .or_else(|| self.notes().last().map(|note| note.created_at))
    }

    /// All loaded notes in page order
    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.pages.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.pages.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &NoteId) -> Option<&Note> {
        self.notes().find(|note| note.id == *id)
    }

    pub fn contains(&self, id: &NoteId) -> bool {
        self.get(id).is_some()
    }

    /// Whether `id` is an unconfirmed optimistic placeholder
    pub fn is_pending(&self, id: &NoteId) -> bool {
        self.placeholders.contains(id)
    }

    /// Prepend a placeholder to the first page
    ///
    /// Each page that grows past `page_size` hands its last note to the head
    /// of the next page, down to a new trailing page when the last one
    /// overflows.
    pub fn insert_placeholder(&mut self, note: Note, page_size: usize) {
        self.placeholders.insert(note.id);

        if self.pages.is_empty() {
            self.pages.push(Vec::new());
            self.page_cursors.push(None);
        }

        let mut carry = Some(note);
        let mut index = 0;
        while let Some(note) = carry.take() {
            if index == self.pages.len() {
                let cursor = self.pages[index - 1].last().map(|n| n.created_at);
                self.pages.push(Vec::new());
                self.page_cursors.push(cursor);
            }

            let page = &mut self.pages[index];
            page.insert(0, note);
            if page.len() > page_size.max(1) {
                carry = page.pop();
            }
            index += 1;
        }
    }

    /// Remove `id` from every page; returns whether anything was removed
    pub fn remove(&mut self, id: &NoteId) -> bool {
        let before = self.len();
        for page in &mut self.pages {
            page.retain(|note| note.id != *id);
        }
        self.placeholders.remove(id);
        self.len() != before
    }

    /// Swap a placeholder for the note the server created
    ///
    /// The entry keeps its position and the placeholder's `created_at`; only
    /// the id and server-normalized fields change. If the server note is
    /// already present (a fetch brought it in), the placeholder is dropped
    /// instead so no id appears twice.
    pub fn confirm_placeholder(&mut self, placeholder_id: &NoteId, server_note: Note) -> bool {
        self.placeholders.remove(placeholder_id);

        if server_note.id != *placeholder_id && self.contains(&server_note.id) {
            return self.remove(placeholder_id);
        }

        match self
            .pages
            .iter_mut()
            .flatten()
            .find(|note| note.id == *placeholder_id)
        {
            Some(entry) => {
                *entry = Note {
                    created_at: entry.created_at,
                    ..server_note
                };
                true
            }
            None => false,
        }
    }
}

/// Result of a fetch against the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The fetched data was written to the cache
    Applied,
    /// The cache was invalidated while the fetch was in flight
    Discarded,
    /// The server already reported the end of the list
    NoMorePages,
}

struct CacheInner {
    state: RwLock<Option<PagedNotes>>,
    page_size: u32,
    generation: AtomicU64,
    refetch_task: Mutex<Option<AbortHandle>>,
}

/// Cloneable handle to the single note list cache entry
#[derive(Clone)]
pub struct NoteCache {
    inner: Arc<CacheInner>,
}

impl NoteCache {
    pub fn new(page_size: u32) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                state: RwLock::new(None),
                page_size: page_size.max(1),
                generation: AtomicU64::new(0),
                refetch_task: Mutex::new(None),
            }),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.inner.page_size
    }

    fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// Write `data` unless the cache was invalidated after `generation`
    async fn commit(&self, generation: u64, data: PagedNotes) -> FetchOutcome {
        let mut state = self.inner.state.write().await;
        if self.generation() != generation {
            tracing::debug!("Discarding stale fetch (generation {})", generation);
            return FetchOutcome::Discarded;
        }
        *state = Some(data);
        FetchOutcome::Applied
    }

    /// Load the first page, replacing whatever the cache held
    pub async fn fetch_first_page(&self, api: &dyn NoteApi) -> Result<FetchOutcome, ClientError> {
        let generation = self.generation();
        let page = api
            .list(&ListNotesQuery::first_page(self.inner.page_size))
            .await?;

        tracing::debug!(
            "Fetched first page: {} notes, has_more={}",
            page.notes.len(),
            page.has_more
        );
        Ok(self.commit(generation, PagedNotes::from_first_page(page)).await)
    }

    /// Append the next page
    ///
    /// Loads the first page when nothing is cached yet, and does nothing once
    /// the server has reported the end of the list.
    pub async fn fetch_next_page(&self, api: &dyn NoteApi) -> Result<FetchOutcome, ClientError> {
        let generation = self.generation();
        let cursor = match self.inner.state.read().await.as_ref() {
            None => None,
            Some(data) if !data.has_more() => return Ok(FetchOutcome::NoMorePages),
            Some(data) => data.next_cursor(),
        };

        let Some(cursor) = cursor else {
            return self.fetch_first_page(api).await;
        };

        let page = api
            .list(&ListNotesQuery::after(cursor, self.inner.page_size))
            .await?;

        let mut state = self.inner.state.write().await;
        if self.generation() != generation {
            tracing::debug!("Discarding stale page fetch (generation {})", generation);
            return Ok(FetchOutcome::Discarded);
        }
        match state.as_mut() {
            Some(data) => {
                tracing::debug!("Fetched page {}: {} notes", data.page_count() + 1, page.notes.len());
                data.push_page(Some(cursor), page);
                Ok(FetchOutcome::Applied)
            }
            None => Ok(FetchOutcome::Discarded),
        }
    }

    /// Re-fetch every loaded page from the start and replace the entry
    pub async fn refetch(&self, api: &dyn NoteApi) -> Result<FetchOutcome, ClientError> {
        let generation = self.generation();
        let pages_loaded = self
            .inner
            .state
            .read()
            .await
            .as_ref()
            .map_or(1, PagedNotes::page_count)
            .max(1);

        let first = api
            .list(&ListNotesQuery::first_page(self.inner.page_size))
            .await?;
        let mut rebuilt = PagedNotes::from_first_page(first);

        while rebuilt.page_count() < pages_loaded && rebuilt.has_more() {
            let Some(cursor) = rebuilt.next_cursor() else {
                break;
            };
            let page = api
                .list(&ListNotesQuery::after(cursor, self.inner.page_size))
                .await?;
            rebuilt.push_page(Some(cursor), page);
        }

        tracing::debug!(
            "Refetched {} page(s), {} notes",
            rebuilt.page_count(),
            rebuilt.len()
        );
        Ok(self.commit(generation, rebuilt).await)
    }

    /// Run [`NoteCache::refetch`] in the background
    ///
    /// A refetch already running is aborted first.
    pub fn spawn_refetch(
        &self,
        api: Arc<dyn NoteApi>,
    ) -> JoinHandle<Result<FetchOutcome, ClientError>> {
        let cache = self.clone();
        let handle = tokio::spawn(async move { cache.refetch(api.as_ref()).await });

        let mut task = self.lock_task();
        if let Some(previous) = task.replace(handle.abort_handle()) {
            previous.abort();
        }
        handle
    }

    /// Abort the background refetch and invalidate every in-flight fetch
    pub fn cancel_refetch(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.lock_task().take() {
            task.abort();
        }
    }

    fn lock_task(&self) -> std::sync::MutexGuard<'_, Option<AbortHandle>> {
        self.inner
            .refetch_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of the current entry
    pub async fn snapshot(&self) -> Option<PagedNotes> {
        self.inner.state.read().await.clone()
    }

    /// Put back an earlier snapshot exactly
    pub async fn restore(&self, snapshot: Option<PagedNotes>) {
        *self.inner.state.write().await = snapshot;
    }

    /// Edit the entry in place; `None` when nothing is cached
    pub async fn update<R>(&self, f: impl FnOnce(&mut PagedNotes) -> R) -> Option<R> {
        self.inner.state.write().await.as_mut().map(f)
    }

    pub async fn data(&self) -> Option<PagedNotes> {
        self.snapshot().await
    }

    /// Concatenation of all loaded pages
    pub async fn notes(&self) -> Vec<Note> {
        self.inner
            .state
            .read()
            .await
            .as_ref()
            .map(|data| data.notes().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn is_loaded(&self) -> bool {
        self.inner.state.read().await.is_some()
    }
}

impl std::fmt::Debug for NoteCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteCache")
            .field("page_size", &self.inner.page_size)
            .field("generation", &self.generation())
            .finish()
    }
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod cache_test;
