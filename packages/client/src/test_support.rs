//! In-memory `NoteApi` for unit tests
//!
//! Behaves like the server (ordering, `hasMore`, idempotency keys, 404s) and
//! adds knobs for failure injection, lost responses and gated calls.

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use notespace_core::models::time::{ManualTimeProvider, MonotonicClock, TimeProvider};
use notespace_core::models::{
    CreateNoteInput, DeleteConfirmation, ListNotesQuery, Note, NoteId, NoteLimits, NotePage,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Semaphore;

use crate::error::ClientError;
use crate::transport::NoteApi;

#[derive(Default)]
struct FakeState {
    // newest first
    notes: Vec<Note>,
    keys: HashMap<String, NoteId>,
    list_failures: VecDeque<ClientError>,
    create_failures: VecDeque<ClientError>,
    delete_failures: VecDeque<ClientError>,
    lost_create_responses: u32,
    lost_delete_responses: u32,
    list_calls: usize,
    get_calls: usize,
    create_calls: usize,
    delete_calls: usize,
    list_gate: Option<Arc<Semaphore>>,
    create_gate: Option<Arc<Semaphore>>,
}

#[derive(Clone)]
pub(crate) struct FakeNoteApi {
    state: Arc<Mutex<FakeState>>,
    time: Arc<ManualTimeProvider>,
    clock: Arc<MonotonicClock>,
}

impl FakeNoteApi {
    pub fn new() -> Self {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let time = Arc::new(ManualTimeProvider::with_time(start));
        let clock = Arc::new(MonotonicClock::new(time.clone()));
        Self {
            state: Arc::new(Mutex::new(FakeState::default())),
            time,
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn insert(&self, title: &str, content: &str) -> Note {
        self.time.advance(Duration::seconds(1));
        let note = Note {
            id: NoteId::new(),
            title: title.to_string(),
            content: content.to_string(),
            created_at: self.clock.next(),
        };
        self.lock().notes.insert(0, note.clone());
        note
    }

    /// Store a note directly, bypassing call counters
    pub fn seed(&self, title: &str, content: &str) -> Note {
        self.insert(title, content)
    }

    /// Store `count` notes titled `note 0..count`, returned newest first
    pub fn seed_many(&self, count: usize) -> Vec<Note> {
        let mut notes: Vec<Note> = (0..count)
            .map(|i| self.insert(&format!("note {}", i), "body"))
            .collect();
        notes.reverse();
        notes
    }

    pub fn stored_notes(&self) -> Vec<Note> {
        self.lock().notes.clone()
    }

    pub fn fail_next_lists(&self, errors: Vec<ClientError>) {
        self.lock().list_failures.extend(errors);
    }

    pub fn fail_next_creates(&self, errors: Vec<ClientError>) {
        self.lock().create_failures.extend(errors);
    }

    pub fn fail_next_deletes(&self, errors: Vec<ClientError>) {
        self.lock().delete_failures.extend(errors);
    }

    /// The next create is applied but the caller sees a transport error
    pub fn drop_next_create_response(&self) {
        self.lock().lost_create_responses += 1;
    }

    /// The next delete is applied but the caller sees a transport error
    pub fn drop_next_delete_response(&self) {
        self.lock().lost_delete_responses += 1;
    }

    /// Block list calls until permits are added to the returned semaphore
    pub fn gate_lists(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.lock().list_gate = Some(gate.clone());
        gate
    }

    /// Block create calls until permits are added to the returned semaphore
    pub fn gate_creates(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.lock().create_gate = Some(gate.clone());
        gate
    }

    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }

    pub fn get_calls(&self) -> usize {
        self.lock().get_calls
    }

    pub fn create_calls(&self) -> usize {
        self.lock().create_calls
    }

    pub fn delete_calls(&self) -> usize {
        self.lock().delete_calls
    }

    pub fn now(&self) -> chrono::DateTime<Utc> {
        self.time.now()
    }
}

async fn pass_gate(gate: Option<Arc<Semaphore>>) {
    if let Some(gate) = gate {
        gate.acquire().await.unwrap().forget();
    }
}

fn not_found(id: &NoteId) -> ClientError {
    ClientError::NotFound {
        message: format!("Note not found: {}", id),
    }
}

#[async_trait]
impl NoteApi for FakeNoteApi {
    async fn list(&self, query: &ListNotesQuery) -> Result<NotePage, ClientError> {
        let gate = {
            let mut state = self.lock();
            state.list_calls += 1;
            state.list_gate.clone()
        };
        pass_gate(gate).await;

        let mut state = self.lock();
        if let Some(error) = state.list_failures.pop_front() {
            return Err(error);
        }

        let limit = query.resolved_limit()?;
        let scanned: Vec<Note> = state
            .notes
            .iter()
            .filter(|note| query.cursor.map_or(true, |cursor| note.created_at < cursor))
            .take(limit as usize + 1)
            .cloned()
            .collect();

        Ok(NotePage::from_scan(scanned, limit))
    }

    async fn get(&self, id: &NoteId) -> Result<Note, ClientError> {
        let mut state = self.lock();
        state.get_calls += 1;
        state
            .notes
            .iter()
            .find(|note| note.id == *id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn create(&self, input: &CreateNoteInput) -> Result<Note, ClientError> {
        let gate = {
            let mut state = self.lock();
            state.create_calls += 1;
            state.create_gate.clone()
        };
        pass_gate(gate).await;

        if let Some(error) = self.lock().create_failures.pop_front() {
            return Err(error);
        }

        let new_note = input.validate(&NoteLimits::default())?;

        let existing = new_note.idempotency_key.as_ref().and_then(|key| {
            let state = self.lock();
            let id = state.keys.get(key)?;
            state.notes.iter().find(|note| note.id == *id).cloned()
        });

        let note = match existing {
            Some(note) => note,
            None => {
                let note = self.insert(&new_note.title, &new_note.content);
                if let Some(key) = new_note.idempotency_key {
                    self.lock().keys.insert(key, note.id);
                }
                note
            }
        };

        let mut state = self.lock();
        if state.lost_create_responses > 0 {
            state.lost_create_responses -= 1;
            return Err(ClientError::Transport("connection reset".into()));
        }
        Ok(note)
    }

    async fn delete(&self, id: &NoteId) -> Result<DeleteConfirmation, ClientError> {
        let mut state = self.lock();
        state.delete_calls += 1;

        if let Some(error) = state.delete_failures.pop_front() {
            return Err(error);
        }

        let before = state.notes.len();
        state.notes.retain(|note| note.id != *id);
        if state.notes.len() == before {
            return Err(not_found(id));
        }

        if state.lost_delete_responses > 0 {
            state.lost_delete_responses -= 1;
            return Err(ClientError::Transport("connection reset".into()));
        }

        Ok(DeleteConfirmation {
            id: *id,
            deleted: true,
        })
    }
}
