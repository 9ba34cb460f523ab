#![allow(dead_code)]

use async_trait::async_trait;
use notesync_core::{
    MemoryNoteStore, ModelError, ModelRequest, NewNote, Note, NotePatch, NoteStore,
    RemoteEventReceiver, StoreError, StoreResult, SummaryModel, SyncOperation,
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

pub const OWNER: &str = "user-1";

/// Model that replays canned replies in order and records every request.
pub struct ScriptedModel {
    configured: bool,
    replies: Mutex<VecDeque<Result<String, ModelError>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = Result<String, ModelError>>,
    {
        Self {
            configured: true,
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(replies.into_iter().map(|reply| Ok(reply.into())))
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new([])
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl SummaryModel for ScriptedModel {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn complete(&self, request: &ModelRequest) -> Result<String, ModelError> {
        self.requests.lock().push(request.clone());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::Transport("script exhausted".to_string())))
    }
}

/// Memory store with one-shot failure injection per operation.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryNoteStore,
    failures: Mutex<HashMap<SyncOperation, StoreError>>,
    calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &MemoryNoteStore {
        &self.inner
    }

    /// Makes the next call of `operation` fail with `error`.
    pub fn fail_next(&self, operation: SyncOperation, error: StoreError) {
        self.failures.lock().insert(operation, error);
    }

    /// Store calls received, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self, operation: SyncOperation) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failures.lock().remove(&operation) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl NoteStore for FlakyStore {
    async fn create_note(&self, owner_id: &str, input: &NewNote) -> StoreResult<Note> {
        self.check(SyncOperation::Create)?;
        self.inner.create_note(owner_id, input).await
    }

    async fn list_notes(&self, owner_id: &str) -> StoreResult<Vec<Note>> {
        self.check(SyncOperation::Load)?;
        self.inner.list_notes(owner_id).await
    }

    async fn update_note(&self, owner_id: &str, id: &str, patch: &NotePatch) -> StoreResult<Note> {
        self.check(SyncOperation::Update)?;
        self.inner.update_note(owner_id, id, patch).await
    }

    async fn delete_note(&self, owner_id: &str, id: &str) -> StoreResult<()> {
        self.check(SyncOperation::Delete)?;
        self.inner.delete_note(owner_id, id).await
    }

    async fn search_notes(&self, owner_id: &str, query: &str) -> StoreResult<Vec<Note>> {
        self.check(SyncOperation::Search)?;
        self.inner.search_notes(owner_id, query).await
    }

    fn subscribe(&self, owner_id: &str) -> StoreResult<RemoteEventReceiver> {
        self.check(SyncOperation::Subscribe)?;
        self.inner.subscribe(owner_id)
    }
}

/// Memory store whose `update_note` parks until released.
#[derive(Default)]
pub struct GatedStore {
    inner: MemoryNoteStore,
    entered: Notify,
    gate: Notify,
}

impl GatedStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inner(&self) -> &MemoryNoteStore {
        &self.inner
    }

    /// Resolves once an update call is parked at the gate.
    pub async fn update_started(&self) {
        self.entered.notified().await;
    }

    pub fn release_update(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl NoteStore for GatedStore {
    async fn create_note(&self, owner_id: &str, input: &NewNote) -> StoreResult<Note> {
        self.inner.create_note(owner_id, input).await
    }

    async fn list_notes(&self, owner_id: &str) -> StoreResult<Vec<Note>> {
        self.inner.list_notes(owner_id).await
    }

    async fn update_note(&self, owner_id: &str, id: &str, patch: &NotePatch) -> StoreResult<Note> {
        self.entered.notify_one();
        self.gate.notified().await;
        self.inner.update_note(owner_id, id, patch).await
    }

    async fn delete_note(&self, owner_id: &str, id: &str) -> StoreResult<()> {
        self.inner.delete_note(owner_id, id).await
    }

    async fn search_notes(&self, owner_id: &str, query: &str) -> StoreResult<Vec<Note>> {
        self.inner.search_notes(owner_id, query).await
    }

    fn subscribe(&self, owner_id: &str) -> StoreResult<RemoteEventReceiver> {
        self.inner.subscribe(owner_id)
    }
}

/// Yields to the runtime until `done` holds, or gives up after a bounded
/// number of turns.
pub async fn settle<F>(mut done: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..64 {
        if done() {
            return true;
        }
        tokio::task::yield_now().await;
    }
    done()
}
