//! Note synchronization engine.
//!
//! # Responsibility
//! - Own the session's `SyncState` and serialize every mutation through
//!   `SyncState::apply`.
//! - Translate UI intents into remote store calls and fold their responses
//!   back into state.
//! - Pump the store's push-event stream into the same merge path.
//!
//! # Invariants
//! - The state lock is never held across an `.await`; each transition is
//!   atomic with respect to other tasks.
//! - Validation failures are rejected before any store call.
//! - Store failures leave the note collection at its last known good value
//!   and are recorded as `last_error`.
//! - `NotFound` from the store means "already deleted", not an error.
//! - After `on_session_end` every operation fails with `SessionEnded`.

use crate::model::note::{NewNote, Note, NoteId, NotePatch, NoteValidationError, OwnerId};
use crate::store::remote::{NoteStore, RemoteEvent, StoreError};
use crate::summary::heuristic::generate_summary;
use crate::sync::state::{
    MergeOutcome, Selection, SyncAction, SyncFailure, SyncOperation, SyncState, SyncStatus,
};
use crate::sync::view::{view, SortKey};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

pub type SyncResult<T> = Result<T, SyncError>;

/// Authenticated user context the engine is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: OwnerId,
}

impl SessionContext {
    pub fn new(user_id: impl Into<OwnerId>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Error returned by engine operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Input rejected locally; the store was not called.
    Validation(NoteValidationError),
    /// Store call failed; local notes are unchanged.
    Remote {
        operation: SyncOperation,
        source: StoreError,
    },
    SessionEnded,
    /// `subscribe` was called outside a tokio runtime.
    NoRuntime,
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Remote { operation, source } => write!(f, "{operation} failed: {source}"),
            Self::SessionEnded => write!(f, "session has ended"),
            Self::NoRuntime => write!(f, "no async runtime available for the subscription"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Remote { source, .. } => Some(source),
            Self::SessionEnded | Self::NoRuntime => None,
        }
    }
}

impl From<NoteValidationError> for SyncError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Client-side view of one user's notes, reconciled with the remote store.
pub struct NoteSyncEngine {
    store: Arc<dyn NoteStore>,
    session: Mutex<Option<SessionContext>>,
    state: Mutex<SyncState>,
    subscription: Mutex<Option<JoinHandle<()>>>,
}

impl NoteSyncEngine {
    /// Creates an engine with empty state for `session`.
    pub fn new(store: Arc<dyn NoteStore>, session: SessionContext) -> Self {
        info!(
            "event=session_start module=sync status=ok user_id={}",
            session.user_id
        );
        Self {
            store,
            session: Mutex::new(Some(session)),
            state: Mutex::new(SyncState::new()),
            subscription: Mutex::new(None),
        }
    }

    /// Replaces the collection with the store's full note set.
    ///
    /// On failure previously loaded notes are kept and status becomes
    /// `Error`. Returns the number of notes loaded.
    pub async fn load(&self) -> SyncResult<usize> {
        let owner_id = self.owner_id()?;
        self.dispatch(SyncAction::LoadStarted);

        match self.store.list_notes(&owner_id).await {
            Ok(notes) => {
                let count = notes.len();
                self.dispatch(SyncAction::Loaded(notes));
                info!("event=notes_load module=sync status=ok count={count}");
                Ok(count)
            }
            Err(err) => Err(self.fail(SyncOperation::Load, err)),
        }
    }

    /// Validates and creates a note.
    ///
    /// A blank summary is replaced by the heuristic summary of the content.
    pub async fn create(&self, mut input: NewNote) -> SyncResult<Note> {
        input.validate()?;
        let owner_id = self.owner_id()?;

        let has_summary = input
            .summary
            .as_deref()
            .is_some_and(|summary| !summary.trim().is_empty());
        if !has_summary {
            input.summary = Some(generate_summary(&input.content));
        }

        match self.store.create_note(&owner_id, &input).await {
            Ok(note) => {
                let outcome = self.dispatch(SyncAction::Created(note.clone()));
                info!(
                    "event=note_create module=sync status=ok note_id={} outcome={outcome:?}",
                    note.id
                );
                Ok(note)
            }
            Err(err) => Err(self.fail(SyncOperation::Create, err)),
        }
    }

    /// Applies a partial update.
    ///
    /// Returns `Ok(None)` when the note no longer exists: either the store
    /// reported it missing, or it was deleted in this session while the
    /// request was in flight.
    pub async fn update(&self, id: &str, patch: NotePatch) -> SyncResult<Option<Note>> {
        patch.validate()?;
        let owner_id = self.owner_id()?;

        match self.store.update_note(&owner_id, id, &patch).await {
            Ok(note) => match self.dispatch(SyncAction::Saved(note.clone())) {
                MergeOutcome::Suppressed => {
                    info!(
                        "event=note_update module=sync status=suppressed note_id={id} reason=deleted"
                    );
                    Ok(None)
                }
                outcome => {
                    info!(
                        "event=note_update module=sync status=ok note_id={id} outcome={outcome:?}"
                    );
                    Ok(Some(note))
                }
            },
            Err(StoreError::NotFound(_)) => {
                self.dispatch(SyncAction::Remote(RemoteEvent::Deleted(id.to_string())));
                info!("event=note_update module=sync status=gone note_id={id}");
                Ok(None)
            }
            Err(err) => Err(self.fail(SyncOperation::Update, err)),
        }
    }

    /// Deletes a note. Deleting an already missing note succeeds.
    pub async fn delete(&self, id: &str) -> SyncResult<()> {
        let owner_id = self.owner_id()?;

        match self.store.delete_note(&owner_id, id).await {
            Ok(()) | Err(StoreError::NotFound(_)) => {
                let outcome = self.dispatch(SyncAction::Removed(id.to_string()));
                info!("event=note_delete module=sync status=ok note_id={id} outcome={outcome:?}");
                Ok(())
            }
            Err(err) => Err(self.fail(SyncOperation::Delete, err)),
        }
    }

    /// Full-text search delegated to the store.
    ///
    /// A blank query returns the current collection, newest first, without a
    /// store call. Never mutates the collection.
    pub async fn search(&self, query: &str) -> SyncResult<Vec<Note>> {
        let owner_id = self.owner_id()?;
        if query.trim().is_empty() {
            return Ok(self.state.lock().ordered());
        }

        match self.store.search_notes(&owner_id, query).await {
            Ok(notes) => {
                self.dispatch(SyncAction::Searched);
                debug!(
                    "event=notes_search module=sync status=ok hits={}",
                    notes.len()
                );
                Ok(notes)
            }
            Err(err) => Err(self.fail(SyncOperation::Search, err)),
        }
    }

    /// Merges one pushed change. Idempotent.
    pub fn apply_remote_event(&self, event: RemoteEvent) -> MergeOutcome {
        let kind = event.kind();
        let note_id = event.note_id().to_string();
        let outcome = self.dispatch(SyncAction::Remote(event));
        debug!(
            "event=remote_apply module=sync status=ok kind={kind} note_id={note_id} outcome={outcome:?}"
        );
        outcome
    }

    pub fn select_for_create(&self) {
        self.dispatch(SyncAction::SelectForCreate);
    }

    pub fn select_for_edit(&self, id: impl Into<NoteId>) {
        self.dispatch(SyncAction::SelectForEdit(id.into()));
    }

    pub fn clear_selection(&self) {
        self.dispatch(SyncAction::ClearSelection);
    }

    pub fn clear_error(&self) {
        self.dispatch(SyncAction::ClearError);
    }

    /// Read-only copy of the whole session state.
    pub fn snapshot(&self) -> SyncState {
        self.state.lock().clone()
    }

    /// Notes newest first.
    pub fn notes(&self) -> Vec<Note> {
        self.state.lock().ordered()
    }

    pub fn note(&self, id: &str) -> Option<Note> {
        self.state.lock().note(id).cloned()
    }

    pub fn status(&self) -> SyncStatus {
        self.state.lock().status().clone()
    }

    pub fn selection(&self) -> Selection {
        self.state.lock().selection().clone()
    }

    pub fn last_error(&self) -> Option<SyncFailure> {
        self.state.lock().last_error().cloned()
    }

    /// Filtered and sorted copy of the collection.
    pub fn view(&self, query: &str, sort: SortKey) -> Vec<Note> {
        let state = self.state.lock();
        view(state.iter(), query, sort)
    }

    /// Opens the store's event stream and starts feeding it into
    /// [`Self::apply_remote_event`].
    ///
    /// Replaces any previous subscription. Fails with `NoRuntime` outside a
    /// tokio runtime. The pump holds only a weak reference, so dropping the
    /// engine ends it.
    pub fn subscribe(self: &Arc<Self>) -> SyncResult<()> {
        let owner_id = self.owner_id()?;
        let runtime = Handle::try_current().map_err(|_| {
            warn!("event=subscription_open module=sync status=error reason=no_runtime");
            SyncError::NoRuntime
        })?;
        let mut receiver = self
            .store
            .subscribe(&owner_id)
            .map_err(|err| self.fail(SyncOperation::Subscribe, err))?;

        let engine: Weak<Self> = Arc::downgrade(self);
        let handle = runtime.spawn(async move {
            while let Some(event) = receiver.recv().await {
                let Some(engine) = engine.upgrade() else {
                    break;
                };
                engine.apply_remote_event(event);
            }
            debug!("event=subscription_closed module=sync status=ok");
        });

        if let Some(previous) = self.subscription.lock().replace(handle) {
            previous.abort();
        }
        info!("event=subscription_open module=sync status=ok user_id={owner_id}");
        Ok(())
    }

    /// Stops the event pump, if any.
    pub fn unsubscribe(&self) {
        if let Some(handle) = self.subscription.lock().take() {
            handle.abort();
            info!("event=subscription_release module=sync status=ok");
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Ends the session: releases the subscription and resets state.
    pub fn on_session_end(&self) {
        self.unsubscribe();
        let ended = self.session.lock().take();
        self.dispatch(SyncAction::Reset);
        if let Some(session) = ended {
            info!(
                "event=session_end module=sync status=ok user_id={}",
                session.user_id
            );
        }
    }

    fn owner_id(&self) -> SyncResult<OwnerId> {
        self.session
            .lock()
            .as_ref()
            .map(|session| session.user_id.clone())
            .ok_or(SyncError::SessionEnded)
    }

    fn dispatch(&self, action: SyncAction) -> MergeOutcome {
        self.state.lock().apply(action)
    }

    fn fail(&self, operation: SyncOperation, source: StoreError) -> SyncError {
        let message = source.to_string();
        warn!("event=remote_call module=sync status=error operation={operation} error={message}");
        self.dispatch(SyncAction::Failed(SyncFailure { operation, message }));
        SyncError::Remote { operation, source }
    }
}

impl Drop for NoteSyncEngine {
    fn drop(&mut self) {
        if let Some(handle) = self.subscription.get_mut().take() {
            handle.abort();
        }
    }
}
