//! Session state and its single transition function.
//!
//! # Responsibility
//! - Hold the canonical in-memory note collection for one user session.
//! - Apply every mutation, local or remote, through `SyncState::apply`.
//!
//! # Invariants
//! - The collection is keyed by id; at most one copy of a note exists.
//! - Local write responses and remote push events share one merge path
//!   (`upsert` / `remove`), so the final mapping depends only on the order
//!   in which actions are applied.
//! - Deletion is terminal for the session: once an id is removed, later
//!   upserts of that id are suppressed.
//! - A failed operation never touches `notes`.
//! - `last_error` is only cleared explicitly or by a later success of the
//!   same operation that produced it.

use crate::model::note::{Note, NoteId};
use crate::store::remote::RemoteEvent;
use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};

/// Engine lifecycle status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SyncStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Error(String),
}

/// Mutually exclusive UI intent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Creating,
    Editing(NoteId),
}

impl Selection {
    pub fn is_creating(&self) -> bool {
        matches!(self, Self::Creating)
    }

    pub fn editing_id(&self) -> Option<&str> {
        match self {
            Self::Editing(id) => Some(id.as_str()),
            _ => None,
        }
    }
}

/// Engine operation that can fail against the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncOperation {
    Load,
    Create,
    Update,
    Delete,
    Search,
    Subscribe,
}

impl SyncOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Search => "search",
            Self::Subscribe => "subscribe",
        }
    }
}

impl Display for SyncOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Most recent failure, tagged with the operation that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub operation: SyncOperation,
    pub message: String,
}

/// Effect of one merge step on the note collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    Replaced,
    Removed,
    /// Upsert of an id already deleted in this session.
    Suppressed,
    Unchanged,
}

/// Every state transition the engine can perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    LoadStarted,
    Loaded(Vec<Note>),
    Failed(SyncFailure),
    /// Response of a local create.
    Created(Note),
    /// Response of a local update.
    Saved(Note),
    /// Local delete succeeded, or the store reported the note missing.
    Removed(NoteId),
    Searched,
    Remote(RemoteEvent),
    SelectForCreate,
    SelectForEdit(NoteId),
    ClearSelection,
    ClearError,
    Reset,
}

/// Canonical session state. Readers only ever get clones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    notes: HashMap<NoteId, Note>,
    tombstones: HashSet<NoteId>,
    status: SyncStatus,
    selection: Selection,
    last_error: Option<SyncFailure>,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one action. This is the only way state changes.
    pub fn apply(&mut self, action: SyncAction) -> MergeOutcome {
        match action {
            SyncAction::LoadStarted => {
                self.status = SyncStatus::Loading;
                MergeOutcome::Unchanged
            }
            SyncAction::Loaded(notes) => {
                self.notes = notes
                    .into_iter()
                    .filter(|note| !self.tombstones.contains(&note.id))
                    .map(|note| (note.id.clone(), note))
                    .collect();
                self.status = SyncStatus::Ready;
                self.settle(SyncOperation::Load);
                MergeOutcome::Replaced
            }
            SyncAction::Failed(failure) => {
                if failure.operation == SyncOperation::Load {
                    self.status = SyncStatus::Error(failure.message.clone());
                }
                self.last_error = Some(failure);
                MergeOutcome::Unchanged
            }
            SyncAction::Created(note) => {
                let outcome = self.upsert(note);
                if self.selection.is_creating() {
                    self.selection = Selection::None;
                }
                self.settle(SyncOperation::Create);
                outcome
            }
            SyncAction::Saved(note) => {
                let id = note.id.clone();
                let outcome = self.upsert(note);
                if self.selection.editing_id() == Some(id.as_str()) {
                    self.selection = Selection::None;
                }
                self.settle(SyncOperation::Update);
                outcome
            }
            SyncAction::Removed(id) => {
                let outcome = self.remove(id);
                self.settle(SyncOperation::Delete);
                outcome
            }
            SyncAction::Searched => {
                self.settle(SyncOperation::Search);
                MergeOutcome::Unchanged
            }
            SyncAction::Remote(event) => match event {
                RemoteEvent::Inserted(note) | RemoteEvent::Updated(note) => self.upsert(note),
                RemoteEvent::Deleted(id) => self.remove(id),
            },
            SyncAction::SelectForCreate => {
                self.selection = Selection::Creating;
                MergeOutcome::Unchanged
            }
            SyncAction::SelectForEdit(id) => {
                self.selection = Selection::Editing(id);
                MergeOutcome::Unchanged
            }
            SyncAction::ClearSelection => {
                self.selection = Selection::None;
                MergeOutcome::Unchanged
            }
            SyncAction::ClearError => {
                self.last_error = None;
                MergeOutcome::Unchanged
            }
            SyncAction::Reset => {
                *self = Self::default();
                MergeOutcome::Unchanged
            }
        }
    }

    pub fn note(&self, id: &str) -> Option<&Note> {
        self.notes.get(id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Unordered iterator over the collection.
    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.values()
    }

    /// Notes newest `created_at` first, ties broken by id.
    pub fn ordered(&self) -> Vec<Note> {
        let mut notes: Vec<Note> = self.notes.values().cloned().collect();
        notes.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        notes
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn last_error(&self) -> Option<&SyncFailure> {
        self.last_error.as_ref()
    }

    pub fn is_deleted(&self, id: &str) -> bool {
        self.tombstones.contains(id)
    }

    fn upsert(&mut self, note: Note) -> MergeOutcome {
        if self.tombstones.contains(&note.id) {
            return MergeOutcome::Suppressed;
        }
        match self.notes.insert(note.id.clone(), note) {
            Some(_) => MergeOutcome::Replaced,
            None => MergeOutcome::Inserted,
        }
    }

    fn remove(&mut self, id: NoteId) -> MergeOutcome {
        if self.selection.editing_id() == Some(id.as_str()) {
            self.selection = Selection::None;
        }
        let removed = self.notes.remove(&id).is_some();
        self.tombstones.insert(id);
        if removed {
            MergeOutcome::Removed
        } else {
            MergeOutcome::Unchanged
        }
    }

    fn settle(&mut self, operation: SyncOperation) {
        if self
            .last_error
            .as_ref()
            .is_some_and(|failure| failure.operation == operation)
        {
            self.last_error = None;
        }
    }
}
