//! Remote note store contract.
//!
//! # Responsibility
//! - Describe the CRUD + search + subscribe capability the sync engine
//!   consumes from the durable store.
//! - Define the push-event shape delivered for changes made elsewhere.
//!
//! # Invariants
//! - Every successful write returns the full persisted record, including
//!   server-assigned timestamps.
//! - All calls are scoped to one owner; records of other owners are never
//!   returned or mutated.
//! - `updated_at` is monotonic per note.

use crate::model::note::{NewNote, Note, NoteId, NotePatch};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use tokio::sync::mpsc;

pub type StoreResult<T> = Result<T, StoreError>;

/// Receiving half of a store subscription. Dropping it unsubscribes.
pub type RemoteEventReceiver = mpsc::UnboundedReceiver<RemoteEvent>;

/// Failure reported by a store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Record does not exist (or belongs to another owner).
    NotFound(NoteId),
    Unauthorized(String),
    /// Store refused the payload.
    Rejected(String),
    /// Transport or backend failure.
    Unavailable(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::Unauthorized(message) => write!(f, "not authorized: {message}"),
            Self::Rejected(message) => write!(f, "store rejected request: {message}"),
            Self::Unavailable(message) => write!(f, "store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {}

/// Change notification pushed by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEvent {
    Inserted(Note),
    Updated(Note),
    Deleted(NoteId),
}

impl RemoteEvent {
    /// Id of the note this event concerns.
    pub fn note_id(&self) -> &str {
        match self {
            Self::Inserted(note) | Self::Updated(note) => note.id.as_str(),
            Self::Deleted(id) => id.as_str(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Inserted(_) => "inserted",
            Self::Updated(_) => "updated",
            Self::Deleted(_) => "deleted",
        }
    }
}

/// Durable note store capability.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Persists a new note and returns it with id and timestamps assigned.
    async fn create_note(&self, owner_id: &str, input: &NewNote) -> StoreResult<Note>;
    /// Returns every note of `owner_id`, newest `created_at` first.
    async fn list_notes(&self, owner_id: &str) -> StoreResult<Vec<Note>>;
    /// Applies a partial update and returns the persisted record.
    async fn update_note(&self, owner_id: &str, id: &str, patch: &NotePatch)
        -> StoreResult<Note>;
    async fn delete_note(&self, owner_id: &str, id: &str) -> StoreResult<()>;
    /// Case-insensitive substring match over title and content, newest first.
    async fn search_notes(&self, owner_id: &str, query: &str) -> StoreResult<Vec<Note>>;
    /// Opens a push-event stream for `owner_id`.
    fn subscribe(&self, owner_id: &str) -> StoreResult<RemoteEventReceiver>;
}
