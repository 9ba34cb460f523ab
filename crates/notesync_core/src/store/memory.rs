//! In-process `NoteStore` implementation.
//!
//! # Responsibility
//! - Provide a substitute store honoring the full `NoteStore` contract for
//!   tests and local wiring.
//! - Fan out change events to every live subscription of the owner,
//!   including echoes of the caller's own writes.
//!
//! # Invariants
//! - Ids are random UUIDv4 strings and never reused.
//! - Timestamps are strictly increasing across all writes of one store.
//! - Closed subscriptions are pruned on the next broadcast.

use crate::model::note::{
    epoch_millis_now, normalize_tags, NewNote, Note, NoteId, NotePatch, OwnerId,
};
use crate::store::remote::{NoteStore, RemoteEvent, RemoteEventReceiver, StoreError, StoreResult};
use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    notes: HashMap<NoteId, Note>,
    subscribers: Vec<Subscriber>,
    last_timestamp: i64,
}

struct Subscriber {
    owner_id: OwnerId,
    sender: mpsc::UnboundedSender<RemoteEvent>,
}

impl MemoryState {
    fn next_timestamp(&mut self) -> i64 {
        let next = epoch_millis_now().max(self.last_timestamp + 1);
        self.last_timestamp = next;
        next
    }

    fn owned(&self, owner_id: &str, id: &str) -> StoreResult<&Note> {
        self.notes
            .get(id)
            .filter(|note| note.owner_id == owner_id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn broadcast(&mut self, owner_id: &str, event: RemoteEvent) {
        self.subscribers
            .retain(|subscriber| !subscriber.sender.is_closed());
        for subscriber in &self.subscribers {
            if subscriber.owner_id == owner_id {
                let _ = subscriber.sender.send(event.clone());
            }
        }
    }
}

/// Shared in-memory note store.
#[derive(Default)]
pub struct MemoryNoteStore {
    state: Mutex<MemoryState>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of notes across all owners.
    pub fn len(&self) -> usize {
        self.state.lock().notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().notes.is_empty()
    }

    /// Number of subscriptions whose receiver is still alive.
    pub fn live_subscriptions(&self) -> usize {
        self.state
            .lock()
            .subscribers
            .iter()
            .filter(|subscriber| !subscriber.sender.is_closed())
            .count()
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn create_note(&self, owner_id: &str, input: &NewNote) -> StoreResult<Note> {
        input
            .validate()
            .map_err(|err| StoreError::Rejected(err.to_string()))?;

        let mut state = self.state.lock();
        let timestamp = state.next_timestamp();
        let tags = normalize_tags(&input.tags);
        let note = Note {
            id: Uuid::new_v4().to_string(),
            title: input.title.trim().to_string(),
            content: input.content.clone(),
            summary: input.summary.clone(),
            category: input.category,
            tags: if tags.is_empty() { None } else { Some(tags) },
            owner_id: owner_id.to_string(),
            created_at: timestamp,
            updated_at: timestamp,
        };
        state.notes.insert(note.id.clone(), note.clone());
        state.broadcast(owner_id, RemoteEvent::Inserted(note.clone()));
        debug!(
            "event=store_create module=store status=ok note_id={}",
            note.id
        );
        Ok(note)
    }

    async fn list_notes(&self, owner_id: &str) -> StoreResult<Vec<Note>> {
        let state = self.state.lock();
        let mut notes: Vec<Note> = state
            .notes
            .values()
            .filter(|note| note.owner_id == owner_id)
            .cloned()
            .collect();
        sort_newest_first(&mut notes);
        Ok(notes)
    }

    async fn update_note(
        &self,
        owner_id: &str,
        id: &str,
        patch: &NotePatch,
    ) -> StoreResult<Note> {
        patch
            .validate()
            .map_err(|err| StoreError::Rejected(err.to_string()))?;

        let mut state = self.state.lock();
        let mut note = state.owned(owner_id, id)?.clone();
        note.apply_patch(patch);
        note.updated_at = state.next_timestamp();
        state.notes.insert(note.id.clone(), note.clone());
        state.broadcast(owner_id, RemoteEvent::Updated(note.clone()));
        debug!("event=store_update module=store status=ok note_id={id}");
        Ok(note)
    }

    async fn delete_note(&self, owner_id: &str, id: &str) -> StoreResult<()> {
        let mut state = self.state.lock();
        state.owned(owner_id, id)?;
        state.notes.remove(id);
        state.broadcast(owner_id, RemoteEvent::Deleted(id.to_string()));
        debug!("event=store_delete module=store status=ok note_id={id}");
        Ok(())
    }

    async fn search_notes(&self, owner_id: &str, query: &str) -> StoreResult<Vec<Note>> {
        let needle = query.trim().to_lowercase();
        let state = self.state.lock();
        let mut notes: Vec<Note> = state
            .notes
            .values()
            .filter(|note| note.owner_id == owner_id)
            .filter(|note| {
                note.title.to_lowercase().contains(&needle)
                    || note.content.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        sort_newest_first(&mut notes);
        Ok(notes)
    }

    fn subscribe(&self, owner_id: &str) -> StoreResult<RemoteEventReceiver> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.state.lock().subscribers.push(Subscriber {
            owner_id: owner_id.to_string(),
            sender,
        });
        Ok(receiver)
    }
}

fn sort_newest_first(notes: &mut [Note]) {
    notes.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::MemoryNoteStore;
    use crate::model::note::{NewNote, NotePatch};
    use crate::store::remote::{NoteStore, RemoteEvent, StoreError};

    #[tokio::test]
    async fn create_assigns_id_and_equal_timestamps() {
        let store = MemoryNoteStore::new();
        let note = store
            .create_note("u1", &NewNote::new(" Title ", "body").with_tags(["a", "a", " b"]))
            .await
            .expect("create should succeed");

        assert!(!note.id.is_empty());
        assert_eq!(note.title, "Title");
        assert_eq!(note.created_at, note.updated_at);
        assert_eq!(note.tags, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[tokio::test]
    async fn update_bumps_updated_at_and_hides_other_owners() {
        let store = MemoryNoteStore::new();
        let note = store
            .create_note("u1", &NewNote::new("t", "c"))
            .await
            .expect("create should succeed");

        let updated = store
            .update_note("u1", &note.id, &NotePatch::new().title("t2"))
            .await
            .expect("update should succeed");
        assert!(updated.updated_at > note.updated_at);
        assert_eq!(updated.created_at, note.created_at);

        let foreign = store
            .update_note("u2", &note.id, &NotePatch::new().title("x"))
            .await
            .expect_err("other owner must not see the note");
        assert_eq!(foreign, StoreError::NotFound(note.id.clone()));
    }

    #[tokio::test]
    async fn list_and_search_are_newest_first_and_case_insensitive() {
        let store = MemoryNoteStore::new();
        let first = store
            .create_note("u1", &NewNote::new("Shopping", "Buy MILK"))
            .await
            .expect("create should succeed");
        let second = store
            .create_note("u1", &NewNote::new("Milk recipes", "pancakes"))
            .await
            .expect("create should succeed");
        store
            .create_note("u2", &NewNote::new("milk", "not mine"))
            .await
            .expect("create should succeed");

        let listed = store.list_notes("u1").await.expect("list should succeed");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);

        let hits = store
            .search_notes("u1", " milk ")
            .await
            .expect("search should succeed");
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn subscribers_receive_owner_events_and_closed_ones_are_pruned() {
        let store = MemoryNoteStore::new();
        let mut mine = store.subscribe("u1").expect("subscribe should succeed");
        let theirs = store.subscribe("u2").expect("subscribe should succeed");
        drop(theirs);

        let note = store
            .create_note("u1", &NewNote::new("t", "c"))
            .await
            .expect("create should succeed");
        store
            .delete_note("u1", &note.id)
            .await
            .expect("delete should succeed");

        assert_eq!(mine.recv().await, Some(RemoteEvent::Inserted(note.clone())));
        assert_eq!(mine.recv().await, Some(RemoteEvent::Deleted(note.id)));
        assert_eq!(store.live_subscriptions(), 1);
    }
}
