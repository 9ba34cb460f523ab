//! Read-side filtering and sorting.
//!
//! Pure functions over a note collection; safe to call on every render.

use crate::model::note::Note;
use icu_collator::{Collator, CollatorOptions};
use icu_locid::locale;
use log::warn;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Ordering applied by [`view`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// `created_at` descending.
    #[default]
    NewestFirst,
    OldestFirst,
    /// Title, Polish collation order.
    Title,
    /// `updated_at` descending.
    RecentlyUpdated,
}

/// Filters by `query` (blank matches everything) and sorts by `sort`.
///
/// Ties are broken by id so the result is deterministic.
pub fn view<'a, I>(notes: I, query: &str, sort: SortKey) -> Vec<Note>
where
    I: IntoIterator<Item = &'a Note>,
{
    let needle = query.trim().to_lowercase();
    let mut selected: Vec<Note> = notes
        .into_iter()
        .filter(|note| needle.is_empty() || matches_query(note, &needle))
        .cloned()
        .collect();
    let collator = match sort {
        SortKey::Title => title_collator(),
        _ => None,
    };
    selected.sort_by(|a, b| {
        compare(a, b, sort, collator.as_ref()).then_with(|| a.id.cmp(&b.id))
    });
    selected
}

/// Case-insensitive match over title, content and summary.
///
/// `needle` must already be lowercased.
pub fn matches_query(note: &Note, needle: &str) -> bool {
    note.title.to_lowercase().contains(needle)
        || note.content.to_lowercase().contains(needle)
        || note
            .summary
            .as_deref()
            .is_some_and(|summary| summary.to_lowercase().contains(needle))
}

fn compare(a: &Note, b: &Note, sort: SortKey, collator: Option<&Collator>) -> Ordering {
    match sort {
        SortKey::NewestFirst => b.created_at.cmp(&a.created_at),
        SortKey::OldestFirst => a.created_at.cmp(&b.created_at),
        SortKey::Title => compare_titles(collator, &a.title, &b.title),
        SortKey::RecentlyUpdated => b.updated_at.cmp(&a.updated_at),
    }
}

/// Collator for the notes' primary language. `None` if locale data is
/// missing, in which case titles compare case-folded.
fn title_collator() -> Option<Collator> {
    match Collator::try_new(&locale!("pl").into(), CollatorOptions::new()) {
        Ok(collator) => Some(collator),
        Err(err) => {
            warn!("event=collator_init module=sync status=error error={err}");
            None
        }
    }
}

fn compare_titles(collator: Option<&Collator>, a: &str, b: &str) -> Ordering {
    let primary = match collator {
        Some(collator) => collator.compare(a, b),
        None => a.to_lowercase().cmp(&b.to_lowercase()),
    };
    primary.then_with(|| a.cmp(b))
}
