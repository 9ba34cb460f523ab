//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical note record shared by the sync engine and the
//!   summary pipeline.
//! - Validate user input before it can reach the remote store.
//!
//! # Invariants
//! - `id` is assigned by the remote store and never changes afterwards.
//! - `title` is non-empty and at most `TITLE_MAX_CHARS` characters.
//! - `content` is non-empty.
//! - `updated_at >= created_at`.
//! - `tags` never contain blanks or duplicates; first-insertion order is kept.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

/// Opaque store-assigned note identifier.
pub type NoteId = String;

/// Identifier of the user owning a note.
pub type OwnerId = String;

/// Maximum title length, counted in characters.
pub const TITLE_MAX_CHARS: usize = 200;

const RECENT_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;
const EDIT_THRESHOLD_MS: i64 = 60 * 1000;

/// Fixed category set a note can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteCategory {
    Work,
    Personal,
    Learning,
    Projects,
    Ideas,
    Meetings,
    Tasks,
    Shopping,
    Travel,
    Other,
    /// Placeholder used when no model is available to classify the note.
    General,
}

impl NoteCategory {
    /// Categories a model is allowed to pick from.
    pub const ASSIGNABLE: [NoteCategory; 10] = [
        NoteCategory::Work,
        NoteCategory::Personal,
        NoteCategory::Learning,
        NoteCategory::Projects,
        NoteCategory::Ideas,
        NoteCategory::Meetings,
        NoteCategory::Tasks,
        NoteCategory::Shopping,
        NoteCategory::Travel,
        NoteCategory::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::Personal => "Personal",
            Self::Learning => "Learning",
            Self::Projects => "Projects",
            Self::Ideas => "Ideas",
            Self::Meetings => "Meetings",
            Self::Tasks => "Tasks",
            Self::Shopping => "Shopping",
            Self::Travel => "Travel",
            Self::Other => "Other",
            Self::General => "General",
        }
    }

    /// Parses a free-form label, e.g. a model reply like `"Work."`.
    ///
    /// Matching is trimmed and case-insensitive; surrounding quotes and a
    /// trailing period are ignored.
    pub fn parse(value: &str) -> Option<Self> {
        let cleaned = value
            .trim()
            .trim_end_matches('.')
            .trim_matches(|c: char| matches!(c, '"' | '\'' | '`'))
            .trim();
        Self::ASSIGNABLE
            .iter()
            .chain(std::iter::once(&Self::General))
            .copied()
            .find(|category| category.as_str().eq_ignore_ascii_case(cleaned))
    }

    /// Comma-separated list used inside model prompts.
    pub fn prompt_list() -> String {
        Self::ASSIGNABLE
            .iter()
            .map(|category| category.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Display for NoteCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical note record as persisted by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    /// User-authored, model-generated or heuristic summary.
    pub summary: Option<String>,
    pub category: Option<NoteCategory>,
    pub tags: Option<Vec<String>>,
    /// Never user-editable.
    pub owner_id: OwnerId,
    /// Unix epoch milliseconds, server-assigned.
    pub created_at: i64,
    /// Unix epoch milliseconds, server-assigned. Always `>= created_at`.
    pub updated_at: i64,
}

impl Note {
    /// Validates record-level invariants.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.id.trim().is_empty() {
            return Err(NoteValidationError::EmptyId);
        }
        validate_title(&self.title)?;
        validate_content(&self.content)?;
        if self.updated_at < self.created_at {
            return Err(NoteValidationError::TimestampOrder {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }

    /// Returns whether the note was created within the last 24 hours.
    pub fn is_recently_created(&self, now_ms: i64) -> bool {
        now_ms - self.created_at <= RECENT_WINDOW_MS
    }

    /// Returns whether the note was edited more than a minute after creation.
    pub fn was_recently_edited(&self) -> bool {
        self.updated_at - self.created_at > EDIT_THRESHOLD_MS
    }

    /// Applies a patch in place. Used by store implementations.
    pub fn apply_patch(&mut self, patch: &NotePatch) {
        if let Some(title) = &patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(summary) = &patch.summary {
            self.summary = summary.clone();
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags
                .as_ref()
                .map(|values| normalize_tags(values))
                .filter(|values| !values.is_empty());
        }
    }
}

/// Input for creating a note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub category: Option<NoteCategory>,
    pub tags: Vec<String>,
}

impl NewNote {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_category(mut self, category: NoteCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<(), NoteValidationError> {
        validate_title(&self.title)?;
        validate_content(&self.content)
    }
}

/// Partial update for an existing note.
///
/// Outer `None` leaves a field untouched; `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<NoteCategory>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Option<Vec<String>>>,
}

impl NotePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn summary(mut self, summary: Option<String>) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn category(mut self, category: Option<NoteCategory>) -> Self {
        self.category = Some(category);
        self
    }

    pub fn tags(mut self, tags: Option<Vec<String>>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.summary.is_none()
            && self.category.is_none()
            && self.tags.is_none()
    }

    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.is_empty() {
            return Err(NoteValidationError::EmptyPatch);
        }
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(content) = &self.content {
            validate_content(content)?;
        }
        Ok(())
    }
}

/// Validation error for note input and records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    EmptyId,
    EmptyTitle,
    TitleTooLong { chars: usize },
    EmptyContent,
    EmptyPatch,
    TimestampOrder { created_at: i64, updated_at: i64 },
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "note id cannot be empty"),
            Self::EmptyTitle => write!(f, "note title cannot be empty"),
            Self::TitleTooLong { chars } => write!(
                f,
                "note title has {chars} characters; at most {TITLE_MAX_CHARS} allowed"
            ),
            Self::EmptyContent => write!(f, "note content cannot be empty"),
            Self::EmptyPatch => write!(f, "note update has no fields to change"),
            Self::TimestampOrder {
                created_at,
                updated_at,
            } => write!(
                f,
                "updated_at ({updated_at}) is earlier than created_at ({created_at})"
            ),
        }
    }
}

impl Error for NoteValidationError {}

/// Trims tags, drops blanks and suppresses duplicates, keeping first-seen order.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.to_string()))
        .map(str::to_string)
        .collect()
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn epoch_millis_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

fn validate_title(title: &str) -> Result<(), NoteValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(NoteValidationError::EmptyTitle);
    }
    let chars = trimmed.chars().count();
    if chars > TITLE_MAX_CHARS {
        return Err(NoteValidationError::TitleTooLong { chars });
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<(), NoteValidationError> {
    if content.trim().is_empty() {
        return Err(NoteValidationError::EmptyContent);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{normalize_tags, NewNote, Note, NoteCategory, NotePatch, NoteValidationError};

    fn sample_note() -> Note {
        Note {
            id: "n1".to_string(),
            title: "Groceries".to_string(),
            content: "milk, eggs".to_string(),
            summary: None,
            category: None,
            tags: None,
            owner_id: "u1".to_string(),
            created_at: 1_000,
            updated_at: 1_000,
        }
    }

    #[test]
    fn new_note_rejects_blank_title_and_content() {
        assert_eq!(
            NewNote::new("   ", "body").validate(),
            Err(NoteValidationError::EmptyTitle)
        );
        assert_eq!(
            NewNote::new("title", "\n\t").validate(),
            Err(NoteValidationError::EmptyContent)
        );
    }

    #[test]
    fn title_limit_counts_characters_not_bytes() {
        let exactly_max = "ż".repeat(200);
        assert!(NewNote::new(exactly_max, "body").validate().is_ok());

        let too_long = "a".repeat(201);
        assert_eq!(
            NewNote::new(too_long, "body").validate(),
            Err(NoteValidationError::TitleTooLong { chars: 201 })
        );
    }

    #[test]
    fn note_validate_rejects_inverted_timestamps() {
        let mut note = sample_note();
        note.updated_at = 999;
        assert!(matches!(
            note.validate(),
            Err(NoteValidationError::TimestampOrder { .. })
        ));
    }

    #[test]
    fn normalize_tags_dedupes_and_keeps_first_order() {
        let tags = vec![
            " work ".to_string(),
            "home".to_string(),
            "work".to_string(),
            "".to_string(),
            "Home".to_string(),
        ];
        assert_eq!(
            normalize_tags(&tags),
            vec!["work".to_string(), "home".to_string(), "Home".to_string()]
        );
    }

    #[test]
    fn empty_patch_is_rejected() {
        assert_eq!(
            NotePatch::new().validate(),
            Err(NoteValidationError::EmptyPatch)
        );
        assert!(NotePatch::new().summary(None).validate().is_ok());
    }

    #[test]
    fn apply_patch_clears_nullable_fields() {
        let mut note = sample_note();
        note.summary = Some("old".to_string());
        note.apply_patch(
            &NotePatch::new()
                .title("  Errands ")
                .summary(None)
                .tags(Some(vec!["a".to_string(), "a".to_string()])),
        );
        assert_eq!(note.title, "Errands");
        assert_eq!(note.summary, None);
        assert_eq!(note.tags, Some(vec!["a".to_string()]));
    }

    #[test]
    fn category_parse_is_lenient() {
        assert_eq!(NoteCategory::parse(" work. "), Some(NoteCategory::Work));
        assert_eq!(NoteCategory::parse("\"Travel\""), Some(NoteCategory::Travel));
        assert_eq!(NoteCategory::parse("Gardening"), None);
    }

    #[test]
    fn recency_helpers_use_fixed_windows() {
        let mut note = sample_note();
        assert!(note.is_recently_created(1_000 + 24 * 60 * 60 * 1000));
        assert!(!note.is_recently_created(1_001 + 24 * 60 * 60 * 1000));

        note.updated_at = note.created_at + 30_000;
        assert!(!note.was_recently_edited());
        note.updated_at = note.created_at + 5 * 60_000;
        assert!(note.was_recently_edited());
    }
}
