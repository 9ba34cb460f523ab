//! Deterministic offline summarizer and text helpers.
//!
//! # Invariants
//! - Output depends only on the input string; no I/O, no clock, no state.
//! - Lengths are counted in characters, never bytes.

use once_cell::sync::Lazy;
use regex::Regex;

/// A first sentence must be longer than this to be used as the summary.
pub const SENTENCE_MIN_CHARS: usize = 20;
/// A first sentence must be at most this long to be used as the summary.
pub const SENTENCE_MAX_CHARS: usize = 200;
/// Fallback truncation length.
pub const TRUNCATE_CHARS: usize = 100;

static SENTENCE_END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+").expect("valid sentence regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Derives a short summary without any model.
///
/// Rules:
/// - split on runs of `.`, `!`, `?`;
/// - if the trimmed first sentence has more than 20 and at most 200
///   characters, return it with a trailing period;
/// - otherwise return `truncate_text(content, 100)`.
pub fn generate_summary(content: &str) -> String {
    let first_sentence = SENTENCE_END_RE
        .split(content)
        .next()
        .map(str::trim)
        .unwrap_or_default();
    let chars = first_sentence.chars().count();

    if chars > SENTENCE_MIN_CHARS && chars <= SENTENCE_MAX_CHARS {
        return format!("{first_sentence}.");
    }
    truncate_text(content, TRUNCATE_CHARS)
}

/// Returns `text` unchanged if it fits, else its first `max_chars`
/// characters, trimmed, followed by `...`.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{}...", head.trim())
}

/// The untrimmed `first 100 chars + "..."` form older clients stored as a
/// placeholder summary.
pub fn naive_truncation(content: &str) -> String {
    let head: String = content.chars().take(TRUNCATE_CHARS).collect();
    format!("{head}...")
}

pub fn count_words(text: &str) -> usize {
    WHITESPACE_RE
        .split(text.trim())
        .filter(|word| !word.is_empty())
        .count()
}

/// Whole minutes needed to read `text`, rounded up.
pub fn estimate_reading_minutes(text: &str, words_per_minute: usize) -> usize {
    count_words(text).div_ceil(words_per_minute.max(1))
}
