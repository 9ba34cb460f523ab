//! Sequential batch summarization over the synced collection.
//!
//! # Invariants
//! - Notes are processed one at a time, never concurrently.
//! - Each successful item is persisted through the engine before the next
//!   one starts, so partial progress is visible.
//! - A per-item failure is counted and skipped; it never aborts the batch.

use crate::model::note::{Note, NotePatch};
use crate::summary::heuristic::naive_truncation;
use crate::summary::pipeline::{SummaryError, SummaryPipeline};
use crate::sync::engine::NoteSyncEngine;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Aggregate outcome of one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub processed: usize,
    pub failed: usize,
}

/// True when the note has no summary, or only the placeholder truncation.
pub fn needs_summary(note: &Note) -> bool {
    match note.summary.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(summary) => summary == naive_truncation(&note.content).trim(),
    }
}

impl SummaryPipeline {
    /// Summarizes and categorizes up to `limit` notes lacking a real summary.
    ///
    /// `None` uses the configured `batch_limit`.
    ///
    /// # Errors
    /// `ModelUnavailable` when no model is configured; nothing is touched.
    pub async fn batch_summarize(
        &self,
        engine: &NoteSyncEngine,
        limit: Option<usize>,
    ) -> Result<BatchReport, SummaryError> {
        if !self.is_available() {
            return Err(SummaryError::ModelUnavailable);
        }

        let limit = limit.unwrap_or(self.config().batch_limit);
        let candidates: Vec<Note> = engine
            .notes()
            .into_iter()
            .filter(needs_summary)
            .take(limit)
            .collect();
        info!(
            "event=batch_summarize module=summary status=start candidates={}",
            candidates.len()
        );

        let mut report = BatchReport::default();
        for note in candidates {
            let summary = self.quick_summary(&note.content, Some(&note.title)).await;
            let category = self.categorize(&note.content, Some(&note.title)).await;
            let patch = NotePatch::new()
                .summary(Some(summary))
                .category(Some(category));

            match engine.update(&note.id, patch).await {
                Ok(Some(_)) => report.processed += 1,
                Ok(None) => {
                    warn!(
                        "event=batch_summarize module=summary status=skipped note_id={} reason=gone",
                        note.id
                    );
                    report.failed += 1;
                }
                Err(err) => {
                    warn!(
                        "event=batch_summarize module=summary status=item_error note_id={} error={err}",
                        note.id
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            "event=batch_summarize module=summary status=done processed={} failed={}",
            report.processed, report.failed
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::needs_summary;
    use crate::model::note::Note;
    use crate::summary::heuristic::naive_truncation;

    fn note_with_summary(content: &str, summary: Option<&str>) -> Note {
        Note {
            id: "n1".to_string(),
            title: "Title".to_string(),
            content: content.to_string(),
            summary: summary.map(str::to_string),
            category: None,
            tags: None,
            owner_id: "u1".to_string(),
            created_at: 1,
            updated_at: 1,
        }
    }

    #[test]
    fn missing_blank_or_placeholder_summary_needs_work() {
        let content = "z".repeat(150);
        assert!(needs_summary(&note_with_summary(&content, None)));
        assert!(needs_summary(&note_with_summary(&content, Some("  "))));
        assert!(needs_summary(&note_with_summary(
            &content,
            Some(&naive_truncation(&content))
        )));
    }

    #[test]
    fn real_summary_is_left_alone() {
        assert!(!needs_summary(&note_with_summary(
            "Body text",
            Some("A proper summary.")
        )));
    }
}
