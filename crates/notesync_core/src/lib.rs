//! Client-side note synchronization with AI summary fallbacks.
//!
//! `sync` keeps a local collection consistent with a remote note store;
//! `summary` derives summaries and categories with graceful degradation.

pub mod config;
pub mod logging;
pub mod model;
pub mod store;
pub mod summary;
pub mod sync;

pub use config::{ConfigError, CoreConfig, LoggingConfig, SummaryConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{
    normalize_tags, NewNote, Note, NoteCategory, NoteId, NotePatch, NoteValidationError, OwnerId,
};
pub use store::memory::MemoryNoteStore;
pub use store::remote::{NoteStore, RemoteEvent, RemoteEventReceiver, StoreError, StoreResult};
pub use summary::batch::{needs_summary, BatchReport};
pub use summary::heuristic::{generate_summary, truncate_text};
pub use summary::model::{ModelError, ModelRequest, SummaryModel, UnconfiguredModel};
pub use summary::pipeline::{
    parse_analysis, RequestPhase, Sentiment, SummaryAnalysis, SummaryError, SummaryPipeline,
};
pub use summary::prompt::{SummaryLanguage, SummaryLength, SummaryOptions, SummaryStyle};
pub use sync::engine::{NoteSyncEngine, SessionContext, SyncError, SyncResult};
pub use sync::state::{
    MergeOutcome, Selection, SyncAction, SyncFailure, SyncOperation, SyncState, SyncStatus,
};
pub use sync::view::SortKey;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
