//! CLI smoke entry point.
//!
//! # Responsibility
//! - Wire `notesync_core` end to end against the in-memory store.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `notesync_cli [TITLE] [CONTENT]`. Configuration is read from the
//! JSON file named by `NOTESYNC_CONFIG`, when set.

use log::info;
use notesync_core::{
    core_version, init_logging, CoreConfig, MemoryNoteStore, NewNote, NoteSyncEngine,
    SessionContext, SummaryPipeline, UnconfiguredModel,
};
use std::error::Error;
use std::sync::Arc;

const CONFIG_ENV: &str = "NOTESYNC_CONFIG";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = load_config()?;
    if config.logging.log_dir.is_some() {
        init_logging(&config.logging)?;
    }

    let mut args = std::env::args().skip(1);
    let title = args.next().unwrap_or_else(|| "Scratch".to_string());
    let content = args
        .next()
        .unwrap_or_else(|| "Notes written from the command line stay in memory.".to_string());

    let store = Arc::new(MemoryNoteStore::new());
    let engine = NoteSyncEngine::new(store, SessionContext::new("cli"));
    let pipeline =
        SummaryPipeline::with_config(Arc::new(UnconfiguredModel), config.summary.clone());

    engine.load().await?;
    let note = engine.create(NewNote::new(title, content)).await?;
    let quick = pipeline.quick_summary(&note.content, Some(&note.title)).await;
    let category = pipeline.categorize(&note.content, Some(&note.title)).await;
    info!(
        "event=cli_run module=cli status=ok note_id={} notes={}",
        note.id,
        engine.notes().len()
    );

    println!("notesync_core version={}", core_version());
    println!("note id={} title={}", note.id, note.title);
    println!("summary={}", note.summary.as_deref().unwrap_or_default());
    println!("quick_summary={quick}");
    println!("category={category}");
    Ok(())
}

fn load_config() -> Result<CoreConfig, Box<dyn Error>> {
    match std::env::var(CONFIG_ENV) {
        Ok(path) => {
            let raw = std::fs::read_to_string(&path)
                .map_err(|err| format!("cannot read {CONFIG_ENV} file `{path}`: {err}"))?;
            Ok(CoreConfig::from_json_str(&raw)?)
        }
        Err(_) => Ok(CoreConfig::default()),
    }
}
