//! Note summarization: model capability, prompts, heuristic fallback and
//! the orchestrating pipeline.

pub mod batch;
pub mod heuristic;
pub mod model;
pub mod pipeline;
pub mod prompt;
