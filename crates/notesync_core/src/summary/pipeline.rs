//! Model-backed summaries with graceful degradation.
//!
//! # Responsibility
//! - Run detailed analysis, quick summaries, categorization and tagging
//!   against the summary model.
//! - Fall back to the heuristic summarizer or fixed defaults whenever the
//!   model is unconfigured, fails, or answers with unusable output.
//!
//! # Invariants
//! - `quick_summary`, `categorize` and `generate_tags` never return an error.
//! - A failed or malformed analysis response degrades field by field; it
//!   never aborts the call.
//! - Request phases move `Idle -> Requesting -> Succeeded | Failed`.

use crate::config::SummaryConfig;
use crate::model::note::NoteCategory;
use crate::summary::heuristic::{count_words, generate_summary};
use crate::summary::model::{ModelError, ModelRequest, SummaryModel};
use crate::summary::prompt::{
    analysis_request, category_request, quick_request, tags_request, SummaryOptions,
};
use log::{debug, warn};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

static JSON_OBJECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid json object regex"));

/// Lifecycle of the most recent model request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestPhase {
    #[default]
    Idle,
    Requesting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "neutral" => Some(Self::Neutral),
            "negative" => Some(Self::Negative),
            _ => None,
        }
    }
}

/// Structured result of a detailed analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryAnalysis {
    pub summary: String,
    pub key_points: Vec<String>,
    pub category: NoteCategory,
    pub sentiment: Sentiment,
    /// Words in `summary`.
    pub word_count: usize,
    /// In `[0, 1]`.
    pub confidence: f32,
    /// True when at least one field was substituted with a default.
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryError {
    /// No model is configured.
    ModelUnavailable,
    EmptyContent,
}

impl Display for SummaryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ModelUnavailable => write!(f, "summary model is not configured"),
            Self::EmptyContent => write!(f, "note content cannot be empty"),
        }
    }
}

impl Error for SummaryError {}

/// Orchestrates summary model calls and their fallbacks.
pub struct SummaryPipeline {
    model: Arc<dyn SummaryModel>,
    config: SummaryConfig,
    phase: Mutex<RequestPhase>,
}

impl SummaryPipeline {
    pub fn new(model: Arc<dyn SummaryModel>) -> Self {
        Self::with_config(model, SummaryConfig::default())
    }

    pub fn with_config(model: Arc<dyn SummaryModel>, config: SummaryConfig) -> Self {
        Self {
            model,
            config,
            phase: Mutex::new(RequestPhase::Idle),
        }
    }

    pub fn config(&self) -> &SummaryConfig {
        &self.config
    }

    pub fn is_available(&self) -> bool {
        self.model.is_configured()
    }

    /// Phase of the most recent model request.
    pub fn phase(&self) -> RequestPhase {
        *self.phase.lock()
    }

    /// Full structured analysis.
    ///
    /// # Errors
    /// - `ModelUnavailable` when no model is configured.
    /// - `EmptyContent` for blank content.
    ///
    /// A failed call or unparseable output is not an error: the result is
    /// built from defaults and marked `degraded`; see [`parse_analysis`].
    pub async fn detailed_analysis(
        &self,
        content: &str,
        title: Option<&str>,
        options: &SummaryOptions,
    ) -> Result<SummaryAnalysis, SummaryError> {
        if !self.is_available() {
            return Err(SummaryError::ModelUnavailable);
        }
        if content.trim().is_empty() {
            return Err(SummaryError::EmptyContent);
        }

        let raw = self
            .request("analysis", &analysis_request(content, title, options))
            .await
            .unwrap_or_default();
        let analysis = parse_analysis(&raw, content, &self.config);
        if analysis.degraded {
            warn!("event=summary_analysis module=summary status=degraded");
        }
        Ok(analysis)
    }

    /// One-to-two sentence summary. Falls back to the heuristic on any
    /// problem. Blank content never reaches the model.
    pub async fn quick_summary(&self, content: &str, title: Option<&str>) -> String {
        if !self.is_available() || content.trim().is_empty() {
            return generate_summary(content);
        }

        let request = quick_request(content, title, self.config.quick_prompt_chars);
        match self.request("quick", &request).await {
            Ok(summary) => summary,
            Err(_) => generate_summary(content),
        }
    }

    /// Category from the fixed set.
    ///
    /// `General` when unconfigured; `Other` for failures or labels outside
    /// the set.
    pub async fn categorize(&self, content: &str, title: Option<&str>) -> NoteCategory {
        if !self.is_available() {
            return NoteCategory::General;
        }

        let request = category_request(content, title, self.config.category_prompt_chars);
        match self.request("category", &request).await {
            Ok(label) => match NoteCategory::parse(&label) {
                Some(category) if category != NoteCategory::General => category,
                _ => {
                    debug!("event=summary_category module=summary status=unknown_label");
                    NoteCategory::Other
                }
            },
            Err(_) => NoteCategory::Other,
        }
    }

    /// Up to `max_tags` tags. Empty when unconfigured or on failure.
    pub async fn generate_tags(&self, content: &str, title: Option<&str>) -> Vec<String> {
        if !self.is_available() {
            return Vec::new();
        }

        let request = tags_request(content, title, self.config.tag_prompt_chars);
        match self.request("tags", &request).await {
            Ok(raw) => {
                let mut seen = HashSet::new();
                raw.split(',')
                    .map(|tag| tag.trim().trim_start_matches('#').trim())
                    .filter(|tag| !tag.is_empty())
                    .filter(|tag| seen.insert(tag.to_string()))
                    .take(self.config.max_tags)
                    .map(str::to_string)
                    .collect()
            }
            Err(_) => Vec::new(),
        }
    }

    async fn request(&self, kind: &str, request: &ModelRequest) -> Result<String, ModelError> {
        self.set_phase(RequestPhase::Requesting);
        let result = self
            .model
            .complete(request)
            .await
            .and_then(|raw| {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    Err(ModelError::EmptyResponse)
                } else {
                    Ok(trimmed.to_string())
                }
            });

        match &result {
            Ok(_) => {
                self.set_phase(RequestPhase::Succeeded);
                debug!("event=model_call module=summary status=ok kind={kind}");
            }
            Err(err) => {
                self.set_phase(RequestPhase::Failed);
                warn!("event=model_call module=summary status=error kind={kind} error={err}");
            }
        }
        result
    }

    fn set_phase(&self, phase: RequestPhase) {
        *self.phase.lock() = phase;
    }
}

/// Parses a raw analysis response, substituting defaults for anything
/// missing or malformed.
///
/// Defaults: heuristic summary of `content`, no key points, `General`
/// category, neutral sentiment, `config.default_confidence`. A category
/// label outside the fixed set becomes `Other`.
pub fn parse_analysis(raw: &str, content: &str, config: &SummaryConfig) -> SummaryAnalysis {
    let object = JSON_OBJECT_RE
        .find(raw)
        .and_then(|found| serde_json::from_str::<Value>(found.as_str()).ok())
        .filter(Value::is_object)
        .unwrap_or(Value::Null);
    let mut degraded = false;

    let summary = match object.get("summary").and_then(Value::as_str).map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => {
            degraded = true;
            generate_summary(content)
        }
    };

    let key_points = match object
        .get("keyPoints")
        .or_else(|| object.get("key_points"))
        .and_then(Value::as_array)
    {
        Some(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|point| !point.is_empty())
            .take(config.max_key_points)
            .map(str::to_string)
            .collect(),
        None => {
            degraded = true;
            Vec::new()
        }
    };

    let category = match object.get("category").and_then(Value::as_str) {
        Some(label) => NoteCategory::parse(label).unwrap_or_else(|| {
            degraded = true;
            NoteCategory::Other
        }),
        None => {
            degraded = true;
            NoteCategory::General
        }
    };

    let sentiment = match object
        .get("sentiment")
        .and_then(Value::as_str)
        .and_then(Sentiment::parse)
    {
        Some(value) => value,
        None => {
            degraded = true;
            Sentiment::Neutral
        }
    };

    let confidence = match object.get("confidence").and_then(Value::as_f64) {
        Some(value) if value.is_finite() => value.clamp(0.0, 1.0) as f32,
        _ => {
            degraded = true;
            config.default_confidence
        }
    };

    SummaryAnalysis {
        word_count: count_words(&summary),
        summary,
        key_points,
        category,
        sentiment,
        confidence,
        degraded,
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_analysis, Sentiment};
    use crate::config::SummaryConfig;
    use crate::model::note::NoteCategory;

    #[test]
    fn parses_well_formed_response_inside_code_fence() {
        let raw = "```json\n{\"summary\": \"Plan the trip.\", \"keyPoints\": [\"book\", \"pack\"], \
                   \"category\": \"Travel\", \"sentiment\": \"positive\", \"confidence\": 0.93}\n```";
        let analysis = parse_analysis(raw, "content", &SummaryConfig::default());

        assert_eq!(analysis.summary, "Plan the trip.");
        assert_eq!(analysis.key_points, vec!["book", "pack"]);
        assert_eq!(analysis.category, NoteCategory::Travel);
        assert_eq!(analysis.sentiment, Sentiment::Positive);
        assert_eq!(analysis.word_count, 3);
        assert!((analysis.confidence - 0.93).abs() < 1e-6);
        assert!(!analysis.degraded);
    }

    #[test]
    fn malformed_response_falls_back_to_defaults() {
        let analysis = parse_analysis(
            "sorry, I cannot do that",
            "Short note.",
            &SummaryConfig::default(),
        );

        assert_eq!(analysis.summary, "Short note.");
        assert!(analysis.key_points.is_empty());
        assert_eq!(analysis.category, NoteCategory::General);
        assert_eq!(analysis.sentiment, Sentiment::Neutral);
        assert!((analysis.confidence - 0.8).abs() < 1e-6);
        assert!(analysis.degraded);
    }

    #[test]
    fn wrong_field_types_degrade_individually() {
        let raw = r#"{"summary": "ok", "keyPoints": "not a list", "category": "Gardening",
                      "sentiment": "ecstatic", "confidence": 7}"#;
        let analysis = parse_analysis(raw, "content", &SummaryConfig::default());

        assert_eq!(analysis.summary, "ok");
        assert!(analysis.key_points.is_empty());
        assert_eq!(analysis.category, NoteCategory::Other);
        assert_eq!(analysis.sentiment, Sentiment::Neutral);
        assert!((analysis.confidence - 1.0).abs() < 1e-6);
        assert!(analysis.degraded);
    }

    #[test]
    fn key_points_are_capped() {
        let raw = r#"{"summary": "s", "key_points": ["1","2","3","4","5","6","7"],
                      "category": "Work", "sentiment": "neutral", "confidence": 0.5}"#;
        let analysis = parse_analysis(raw, "content", &SummaryConfig::default());
        assert_eq!(analysis.key_points.len(), 5);
        assert!(!analysis.degraded);
    }
}
