//! Core configuration.
//!
//! # Responsibility
//! - Hold tunables for logging and the summary pipeline.
//! - Parse and validate JSON configuration documents.
//!
//! # Invariants
//! - Every field has a default; an empty document `{}` is valid.
//! - Validated configs have non-zero budgets and a confidence in `[0, 1]`.

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub logging: LoggingConfig,
    pub summary: SummaryConfig,
}

impl CoreConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.summary.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error`.
    pub level: String,
    /// Absolute directory for rolling log files. `None` disables file logging.
    pub log_dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

/// Summary pipeline tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Content characters sent with a quick-summary prompt.
    pub quick_prompt_chars: usize,
    /// Content characters sent with a categorization prompt.
    pub category_prompt_chars: usize,
    /// Content characters sent with a tag-generation prompt.
    pub tag_prompt_chars: usize,
    pub max_tags: usize,
    pub max_key_points: usize,
    /// Confidence substituted when the model omits or garbles it.
    pub default_confidence: f32,
    /// Default number of notes one batch run may process.
    pub batch_limit: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            quick_prompt_chars: 1_000,
            category_prompt_chars: 500,
            tag_prompt_chars: 500,
            max_tags: 5,
            max_key_points: 5,
            default_confidence: 0.8,
            batch_limit: 10,
        }
    }
}

impl SummaryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let budgets = [
            ("summary.quick_prompt_chars", self.quick_prompt_chars),
            ("summary.category_prompt_chars", self.category_prompt_chars),
            ("summary.tag_prompt_chars", self.tag_prompt_chars),
            ("summary.max_tags", self.max_tags),
            ("summary.max_key_points", self.max_key_points),
            ("summary.batch_limit", self.batch_limit),
        ];
        for (field, value) in budgets {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        if !(0.0..=1.0).contains(&self.default_confidence) {
            return Err(ConfigError::Invalid {
                field: "summary.default_confidence",
                reason: format!("{} is outside [0, 1]", self.default_confidence),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse(String),
    Invalid { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "invalid config document: {message}"),
            Self::Invalid { field, reason } => write!(f, "invalid config `{field}`: {reason}"),
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, SummaryConfig};

    #[test]
    fn empty_document_yields_defaults() {
        let config = CoreConfig::from_json_str("{}").expect("empty config should parse");
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.summary.batch_limit, 10);
    }

    #[test]
    fn partial_document_overrides_only_given_fields() {
        let config = CoreConfig::from_json_str(
            r#"{"summary": {"batch_limit": 3}, "logging": {"level": "warn"}}"#,
        )
        .expect("partial config should parse");
        assert_eq!(config.summary.batch_limit, 3);
        assert_eq!(
            config.summary.quick_prompt_chars,
            SummaryConfig::default().quick_prompt_chars
        );
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.log_dir, None);
    }

    #[test]
    fn rejects_zero_budget_and_bad_confidence() {
        let zero = CoreConfig::from_json_str(r#"{"summary": {"max_tags": 0}}"#)
            .expect_err("zero budget must be rejected");
        assert!(matches!(
            zero,
            ConfigError::Invalid {
                field: "summary.max_tags",
                ..
            }
        ));

        let confidence = CoreConfig::from_json_str(r#"{"summary": {"default_confidence": 1.5}}"#)
            .expect_err("confidence above one must be rejected");
        assert!(confidence.to_string().contains("default_confidence"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = CoreConfig::from_json_str("{not json").expect_err("must fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
