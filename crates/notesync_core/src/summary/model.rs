//! Summary model capability.
//!
//! # Responsibility
//! - Describe the text-completion capability the pipeline consumes.
//!
//! # Invariants
//! - Implementations may be unconfigured; callers check `is_configured`
//!   before issuing requests.
//! - Raw output carries no format guarantee, even when JSON was requested.

use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    /// Optional system instruction.
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the backend for a JSON object response when it supports that.
    pub expect_json: bool,
}

impl ModelRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            temperature: 0.3,
            max_tokens: 100,
            expect_json: false,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn expecting_json(mut self) -> Self {
        self.expect_json = true;
        self
    }
}

/// Failure reported by a model backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    Unauthorized(String),
    QuotaExceeded(String),
    Transport(String),
    /// Backend answered with no usable text.
    EmptyResponse,
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized(message) => write!(f, "model authorization failed: {message}"),
            Self::QuotaExceeded(message) => write!(f, "model quota exceeded: {message}"),
            Self::Transport(message) => write!(f, "model call failed: {message}"),
            Self::EmptyResponse => write!(f, "model returned an empty response"),
        }
    }
}

impl Error for ModelError {}

/// Remote text model used for summaries.
#[async_trait]
pub trait SummaryModel: Send + Sync {
    fn is_configured(&self) -> bool;
    async fn complete(&self, request: &ModelRequest) -> Result<String, ModelError>;
}

/// Model placeholder for deployments without credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredModel;

#[async_trait]
impl SummaryModel for UnconfiguredModel {
    fn is_configured(&self) -> bool {
        false
    }

    async fn complete(&self, _request: &ModelRequest) -> Result<String, ModelError> {
        Err(ModelError::Unauthorized("no model configured".to_string()))
    }
}
