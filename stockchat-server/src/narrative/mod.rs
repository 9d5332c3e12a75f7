//! Narrative generation through an LLM provider.
//!
//! The generator is text in, text out: callers build the prompt from
//! records and free text, and the returned narrative goes back to the user
//! unchanged.

mod openai;
pub mod prompts;

pub use openai::OpenAiNarrativeGenerator;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use stockchat_common::util::{sanitize_for_log, truncate_with_ellipsis};
use stockchat_common::Error;

/// Longest provider error body carried into an error response.
const MAX_ERROR_DETAILS_CHARS: usize = 2000;

// ============================================================================
// Generator Trait
// ============================================================================

/// Produces narrative text for a prompt.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Generate text for `request`.
    ///
    /// `Ok(None)` means the provider answered without any content; callers
    /// substitute their own fallback text.
    async fn generate(&self, request: NarrativeRequest) -> Result<Option<String>, NarrativeError>;
}

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeRequest {
    pub model: String,
    /// Optional system instruction, sent ahead of the prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl NarrativeRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            prompt: prompt.into(),
            max_tokens: 1000,
            temperature: 0.7,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum NarrativeError {
    /// The provider could not be reached
    #[error("request failed: {0}")]
    Transport(String),

    /// The provider answered with a non-success status
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// The provider's answer could not be decoded
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl NarrativeError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn details(&self) -> String {
        let raw = match self {
            Self::Transport(message) | Self::InvalidResponse(message) => message.as_str(),
            Self::Api { body, .. } => body.as_str(),
        };
        truncate_with_ellipsis(&sanitize_for_log(raw), MAX_ERROR_DETAILS_CHARS)
    }
}

impl From<NarrativeError> for Error {
    fn from(err: NarrativeError) -> Self {
        let details = err.details();
        warn!(
            provider_status = ?err.status_code(),
            details = %details,
            "Narrative generation failed"
        );
        match err {
            NarrativeError::Transport(_) => {
                Error::upstream_with_details("Failed to call OpenAI API", details)
            }
            NarrativeError::Api { .. } | NarrativeError::InvalidResponse(_) => {
                Error::upstream_with_details("OpenAI API error", details)
            }
        }
    }
}
