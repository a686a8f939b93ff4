//! Text-completion seam
//!
//! Everything that talks to a language model goes through the
//! [`TextCompletion`] trait. The rest of the pipeline never constructs
//! prompts against a concrete API; it asks the seam for text and treats
//! any failure as degradable. [`client::ChatCompletionClient`] is the
//! production implementation; tests script the seam instead.

pub mod client;

#[cfg(test)]
pub mod testing;

use async_trait::async_trait;

use crate::core::error::CompletionError;

pub use client::{ChatClientConfig, ChatCompletionClient, RateLimiter, UsageStats};

/// A single completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Optional system prompt.
    pub system: Option<String>,

    /// User prompt.
    pub prompt: String,

    /// Maximum tokens to generate.
    pub max_tokens: u32,

    /// Sampling temperature.
    pub temperature: f32,
}

impl CompletionRequest {
    /// Create a request with the default generation settings.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            max_tokens: 500,
            temperature: 0.3,
        }
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the maximum number of generated tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// A completed generation.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated text.
    pub text: String,

    /// Total tokens reported by the backend, when available.
    pub total_tokens: Option<u32>,

    /// Round-trip duration in milliseconds.
    pub duration_ms: u64,
}

/// Narrow seam for text generation.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Run one completion. Implementations enforce their own timeout;
    /// callers treat every error as degradable.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError>;

    /// Whether the backend can currently serve requests.
    fn is_available(&self) -> bool {
        true
    }
}

/// Always-off backend used when completion is disabled in config.
#[derive(Debug, Default)]
pub struct DisabledCompletion;

#[async_trait]
impl TextCompletion for DisabledCompletion {
    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        Err(CompletionError::Disabled)
    }

    fn is_available(&self) -> bool {
        false
    }
}
