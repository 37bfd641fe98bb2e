//! LLM Provider Strategy Pattern
//!
//! Defines the interface the Completion Client talks through, so the pipelines
//! work with OpenAI, a local model, or a test double without code changes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use insight_core::provider::{GenerationOptions, LlmProvider};
//!
//! let provider = OpenAiProvider::from_env();
//! if provider.is_configured() {
//!     let completion = provider.complete(&messages, &GenerationOptions::default()).await?;
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;

/// Default chat model
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "gpt-4o-mini")
    pub model: String,

    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate (provider default when unset)
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Upper bound on the whole request
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
}

const fn default_temperature() -> f32 {
    0.7
}

const fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            temperature: default_temperature(),
            max_tokens: None,
            timeout: default_timeout(),
        }
    }
}

impl GenerationOptions {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Response from an LLM completion
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Completion {
    /// The generated text
    pub content: String,

    /// Model that generated this response
    pub model: String,

    /// Token usage statistics (if available)
    pub usage: Option<TokenUsage>,

    /// Finish reason
    pub finish_reason: Option<FinishReason>,
}

/// Token usage statistics
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason for completion finishing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Other,
}

impl FinishReason {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "stop" => Self::Stop,
            "length" => Self::Length,
            "content_filter" => Self::ContentFilter,
            _ => Self::Other,
        }
    }
}

/// Strategy trait for chat-completion providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logs (e.g., "OpenAI")
    fn name(&self) -> &str;

    /// Whether a usable credential is present. Must not touch the network.
    fn is_configured(&self) -> bool;

    /// Generate a completion from messages
    async fn complete(&self, messages: &[Message], options: &GenerationOptions)
    -> Result<Completion>;
}

/// Strategy trait for text-embedding providers
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Whether a usable credential is present. Must not touch the network.
    fn is_configured(&self) -> bool;

    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Vector dimension produced by `embed`
    fn dimension(&self) -> usize;
}

/// A credential counts as present only when it has non-whitespace content
pub fn credential_present(key: Option<&str>) -> bool {
    key.is_some_and(|k| !k.trim().is_empty())
}
