//! OpenAI Provider
//!
//! Chat completions and embeddings over the OpenAI REST API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use insight_core::{
    error::{InsightError, Result},
    message::Message,
    provider::{
        Completion, DEFAULT_MODEL, EmbeddingProvider, FinishReason, GenerationOptions, LlmProvider, TokenUsage,
        credential_present,
    },
};

use crate::http::{self, client_with_timeout, env_opt, env_secs};

/// OpenAI provider configuration
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// API key; `None` disables the provider
    pub api_key: Option<String>,

    /// API base URL
    pub base_url: String,

    /// Chat model
    pub model: String,

    /// Embedding model
    pub embedding_model: String,

    /// Embedding vector size for `embedding_model`
    pub embedding_dimension: usize,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".into(),
            model: DEFAULT_MODEL.into(),
            embedding_model: "text-embedding-3-small".into(),
            embedding_dimension: 1536,
            timeout: Duration::from_secs(30),
        }
    }
}

impl OpenAiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: env_opt("OPENAI_API_KEY"),
            base_url: env_opt("OPENAI_BASE_URL").unwrap_or(defaults.base_url),
            model: env_opt("OPENAI_MODEL").unwrap_or(defaults.model),
            embedding_model: env_opt("OPENAI_EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            timeout: env_secs("OPENAI_TIMEOUT_SECS", 30),
            ..defaults
        }
    }

    /// Generation options carrying this config's model and timeout
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions::default()
            .with_model(self.model.clone())
            .with_timeout(self.timeout)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// OpenAI LLM and embedding provider
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    pub fn from_config(config: OpenAiConfig) -> Self {
        Self {
            client: client_with_timeout(config.timeout),
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::from_config(OpenAiConfig::from_env())
    }

    pub const fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| InsightError::ProviderUnconfigured("OPENAI_API_KEY is not set".into()))
    }

    fn convert_completion(response: ChatResponse, requested_model: &str) -> Result<Completion> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| InsightError::InvalidResponse("completion has no choices".into()))?;

        Ok(Completion {
            content: choice.message.content.unwrap_or_default(),
            model: response.model.unwrap_or_else(|| requested_model.to_string()),
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason.as_deref().map(FinishReason::parse),
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "OpenAI"
    }

    fn is_configured(&self) -> bool {
        credential_present(self.config.api_key.as_deref())
    }

    async fn complete(&self, messages: &[Message], options: &GenerationOptions) -> Result<Completion> {
        let api_key = self.api_key()?;
        let body = ChatRequest {
            model: &options.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let request = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(api_key)
            .timeout(options.timeout)
            .json(&body);

        let response: ChatResponse = http::send_json(request).await.map_err(http::HttpError::into_provider)?;

        Self::convert_completion(response, &options.model)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn is_configured(&self) -> bool {
        credential_present(self.config.api_key.as_deref())
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let api_key = self.api_key()?;
        let request = self
            .client
            .post(self.endpoint("embeddings"))
            .bearer_auth(api_key)
            .json(&EmbeddingRequest {
                model: &self.config.embedding_model,
                input: text,
            });

        let response: EmbeddingResponse = http::send_json(request).await.map_err(http::HttpError::into_provider)?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| InsightError::InvalidResponse("embedding response has no data".into()))
    }

    fn dimension(&self) -> usize {
        self.config.embedding_dimension
    }
}
