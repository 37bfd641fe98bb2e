//! Completion Client
//!
//! The only component that talks to the LLM provider. It owns the degradation
//! policy: no credential, transport failure, timeout, or an unusable answer
//! all resolve to the canned record for the prompt kind. Nothing here returns
//! an error to the pipelines.

use std::sync::Arc;

use crate::availability::{Availability, ProviderAvailability};
use crate::error::{InsightError, Result};
use crate::evidence::EvidenceSet;
use crate::message::Message;
use crate::model::{InsightRecord, StrategyRecord};
use crate::prompt::{self, JSON_ONLY_INSTRUCTION};
use crate::provider::{GenerationOptions, LlmProvider};
use crate::response;

/// Sampling temperature for insight generation
pub const INSIGHT_TEMPERATURE: f32 = 0.7;

/// Sampling temperature for strategy generation; prose should vary more here
pub const STRATEGY_TEMPERATURE: f32 = 0.8;

/// What a completion is asked to produce
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptKind {
    Insights,
    Strategy,
}

impl PromptKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insights => "insights",
            Self::Strategy => "strategy",
        }
    }
}

/// Why a canned value was returned instead of a generated one
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Degradation {
    /// Credential absent, no call made
    Unconfigured,
    /// Transport error, provider error status, or timeout
    ProviderFailure,
    /// Provider answered with something that is not the expected shape
    InvalidResponse,
    /// Unexpected fault caught at a pipeline boundary
    InternalFault,
}

impl Degradation {
    fn from_error(err: &InsightError) -> Self {
        match err {
            InsightError::ProviderUnconfigured(_) => Self::Unconfigured,
            InsightError::Provider(_) | InsightError::Timeout(_) => Self::ProviderFailure,
            InsightError::InvalidResponse(_) | InsightError::Json(_) => Self::InvalidResponse,
            _ => Self::InternalFault,
        }
    }
}

/// Whether a value was generated or is a canned stand-in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Generated,
    Degraded(Degradation),
}

impl Outcome {
    pub const fn is_generated(self) -> bool {
        matches!(self, Self::Generated)
    }
}

/// A value together with how it was obtained
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Generated<T> {
    pub value: T,
    pub outcome: Outcome,
}

impl<T> Generated<T> {
    pub const fn generated(value: T) -> Self {
        Self {
            value,
            outcome: Outcome::Generated,
        }
    }

    pub const fn degraded(value: T, reason: Degradation) -> Self {
        Self {
            value,
            outcome: Outcome::Degraded(reason),
        }
    }
}

/// Wraps an [`LlmProvider`] with availability caching, time bounds, response
/// validation and canned fallbacks.
pub struct CompletionClient {
    provider: Arc<dyn LlmProvider>,
    availability: ProviderAvailability,
    base_options: GenerationOptions,
}

impl CompletionClient {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self::with_options(provider, GenerationOptions::default())
    }

    /// Model and timeout come from `options`; temperature is set per prompt kind
    pub fn with_options(provider: Arc<dyn LlmProvider>, options: GenerationOptions) -> Self {
        Self {
            provider,
            availability: ProviderAvailability::new(),
            base_options: options,
        }
    }

    /// Availability of the provider, probing the credential on first use
    pub fn availability(&self) -> Availability {
        self.availability.resolve(|| {
            let configured = self.provider.is_configured();
            if !configured {
                tracing::warn!(provider = self.provider.name(), "Completion provider has no credential; AI features disabled");
            }
            configured
        })
    }

    /// Generation options for a prompt kind
    pub fn options_for(&self, kind: PromptKind) -> GenerationOptions {
        let temperature = match kind {
            PromptKind::Insights => INSIGHT_TEMPERATURE,
            PromptKind::Strategy => STRATEGY_TEMPERATURE,
        };
        self.base_options.clone().with_temperature(temperature)
    }

    /// Send one prompt and return the raw answer text.
    ///
    /// Fails with `ProviderUnconfigured` without touching the network when no
    /// credential is present.
    pub async fn complete(&self, kind: PromptKind, prompt: &str) -> Result<String> {
        if !self.availability().is_available() {
            return Err(InsightError::ProviderUnconfigured(self.provider.name().to_string()));
        }

        let options = self.options_for(kind);
        let messages = [Message::system(JSON_ONLY_INSTRUCTION), Message::user(prompt)];

        tracing::debug!(
            kind = kind.as_str(),
            model = %options.model,
            prompt_tokens = messages.iter().map(Message::estimate_tokens).sum::<u32>(),
            "Requesting completion"
        );

        let completion = tokio::time::timeout(options.timeout, self.provider.complete(&messages, &options))
            .await
            .map_err(|_| InsightError::Timeout(options.timeout))??;

        if let Some(usage) = &completion.usage {
            tracing::debug!(kind = kind.as_str(), total_tokens = usage.total_tokens, "Completion received");
        }

        Ok(completion.content)
    }

    /// Generate insights from bounded evidence; canned record on any failure
    pub async fn generate_insights(&self, evidence: &EvidenceSet) -> Generated<Vec<InsightRecord>> {
        let prompt = prompt::insight_prompt(evidence);
        let result = self
            .complete(PromptKind::Insights, &prompt)
            .await
            .and_then(|raw| response::parse_insights(&raw));

        match result {
            Ok(insights) => Generated::generated(insights),
            Err(err) => {
                let reason = Degradation::from_error(&err);
                log_degradation(PromptKind::Insights, reason, &err);
                let canned = match reason {
                    Degradation::Unconfigured => InsightRecord::unconfigured(),
                    _ => InsightRecord::generation_failed(),
                };
                Generated::degraded(vec![canned], reason)
            }
        }
    }

    /// Generate a strategy for a goal; canned record on any failure
    pub async fn generate_strategy(&self, goal: &str, market_data: &serde_json::Value) -> Generated<StrategyRecord> {
        let prompt = prompt::strategy_prompt(goal, market_data);
        let result = self
            .complete(PromptKind::Strategy, &prompt)
            .await
            .and_then(|raw| response::parse_strategy(&raw));

        match result {
            Ok(strategy) => Generated::generated(strategy),
            Err(err) => {
                let reason = Degradation::from_error(&err);
                log_degradation(PromptKind::Strategy, reason, &err);
                let canned = match reason {
                    Degradation::Unconfigured => StrategyRecord::unconfigured(),
                    _ => StrategyRecord::unavailable(),
                };
                Generated::degraded(canned, reason)
            }
        }
    }
}

fn log_degradation(kind: PromptKind, reason: Degradation, err: &InsightError) {
    match reason {
        Degradation::Unconfigured => {
            tracing::debug!(kind = kind.as_str(), "Completion provider unconfigured; returning canned record");
        }
        _ => tracing::warn!(kind = kind.as_str(), ?reason, error = %err, "Completion failed; returning canned record"),
    }
}
