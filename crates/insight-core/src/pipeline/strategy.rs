//! Strategy Pipeline
//!
//! Validates the goal, fetches market data best-effort, then asks for a
//! strategy. Market data failing never stops the strategy from being asked for.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::completion::{CompletionClient, Generated};
use crate::error::{InsightError, Result};
use crate::market::{self, DEFAULT_MARKET_TIMEOUT, MarketDataSource};
use crate::model::StrategyRecord;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyRequest {
    #[serde(default)]
    pub goal_text: String,
}

impl StrategyRequest {
    pub fn new(goal_text: impl Into<String>) -> Self {
        Self {
            goal_text: goal_text.into(),
        }
    }
}

pub struct StrategyPipeline {
    completion: Arc<CompletionClient>,
    market: Option<Arc<dyn MarketDataSource>>,
    market_timeout: Duration,
}

impl StrategyPipeline {
    pub const fn new(completion: Arc<CompletionClient>, market: Option<Arc<dyn MarketDataSource>>) -> Self {
        Self {
            completion,
            market,
            market_timeout: DEFAULT_MARKET_TIMEOUT,
        }
    }

    pub const fn with_market_timeout(mut self, timeout: Duration) -> Self {
        self.market_timeout = timeout;
        self
    }

    /// Produce a strategy for a goal.
    ///
    /// Errors only when the goal text is blank, before any provider is contacted.
    pub async fn generate(&self, request: StrategyRequest) -> Result<Generated<StrategyRecord>> {
        super::guarded("strategy", self.run(request), StrategyRecord::unavailable).await
    }

    async fn run(&self, request: StrategyRequest) -> Result<Generated<StrategyRecord>> {
        let goal = request.goal_text.trim();
        if goal.is_empty() {
            return Err(InsightError::InvalidInput("Goal text is required".into()));
        }

        let market_data = match &self.market {
            Some(source) => market::fetch_best_effort(source.as_ref(), self.market_timeout).await,
            None => serde_json::json!({}),
        };

        Ok(self.completion.generate_strategy(goal, &market_data).await)
    }
}
