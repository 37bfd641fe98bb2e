//! Market Data
//!
//! Auxiliary market statistics for the strategy prompt. The payload is opaque
//! and passed through verbatim; a failed or slow fetch yields `{}`.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Default bound on a market-data fetch
pub const DEFAULT_MARKET_TIMEOUT: Duration = Duration::from_secs(5);

/// Source of aggregate market statistics
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Source name for logs (e.g., "CoinGecko")
    fn name(&self) -> &str;

    /// Fetch the current statistics
    async fn fetch(&self) -> Result<serde_json::Value>;
}

/// Fetch market data within `timeout`, degrading to an empty object
pub async fn fetch_best_effort(source: &dyn MarketDataSource, timeout: Duration) -> serde_json::Value {
    match tokio::time::timeout(timeout, source.fetch()).await {
        Ok(Ok(data)) => data,
        Ok(Err(e)) => {
            tracing::warn!(source = source.name(), error = %e, "Market data fetch failed; continuing without it");
            empty()
        }
        Err(_) => {
            tracing::warn!(source = source.name(), ?timeout, "Market data fetch timed out; continuing without it");
            empty()
        }
    }
}

fn empty() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}
