//! CoinGecko Market Data
//!
//! Global market statistics from the public, unauthenticated `/global` endpoint.

use std::time::Duration;

use async_trait::async_trait;

use insight_core::{error::Result, market::MarketDataSource};

use crate::http::{self, HttpError, client_with_timeout, env_opt, env_secs};

/// Market data source configuration
#[derive(Clone, Debug)]
pub struct CoinGeckoConfig {
    /// Aggregate statistics endpoint
    pub url: String,

    /// Fetch timeout
    pub timeout: Duration,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            url: "https://api.coingecko.com/api/v3/global".into(),
            timeout: Duration::from_secs(5),
        }
    }
}

impl CoinGeckoConfig {
    pub fn from_env() -> Self {
        Self {
            url: env_opt("MARKET_DATA_URL").unwrap_or_else(|| Self::default().url),
            timeout: env_secs("MARKET_DATA_TIMEOUT_SECS", 5),
        }
    }
}

/// CoinGecko client
pub struct CoinGeckoClient {
    client: reqwest::Client,
    config: CoinGeckoConfig,
}

impl CoinGeckoClient {
    pub fn from_config(config: CoinGeckoConfig) -> Self {
        Self {
            client: client_with_timeout(config.timeout),
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::from_config(CoinGeckoConfig::from_env())
    }

    pub const fn timeout(&self) -> Duration {
        self.config.timeout
    }
}

#[async_trait]
impl MarketDataSource for CoinGeckoClient {
    fn name(&self) -> &str {
        "CoinGecko"
    }

    async fn fetch(&self) -> Result<serde_json::Value> {
        let request = self
            .client
            .get(&self.config.url)
            .header(reqwest::header::ACCEPT, "application/json");

        http::send_json(request).await.map_err(HttpError::into_market)
    }
}
