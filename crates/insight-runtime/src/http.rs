//! Shared HTTP plumbing

use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;

use insight_core::InsightError;

/// Failure of one HTTP exchange
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: reqwest::StatusCode, body: String },
}

impl HttpError {
    pub fn into_provider(self) -> InsightError {
        InsightError::Provider(self.to_string())
    }

    pub fn into_memory(self) -> InsightError {
        InsightError::Memory(self.to_string())
    }

    pub fn into_market(self) -> InsightError {
        InsightError::MarketData(self.to_string())
    }

    pub fn into_chain(self) -> InsightError {
        InsightError::ChainData(self.to_string())
    }
}

/// Longest error body kept for logs
const MAX_ERROR_BODY: usize = 512;

/// Send a request and decode a JSON body, treating non-2xx as an error
pub async fn send_json<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, HttpError> {
    let response = check_status(request.send().await?).await?;
    Ok(response.json().await?)
}

/// Send a request and discard the body, treating non-2xx as an error
pub async fn send_empty(request: reqwest::RequestBuilder) -> Result<(), HttpError> {
    check_status(request.send().await?).await?;
    Ok(())
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, HttpError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut body = response.text().await.unwrap_or_default();
    if let Some((idx, _)) = body.char_indices().nth(MAX_ERROR_BODY) {
        body.truncate(idx);
    }
    Err(HttpError::Status { status, body })
}

/// Client with an overall request timeout
pub fn client_with_timeout(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("wallet-insights/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_default()
}

/// Read an env var, treating blank as unset
pub fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Read a numeric env var of seconds
pub fn env_secs(name: &str, default: u64) -> Duration {
    Duration::from_secs(env_opt(name).and_then(|v| v.trim().parse().ok()).unwrap_or(default))
}
