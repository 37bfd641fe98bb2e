//! Pinecone Memory Store
//!
//! Per-wallet transaction summaries in a Pinecone index. Reads select by an
//! exact `walletAddress` metadata filter; the query vector is a neutral
//! placeholder since similarity plays no part in selection.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use insight_core::{
    error::{InsightError, Result},
    memory::MemoryStore,
    model::EmbeddingRecord,
    provider::credential_present,
};

use crate::http::{self, HttpError, client_with_timeout, env_opt, env_secs};

const API_VERSION: &str = "2024-07";

/// Pinecone store configuration
#[derive(Clone, Debug)]
pub struct PineconeConfig {
    /// API key; `None` disables the store
    pub api_key: Option<String>,

    /// Index name
    pub index_name: String,

    /// Data-plane host; looked up from the control plane when unset
    pub index_host: Option<String>,

    /// Control-plane URL
    pub control_plane_url: String,

    /// Index dimension
    pub dimension: usize,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            index_name: "transaction_summary".into(),
            index_host: None,
            control_plane_url: "https://api.pinecone.io".into(),
            dimension: 1536,
            timeout: Duration::from_secs(10),
        }
    }
}

impl PineconeConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: env_opt("PINECONE_API_KEY"),
            index_name: env_opt("PINECONE_INDEX_NAME").unwrap_or(defaults.index_name),
            index_host: env_opt("PINECONE_INDEX_HOST"),
            timeout: env_secs("MEMORY_TIMEOUT_SECS", 10),
            ..defaults
        }
    }
}

#[derive(Deserialize)]
struct IndexDescription {
    host: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest {
    vector: Vec<f32>,
    top_k: usize,
    include_metadata: bool,
    filter: serde_json::Value,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: [&'a EmbeddingRecord; 1],
}

/// Pinecone-backed [`MemoryStore`]
pub struct PineconeStore {
    client: reqwest::Client,
    config: PineconeConfig,
    host: OnceCell<String>,
}

impl PineconeStore {
    pub fn from_config(config: PineconeConfig) -> Self {
        Self {
            client: client_with_timeout(config.timeout),
            config,
            host: OnceCell::new(),
        }
    }

    pub fn from_env() -> Self {
        Self::from_config(PineconeConfig::from_env())
    }

    pub const fn timeout(&self) -> Duration {
        self.config.timeout
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| InsightError::ProviderUnconfigured("PINECONE_API_KEY is not set".into()))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        Ok(request
            .header("Api-Key", self.api_key()?)
            .header("X-Pinecone-API-Version", API_VERSION))
    }

    /// Data-plane base URL, resolved once
    async fn host(&self) -> Result<&str> {
        self.host
            .get_or_try_init(|| async {
                let host = match &self.config.index_host {
                    Some(host) => host.clone(),
                    None => {
                        let url = format!(
                            "{}/indexes/{}",
                            self.config.control_plane_url.trim_end_matches('/'),
                            self.config.index_name
                        );
                        let description: IndexDescription = http::send_json(self.authorized(self.client.get(url))?)
                            .await
                            .map_err(HttpError::into_memory)?;
                        description.host
                    }
                };
                Ok::<_, InsightError>(normalize_host(&host))
            })
            .await
            .map(String::as_str)
    }

    /// Unit vector with equal components; ranks nothing above anything else
    fn neutral_vector(&self) -> Vec<f32> {
        #[allow(clippy::cast_precision_loss)]
        let component = 1.0 / (self.config.dimension.max(1) as f32).sqrt();
        vec![component; self.config.dimension]
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

#[async_trait]
impl MemoryStore for PineconeStore {
    fn is_configured(&self) -> bool {
        credential_present(self.config.api_key.as_deref())
    }

    async fn query_by_wallet(&self, wallet_address: &str, limit: usize) -> Result<Vec<serde_json::Value>> {
        let host = self.host().await?;
        let body = QueryRequest {
            vector: self.neutral_vector(),
            top_k: limit,
            include_metadata: true,
            filter: serde_json::json!({ "walletAddress": { "$eq": wallet_address } }),
        };

        let request = self.authorized(self.client.post(format!("{host}/query")))?.json(&body);
        let response: QueryResponse = http::send_json(request).await.map_err(HttpError::into_memory)?;

        Ok(response.matches.into_iter().filter_map(|m| m.metadata).collect())
    }

    async fn upsert(&self, record: &EmbeddingRecord) -> Result<()> {
        let host = self.host().await?;
        let request = self
            .authorized(self.client.post(format!("{host}/vectors/upsert")))?
            .json(&UpsertRequest { vectors: [record] });

        http::send_empty(request).await.map_err(HttpError::into_memory)
    }
}
