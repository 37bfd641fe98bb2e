//! Etherscan Chain Data
//!
//! Balance and transfer lists from the Etherscan account API. Amounts arrive
//! as integer strings in wei; transfers are rescaled to the units
//! `TransactionRecord` carries (value in ETH, gas fields in gwei).

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use insight_core::{
    chain::{ChainDataSource, TokenTransfer},
    error::{InsightError, Result},
    model::{TokenMetadata, TransactionRecord},
    provider::credential_present,
};

use crate::http::{self, HttpError, client_with_timeout, env_opt, env_secs};

const WEI_PER_ETH_SCALE: u32 = 18;
const WEI_PER_GWEI_SCALE: u32 = 9;

/// Etherscan client configuration
#[derive(Clone, Debug)]
pub struct EtherscanConfig {
    /// API key; `None` disables the client
    pub api_key: Option<String>,

    /// Account API endpoint
    pub base_url: String,

    /// Chain to query (1 = Ethereum mainnet)
    pub chain_id: u64,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for EtherscanConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.etherscan.io/v2/api".into(),
            chain_id: 1,
            timeout: Duration::from_secs(10),
        }
    }
}

impl EtherscanConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: env_opt("ETHERSCAN_API_KEY"),
            base_url: env_opt("ETHERSCAN_BASE_URL").unwrap_or(defaults.base_url),
            chain_id: env_opt("ETHERSCAN_CHAIN_ID")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.chain_id),
            timeout: env_secs("CHAIN_DATA_TIMEOUT_SECS", 10),
        }
    }
}

/// Envelope of every account API answer
#[derive(Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransfer {
    hash: String,
    from: String,
    #[serde(default)]
    to: String,
    #[serde(default)]
    value: String,
    time_stamp: String,
    #[serde(default)]
    gas_used: String,
    #[serde(default)]
    gas_price: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTokenTransfer {
    contract_address: String,
    #[serde(default)]
    token_name: String,
    #[serde(default)]
    token_symbol: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    token_decimal: String,
}

/// Integer base units rescaled by `10^scale`. Blank reads as zero.
fn scaled(raw: &str, scale: u32) -> Option<Decimal> {
    let raw = raw.trim();
    let units: i128 = if raw.is_empty() { 0 } else { raw.parse().ok()? };
    Decimal::try_from_i128_with_scale(units, scale)
        .ok()
        .filter(|d| !d.is_sign_negative() || d.is_zero())
        .map(|d| d.normalize())
}

fn map_transfer(raw: RawTransfer) -> Option<TransactionRecord> {
    if raw.hash.trim().is_empty() || raw.from.trim().is_empty() {
        return None;
    }
    Some(TransactionRecord {
        value: scaled(&raw.value, WEI_PER_ETH_SCALE)?,
        timestamp: raw.time_stamp.trim().parse().ok()?,
        gas_used: scaled(&raw.gas_used, WEI_PER_GWEI_SCALE)?,
        gas_price: scaled(&raw.gas_price, WEI_PER_GWEI_SCALE)?,
        hash: raw.hash,
        from: raw.from,
        to: raw.to,
        token: TokenMetadata::default(),
    })
}

fn map_token_transfer(raw: RawTokenTransfer) -> Option<TokenTransfer> {
    if raw.contract_address.trim().is_empty() {
        return None;
    }
    Some(TokenTransfer {
        decimals: raw.token_decimal.trim().parse().ok()?,
        token_address: raw.contract_address,
        token_name: raw.token_name,
        token_symbol: raw.token_symbol,
        balance: raw.value,
    })
}

/// Unwrap an envelope, treating "No transactions found" as an empty list
fn envelope_result(envelope: Envelope) -> Result<serde_json::Value> {
    if envelope.status == "1" {
        return Ok(envelope.result);
    }
    if envelope.message.starts_with("No transactions found") {
        return Ok(serde_json::Value::Array(Vec::new()));
    }
    Err(InsightError::ChainData(format!("{}: {}", envelope.message, envelope.result)))
}

/// Decode each row on its own and map it; rows that fail either step are skipped
fn map_rows<R: DeserializeOwned, T>(result: serde_json::Value, map: impl Fn(R) -> Option<T>) -> Result<Vec<T>> {
    let serde_json::Value::Array(rows) = result else {
        return Err(InsightError::ChainData("expected a list result".into()));
    };

    let total = rows.len();
    let mapped: Vec<T> = rows
        .into_iter()
        .filter_map(|row| serde_json::from_value(row).ok().and_then(&map))
        .collect();

    if mapped.len() < total {
        tracing::warn!(skipped = total - mapped.len(), "Skipping unreadable explorer rows");
    }
    Ok(mapped)
}

/// Etherscan-backed [`ChainDataSource`]
pub struct EtherscanClient {
    client: reqwest::Client,
    config: EtherscanConfig,
}

impl EtherscanClient {
    pub fn from_config(config: EtherscanConfig) -> Self {
        Self {
            client: client_with_timeout(config.timeout),
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::from_config(EtherscanConfig::from_env())
    }

    pub const fn timeout(&self) -> Duration {
        self.config.timeout
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| InsightError::ProviderUnconfigured("ETHERSCAN_API_KEY is not set".into()))
    }

    async fn account(&self, action: &str, address: &str, extra: &[(&str, String)]) -> Result<serde_json::Value> {
        let api_key = self.api_key()?;
        let request = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("chainid", self.config.chain_id.to_string()),
                ("module", "account".into()),
                ("action", action.into()),
                ("address", address.into()),
            ])
            .query(extra)
            .query(&[("apikey", api_key)]);

        let envelope: Envelope = http::send_json(request).await.map_err(HttpError::into_chain)?;
        envelope_result(envelope)
    }

    fn page(limit: usize) -> [(&'static str, String); 3] {
        [
            ("page", "1".into()),
            ("offset", limit.to_string()),
            ("sort", "desc".into()),
        ]
    }
}

#[async_trait]
impl ChainDataSource for EtherscanClient {
    fn is_configured(&self) -> bool {
        credential_present(self.config.api_key.as_deref())
    }

    async fn balance(&self, address: &str) -> Result<Decimal> {
        let result = self.account("balance", address, &[("tag", "latest".into())]).await?;
        result
            .as_str()
            .and_then(|wei| scaled(wei, WEI_PER_ETH_SCALE))
            .ok_or_else(|| InsightError::ChainData(format!("unreadable balance: {result}")))
    }

    async fn transactions(&self, address: &str, limit: usize) -> Result<Vec<TransactionRecord>> {
        let result = self.account("txlist", address, &Self::page(limit)).await?;
        map_rows(result, map_transfer)
    }

    async fn token_transfers(&self, address: &str, limit: usize) -> Result<Vec<TokenTransfer>> {
        let result = self.account("tokentx", address, &Self::page(limit)).await?;
        map_rows(result, map_token_transfer)
    }
}
