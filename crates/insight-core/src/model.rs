//! Domain Models
//!
//! Transaction records as they enter the system, the shape persisted in the
//! memory store, and the insight/strategy records the pipelines produce.
//! Uses `rust_decimal` for all on-chain amounts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::InsightError;

// ============================================================================
// Transactions
// ============================================================================

/// Optional ERC-20 metadata attached to a transfer
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_symbol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_address: Option<String>,
}

/// One on-chain transfer.
///
/// Deserialization validates: records with a blank hash or sender, negative or
/// non-numeric amounts, or a non-integer timestamp are rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawTransaction")]
pub struct TransactionRecord {
    pub hash: String,
    pub from: String,
    /// Empty for contract creation
    pub to: String,
    /// ETH-denominated
    pub value: Decimal,
    /// Unix seconds
    pub timestamp: u64,
    /// Gwei-scaled (raw / 10^9)
    pub gas_used: Decimal,
    /// Gwei-denominated
    pub gas_price: Decimal,
    #[serde(flatten)]
    pub token: TokenMetadata,
}

impl TransactionRecord {
    /// Parse a loosely-typed list, dropping records that fail validation
    pub fn parse_lenient(values: Vec<serde_json::Value>) -> Vec<Self> {
        values
            .into_iter()
            .enumerate()
            .filter_map(|(idx, value)| match serde_json::from_value::<Self>(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(index = idx, error = %e, "Dropping malformed transaction record");
                    None
                }
            })
            .collect()
    }

    /// Fee paid in ETH. Both gas fields are gwei-scaled, so the 10^9 factors cancel.
    pub fn gas_spent_eth(&self) -> Decimal {
        self.gas_used
            .checked_mul(self.gas_price)
            .unwrap_or(Decimal::ZERO)
    }

    /// Symbol of the moved asset, ETH for plain transfers
    pub fn asset_symbol(&self) -> &str {
        self.token.token_symbol.as_deref().unwrap_or("ETH")
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// One-line human summary, used as embedding input
    pub fn summary(&self) -> String {
        let when = self
            .datetime()
            .map_or_else(|| self.timestamp.to_string(), |d| d.format("%Y-%m-%d %H:%M UTC").to_string());
        let to = if self.to.is_empty() { "contract creation" } else { self.to.as_str() };
        format!(
            "{when}: {} {} from {} to {to}, gas {} ETH",
            self.value.normalize(),
            self.asset_symbol(),
            self.from,
            self.gas_spent_eth().normalize(),
        )
    }
}

/// Number or numeric string, as wallets and explorers disagree on which to send
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Number(serde_json::Number),
    Text(String),
}

impl Loose {
    fn decimal(&self, field: &str) -> Result<Decimal, InsightError> {
        let text = match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        };
        let parsed = text
            .parse::<Decimal>()
            .or_else(|_| Decimal::from_scientific(&text))
            .map_err(|_| InsightError::InvalidInput(format!("{field} is not a decimal: {text:?}")))?;
        if parsed.is_sign_negative() && !parsed.is_zero() {
            return Err(InsightError::InvalidInput(format!("{field} is negative")));
        }
        Ok(parsed)
    }

    fn unix_seconds(&self) -> Result<u64, InsightError> {
        match self {
            Self::Number(n) => n.as_u64(),
            Self::Text(s) => s.trim().parse().ok(),
        }
        .ok_or_else(|| InsightError::InvalidInput("timestamp is not unix seconds".into()))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransaction {
    hash: String,
    from: String,
    #[serde(default)]
    to: Option<String>,
    value: Loose,
    timestamp: Loose,
    gas_used: Loose,
    gas_price: Loose,
    #[serde(flatten)]
    token: TokenMetadata,
}

impl TryFrom<RawTransaction> for TransactionRecord {
    type Error = InsightError;

    fn try_from(raw: RawTransaction) -> Result<Self, Self::Error> {
        if raw.hash.trim().is_empty() {
            return Err(InsightError::InvalidInput("hash is empty".into()));
        }
        if raw.from.trim().is_empty() {
            return Err(InsightError::InvalidInput("from is empty".into()));
        }

        Ok(Self {
            hash: raw.hash,
            from: raw.from,
            to: raw.to.unwrap_or_default(),
            value: raw.value.decimal("value")?,
            timestamp: raw.timestamp.unix_seconds()?,
            gas_used: raw.gas_used.decimal("gasUsed")?,
            gas_price: raw.gas_price.decimal("gasPrice")?,
            token: raw.token,
        })
    }
}

/// Transaction summary as persisted in the memory store's metadata
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTransaction {
    pub wallet_address: String,
    pub hash: String,
    /// RFC 3339
    pub date: String,
    pub token: String,
    #[serde(rename = "valueUSD", with = "rust_decimal::serde::float")]
    pub value_usd: Decimal,
    #[serde(rename = "gasSpentUSD", with = "rust_decimal::serde::float")]
    pub gas_spent_usd: Decimal,
    pub summary: String,
}

impl StoredTransaction {
    /// Build the persisted form of a transfer, pricing ETH amounts at `eth_usd`
    pub fn from_transaction(wallet_address: &str, tx: &TransactionRecord, eth_usd: Decimal) -> Self {
        let to_usd = |eth: Decimal| eth.checked_mul(eth_usd).unwrap_or(Decimal::ZERO).round_dp(2);

        Self {
            wallet_address: wallet_address.to_string(),
            hash: tx.hash.clone(),
            date: tx.datetime().map(|d| d.to_rfc3339()).unwrap_or_default(),
            token: tx.asset_symbol().to_string(),
            // Token transfers carry token units in `value`; only ETH can be priced here.
            value_usd: if tx.token.token_symbol.is_none() { to_usd(tx.value) } else { Decimal::ZERO },
            gas_spent_usd: to_usd(tx.gas_spent_eth()),
            summary: tx.summary(),
        }
    }
}

/// One vector upserted into the memory store
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: StoredTransaction,
}

// ============================================================================
// Insights
// ============================================================================

/// Category of an insight
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Gas,
    Portfolio,
    Swap,
    Volume,
    General,
}

impl InsightType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "gas" => Some(Self::Gas),
            "portfolio" => Some(Self::Portfolio),
            "swap" => Some(Self::Swap),
            "volume" => Some(Self::Volume),
            "general" => Some(Self::General),
            _ => None,
        }
    }
}

/// Highest allowed impact score
pub const MAX_IMPACT_SCORE: u8 = 10;

/// A generated (or canned) insight about a wallet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightRecord {
    pub title: String,
    pub description: String,
    /// 0-10 inclusive
    #[serde(rename = "impactScore")]
    pub impact_score: u8,
    #[serde(rename = "type")]
    pub kind: InsightType,
}

const NO_HISTORY_TITLE: &str = "No transaction history found";
const NO_HISTORY_DESCRIPTION: &str =
    "Connect your wallet and make some transactions to get personalized insights.";

const UNCONFIGURED_TITLE: &str = "AI features require configuration";
const UNCONFIGURED_DESCRIPTION: &str =
    "Please set OPENAI_API_KEY in your environment variables to enable AI insights.";

const GENERATION_FAILED_TITLE: &str = "Unable to generate insights";
const GENERATION_FAILED_DESCRIPTION: &str =
    "There was an error processing your transactions. Please try again later.";

const REQUEST_FAILED_TITLE: &str = "Error generating insights";
const REQUEST_FAILED_DESCRIPTION: &str =
    "There was an error processing your request. Please try again later.";

impl InsightRecord {
    fn canned(title: &str, description: &str) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            impact_score: 0,
            kind: InsightType::General,
        }
    }

    /// Neither the memory store nor the caller had any transactions
    pub fn no_history() -> Self {
        Self::canned(NO_HISTORY_TITLE, NO_HISTORY_DESCRIPTION)
    }

    /// Completion provider has no credential
    pub fn unconfigured() -> Self {
        Self::canned(UNCONFIGURED_TITLE, UNCONFIGURED_DESCRIPTION)
    }

    /// Provider call failed or answered with an unusable payload
    pub fn generation_failed() -> Self {
        Self::canned(GENERATION_FAILED_TITLE, GENERATION_FAILED_DESCRIPTION)
    }

    /// Unexpected fault anywhere in the pipeline
    pub fn request_failed() -> Self {
        Self::canned(REQUEST_FAILED_TITLE, REQUEST_FAILED_DESCRIPTION)
    }
}

// ============================================================================
// Strategies
// ============================================================================

/// Lowest and highest allowed strategy risk
pub const MIN_RISK: u8 = 1;
pub const MAX_RISK: u8 = 10;

/// Neutral risk used by canned strategies
pub const CANNED_RISK: u8 = 5;

const NOT_APPLICABLE: &str = "N/A";

/// A goal-planning strategy
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyRecord {
    pub strategy: String,
    pub timeline: String,
    /// 1-10 inclusive
    pub risk: u8,
    pub suggestion: String,
    pub expected_return: String,
}

impl StrategyRecord {
    fn canned(strategy: &str, suggestion: &str) -> Self {
        Self {
            strategy: strategy.into(),
            timeline: NOT_APPLICABLE.into(),
            risk: CANNED_RISK,
            suggestion: suggestion.into(),
            expected_return: NOT_APPLICABLE.into(),
        }
    }

    /// Completion provider has no credential
    pub fn unconfigured() -> Self {
        Self::canned(
            "Please set OPENAI_API_KEY in your environment variables to enable AI goal simulation.",
            "Configure your OpenAI API key to get personalized strategies.",
        )
    }

    /// Generation failed for any other reason
    pub fn unavailable() -> Self {
        Self::canned("Unable to generate strategy at this time.", "Please try again later.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "hash": "0xabc",
            "from": "0xfrom",
            "to": "0xto",
            "value": "1.5",
            "timestamp": 1_700_000_000,
            "gasUsed": "0.000021",
            "gasPrice": "30",
        })
    }

    #[test]
    fn test_transaction_parses_and_reserializes_camel_case() {
        let tx: TransactionRecord = serde_json::from_value(sample()).unwrap();
        assert_eq!(tx.value, dec!(1.5));
        assert_eq!(tx.timestamp, 1_700_000_000);

        let out = serde_json::to_value(&tx).unwrap();
        assert_eq!(out["gasUsed"], "0.000021");
        assert!(out.get("tokenSymbol").is_none());
    }

    #[test]
    fn test_transaction_coerces_numeric_strings() {
        let mut raw = sample();
        raw["timestamp"] = json!("1700000000");
        raw["value"] = json!(2);
        let tx: TransactionRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(tx.timestamp, 1_700_000_000);
        assert_eq!(tx.value, dec!(2));
    }

    #[test]
    fn test_transaction_rejects_bad_fields() {
        let mut negative = sample();
        negative["value"] = json!("-1");
        assert!(serde_json::from_value::<TransactionRecord>(negative).is_err());

        let mut blank_hash = sample();
        blank_hash["hash"] = json!("  ");
        assert!(serde_json::from_value::<TransactionRecord>(blank_hash).is_err());

        let mut garbage = sample();
        garbage["gasPrice"] = json!("lots");
        assert!(serde_json::from_value::<TransactionRecord>(garbage).is_err());
    }

    #[test]
    fn test_parse_lenient_drops_only_bad_records() {
        let records = TransactionRecord::parse_lenient(vec![sample(), json!({"hash": 1}), sample()]);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_gas_spent_eth() {
        let tx: TransactionRecord = serde_json::from_value(sample()).unwrap();
        assert_eq!(tx.gas_spent_eth(), dec!(0.00063));
    }

    #[test]
    fn test_stored_transaction_prices_eth() {
        let tx: TransactionRecord = serde_json::from_value(sample()).unwrap();
        let stored = StoredTransaction::from_transaction("0xwallet", &tx, dec!(2000));
        assert_eq!(stored.value_usd, dec!(3000));
        assert_eq!(stored.gas_spent_usd, dec!(1.26));
        assert_eq!(stored.token, "ETH");
        assert!(stored.date.starts_with("2023-11-14"));

        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["valueUSD"], 3000.0);
        assert_eq!(json["walletAddress"], "0xwallet");
    }

    #[test]
    fn test_insight_record_wire_names() {
        let json = serde_json::to_value(InsightRecord::no_history()).unwrap();
        assert_eq!(json["impactScore"], 0);
        assert_eq!(json["type"], "general");
    }

    #[test]
    fn test_canned_strategies() {
        for record in [StrategyRecord::unconfigured(), StrategyRecord::unavailable()] {
            assert_eq!(record.risk, 5);
            assert_eq!(record.timeline, "N/A");
            assert_eq!(record.expected_return, "N/A");
        }
        let json = serde_json::to_value(StrategyRecord::unavailable()).unwrap();
        assert_eq!(json["expectedReturn"], "N/A");
    }

    #[test]
    fn test_insight_type_parse_is_case_insensitive() {
        assert_eq!(InsightType::parse("Gas"), Some(InsightType::Gas));
        assert_eq!(InsightType::parse("defi"), None);
    }
}
