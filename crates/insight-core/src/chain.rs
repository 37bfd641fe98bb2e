//! Chain Data
//!
//! Read-only view of a wallet from a block explorer: ETH balance, recent
//! transfers and ERC-20 token transfers. Each part degrades on its own, so a
//! failing token lookup still returns the balance and transfers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::availability::{Availability, ProviderAvailability};
use crate::error::{InsightError, Result};
use crate::model::TransactionRecord;

/// Default bound on each explorer call
pub const DEFAULT_CHAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Transfers requested per list
pub const DEFAULT_TRANSFER_LIMIT: usize = 100;

/// One ERC-20 transfer as reported by the explorer
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfer {
    pub token_address: String,
    pub token_name: String,
    pub token_symbol: String,
    /// Raw amount in the token's base units
    pub balance: String,
    pub decimals: u8,
}

/// Everything fetched for one wallet
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WalletSnapshot {
    /// ETH
    pub balance: Decimal,
    pub transactions: Vec<TransactionRecord>,
    pub tokens: Vec<TokenTransfer>,
}

/// Block explorer backend
#[async_trait]
pub trait ChainDataSource: Send + Sync {
    /// Whether a usable credential is present. Must not touch the network.
    fn is_configured(&self) -> bool;

    /// ETH balance
    async fn balance(&self, address: &str) -> Result<Decimal>;

    /// Most recent normal transactions, newest first
    async fn transactions(&self, address: &str, limit: usize) -> Result<Vec<TransactionRecord>>;

    /// Most recent ERC-20 transfers, newest first
    async fn token_transfers(&self, address: &str, limit: usize) -> Result<Vec<TokenTransfer>>;
}

/// Infallible, time-bounded access to a [`ChainDataSource`]
pub struct ChainGateway {
    source: Option<Arc<dyn ChainDataSource>>,
    availability: ProviderAvailability,
    timeout: Duration,
}

impl ChainGateway {
    pub fn new(source: Arc<dyn ChainDataSource>) -> Self {
        Self {
            source: Some(source),
            availability: ProviderAvailability::new(),
            timeout: DEFAULT_CHAIN_TIMEOUT,
        }
    }

    pub fn disabled() -> Self {
        Self {
            source: None,
            availability: ProviderAvailability::new(),
            timeout: DEFAULT_CHAIN_TIMEOUT,
        }
    }

    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn availability(&self) -> Availability {
        self.availability.resolve(|| {
            let configured = self.source.as_ref().is_some_and(|s| s.is_configured());
            if !configured {
                tracing::warn!("Chain data source not configured; wallet lookups return empty results");
            }
            configured
        })
    }

    /// Balance, transfers and token transfers for `address`.
    ///
    /// Only a blank address is an error. Anything the explorer cannot answer
    /// comes back as zero or empty.
    pub async fn snapshot(&self, address: &str) -> Result<WalletSnapshot> {
        let address = address.trim();
        if address.is_empty() {
            return Err(InsightError::InvalidInput("Wallet address is required".into()));
        }

        let source = match (&self.source, self.availability()) {
            (Some(source), Availability::Available) => source,
            _ => return Ok(WalletSnapshot::default()),
        };

        let (balance, transactions, tokens) = futures::join!(
            self.bounded("balance", source.balance(address)),
            self.bounded("transactions", source.transactions(address, DEFAULT_TRANSFER_LIMIT)),
            self.bounded("tokens", source.token_transfers(address, DEFAULT_TRANSFER_LIMIT)),
        );

        let snapshot = WalletSnapshot {
            balance: balance.unwrap_or_default(),
            transactions: transactions.unwrap_or_default(),
            tokens: tokens.unwrap_or_default(),
        };
        tracing::debug!(
            wallet = address,
            transactions = snapshot.transactions.len(),
            tokens = snapshot.tokens.len(),
            "Fetched wallet snapshot"
        );

        Ok(snapshot)
    }

    async fn bounded<T>(&self, part: &'static str, call: impl Future<Output = Result<T>>) -> Option<T> {
        let result = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| InsightError::Timeout(self.timeout))
            .and_then(|r| r);

        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(part, error = %e, "Chain data lookup failed; returning empty");
                None
            }
        }
    }
}
