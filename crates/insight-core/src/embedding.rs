//! Embeddings and Transaction Indexing
//!
//! Write side of the memory store: turns transfers into summary embeddings and
//! upserts them through the [`MemoryGateway`]. The insight pipeline never calls
//! this; it only reads what was indexed here.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::availability::{Availability, ProviderAvailability};
use crate::error::{InsightError, Result};
use crate::memory::MemoryGateway;
use crate::model::{EmbeddingRecord, StoredTransaction, TransactionRecord};
use crate::provider::EmbeddingProvider;

/// Dimension of `text-embedding-3-small`, used when no provider is wired
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1536;

/// Infallible embedding client: zero vector when unconfigured or failing
pub struct EmbeddingClient {
    provider: Option<Arc<dyn EmbeddingProvider>>,
    availability: ProviderAvailability,
    timeout: Duration,
}

impl EmbeddingClient {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider: Some(provider),
            availability: ProviderAvailability::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn disabled() -> Self {
        Self {
            provider: None,
            availability: ProviderAvailability::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn availability(&self) -> Availability {
        self.availability
            .resolve(|| self.provider.as_ref().is_some_and(|p| p.is_configured()))
    }

    pub fn dimension(&self) -> usize {
        self.provider
            .as_ref()
            .map_or(DEFAULT_EMBEDDING_DIMENSION, |p| p.dimension())
    }

    /// Embed `text`; a zero vector of [`Self::dimension`] on any failure
    pub async fn embed(&self, text: &str) -> Vec<f32> {
        let provider = match (&self.provider, self.availability()) {
            (Some(provider), Availability::Available) => provider,
            _ => return vec![0.0; self.dimension()],
        };

        let result = tokio::time::timeout(self.timeout, provider.embed(text))
            .await
            .map_err(|_| InsightError::Timeout(self.timeout))
            .and_then(|r| r);

        match result {
            Ok(values) if values.len() == provider.dimension() => values,
            Ok(values) => {
                tracing::warn!(got = values.len(), want = provider.dimension(), "Embedding has wrong dimension");
                vec![0.0; provider.dimension()]
            }
            Err(e) => {
                tracing::error!(error = %e, "Error generating embedding");
                vec![0.0; provider.dimension()]
            }
        }
    }
}

/// Outcome of an indexing run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    /// Records handed in
    pub submitted: usize,
    /// Records the store accepted
    pub indexed: usize,
}

/// Embeds transaction summaries and stores them for later history lookups
#[derive(Clone)]
pub struct TransactionIndexer {
    embeddings: Arc<EmbeddingClient>,
    memory: Arc<MemoryGateway>,
}

impl TransactionIndexer {
    pub const fn new(embeddings: Arc<EmbeddingClient>, memory: Arc<MemoryGateway>) -> Self {
        Self { embeddings, memory }
    }

    /// Index `transactions` under `wallet_address`, pricing ETH at `eth_usd`.
    ///
    /// Only a blank wallet address is an error; per-record failures just lower
    /// the `indexed` count.
    pub async fn index(
        &self,
        wallet_address: &str,
        transactions: &[TransactionRecord],
        eth_usd: Decimal,
    ) -> Result<IndexReport> {
        let wallet_address = wallet_address.trim();
        if wallet_address.is_empty() {
            return Err(InsightError::InvalidInput("Wallet address is required".into()));
        }

        let mut report = IndexReport {
            submitted: transactions.len(),
            indexed: 0,
        };

        for tx in transactions {
            let metadata = StoredTransaction::from_transaction(wallet_address, tx, eth_usd);
            let values = self.embeddings.embed(&metadata.summary).await;
            let record = EmbeddingRecord {
                id: tx.hash.clone(),
                values,
                metadata,
            };
            if self.memory.put(&record).await {
                report.indexed += 1;
            }
        }

        tracing::info!(
            wallet = wallet_address,
            submitted = report.submitted,
            indexed = report.indexed,
            "Indexed transactions"
        );

        Ok(report)
    }
}
