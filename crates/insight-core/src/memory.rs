//! Memory Gateway
//!
//! Best-effort access to the vector-memory store holding per-wallet
//! transaction summaries. Every failure mode (no credential, missing index,
//! malformed query, timeout) reads as "nothing stored" or "not written".

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::availability::{Availability, ProviderAvailability};
use crate::error::{InsightError, Result};
use crate::model::{EmbeddingRecord, StoredTransaction};

/// Records returned by `get` when the caller has no preference
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Default bound on any single store call
pub const DEFAULT_MEMORY_TIMEOUT: Duration = Duration::from_secs(10);

/// Vector-memory store backend
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Whether a usable credential is present. Must not touch the network.
    fn is_configured(&self) -> bool;

    /// Metadata of up to `limit` records whose `walletAddress` equals `wallet_address`
    async fn query_by_wallet(&self, wallet_address: &str, limit: usize) -> Result<Vec<serde_json::Value>>;

    /// Insert or replace one record
    async fn upsert(&self, record: &EmbeddingRecord) -> Result<()>;
}

/// Fallible store wrapped into an infallible, time-bounded gateway
pub struct MemoryGateway {
    store: Option<Arc<dyn MemoryStore>>,
    availability: ProviderAvailability,
    timeout: Duration,
}

impl MemoryGateway {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self {
            store: Some(store),
            availability: ProviderAvailability::new(),
            timeout: DEFAULT_MEMORY_TIMEOUT,
        }
    }

    /// Gateway with no backing store; reads are empty, writes are dropped
    pub fn disabled() -> Self {
        Self {
            store: None,
            availability: ProviderAvailability::new(),
            timeout: DEFAULT_MEMORY_TIMEOUT,
        }
    }

    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Availability of the store, probing the credential on first use
    pub fn availability(&self) -> Availability {
        self.availability.resolve(|| {
            let configured = self.store.as_ref().is_some_and(|s| s.is_configured());
            if !configured {
                tracing::warn!("Memory store not configured; stored history disabled");
            }
            configured
        })
    }

    fn active_store(&self) -> Option<&Arc<dyn MemoryStore>> {
        if self.availability().is_available() {
            self.store.as_ref()
        } else {
            None
        }
    }

    /// Stored history for a wallet, at most `limit` records. Empty on any failure.
    pub async fn get(&self, wallet_address: &str, limit: usize) -> Vec<StoredTransaction> {
        let Some(store) = self.active_store() else {
            return Vec::new();
        };

        let result = tokio::time::timeout(self.timeout, store.query_by_wallet(wallet_address, limit))
            .await
            .map_err(|_| InsightError::Timeout(self.timeout))
            .and_then(|r| r);

        match result {
            Ok(rows) => {
                let mut records: Vec<StoredTransaction> = rows
                    .into_iter()
                    .filter_map(|row| match serde_json::from_value(row) {
                        Ok(record) => Some(record),
                        Err(e) => {
                            tracing::warn!(error = %e, "Skipping stored record with unexpected metadata");
                            None
                        }
                    })
                    .collect();
                records.truncate(limit);
                tracing::debug!(wallet = wallet_address, count = records.len(), "Loaded stored history");
                records
            }
            Err(e) => {
                tracing::warn!(wallet = wallet_address, error = %e, "Memory query failed; treating as empty");
                Vec::new()
            }
        }
    }

    /// Stored history with the default limit
    pub async fn get_default(&self, wallet_address: &str) -> Vec<StoredTransaction> {
        self.get(wallet_address, DEFAULT_HISTORY_LIMIT).await
    }

    /// Upsert one record. Returns whether it was written; failures are logged, never retried.
    pub async fn put(&self, record: &EmbeddingRecord) -> bool {
        let Some(store) = self.active_store() else {
            tracing::debug!(id = %record.id, "Memory store not configured; skipping upsert");
            return false;
        };

        let result = tokio::time::timeout(self.timeout, store.upsert(record))
            .await
            .map_err(|_| InsightError::Timeout(self.timeout))
            .and_then(|r| r);

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(id = %record.id, error = %e, "Failed to store transaction embedding");
                false
            }
        }
    }
}

/// In-memory store (for development/testing)
#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<String, EmbeddingRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    fn is_configured(&self) -> bool {
        true
    }

    async fn query_by_wallet(&self, wallet_address: &str, limit: usize) -> Result<Vec<serde_json::Value>> {
        let records = self
            .records
            .read()
            .map_err(|e| InsightError::Memory(e.to_string()))?;

        let mut matches: Vec<&EmbeddingRecord> = records
            .values()
            .filter(|r| r.metadata.wallet_address == wallet_address)
            .collect();
        matches.sort_by(|a, b| b.metadata.date.cmp(&a.metadata.date));

        matches
            .into_iter()
            .take(limit)
            .map(|r| serde_json::to_value(&r.metadata).map_err(InsightError::from))
            .collect()
    }

    async fn upsert(&self, record: &EmbeddingRecord) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|e| InsightError::Memory(e.to_string()))?;
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }
}
