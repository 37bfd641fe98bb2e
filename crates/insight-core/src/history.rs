//! History Resolver
//!
//! Chooses which transaction history an insight request is based on.
//! Persisted history wins when present (it may carry enrichment the caller's
//! copy lacks); the caller's list is used otherwise.

use std::sync::Arc;

use crate::error::{InsightError, Result};
use crate::evidence::EvidenceSet;
use crate::memory::MemoryGateway;
use crate::model::{StoredTransaction, TransactionRecord};

/// The history chosen for a request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedHistory {
    /// From the memory store
    Persisted(Vec<StoredTransaction>),
    /// From the request body
    Supplied(Vec<TransactionRecord>),
    /// Neither source had anything
    Empty,
}

impl ResolvedHistory {
    pub const fn source(&self) -> &'static str {
        match self {
            Self::Persisted(_) => "persisted",
            Self::Supplied(_) => "supplied",
            Self::Empty => "empty",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Persisted(records) => records.len(),
            Self::Supplied(records) => records.len(),
            Self::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bounded prompt evidence for this history
    pub fn evidence(&self) -> Result<EvidenceSet> {
        match self {
            Self::Persisted(records) => EvidenceSet::assemble(records),
            Self::Supplied(records) => EvidenceSet::assemble(records),
            Self::Empty => EvidenceSet::assemble::<TransactionRecord>(&[]),
        }
    }
}

/// Resolves a wallet's history from memory or from the request
#[derive(Clone)]
pub struct HistoryResolver {
    memory: Arc<MemoryGateway>,
}

impl HistoryResolver {
    pub const fn new(memory: Arc<MemoryGateway>) -> Self {
        Self { memory }
    }

    /// Resolve history for `wallet_address`.
    ///
    /// A blank address is a caller error. An empty result is not.
    pub async fn resolve(&self, wallet_address: &str, supplied: Vec<TransactionRecord>) -> Result<ResolvedHistory> {
        let wallet_address = wallet_address.trim();
        if wallet_address.is_empty() {
            return Err(InsightError::InvalidInput("Wallet address is required".into()));
        }

        let persisted = self.memory.get_default(wallet_address).await;

        let resolved = if !persisted.is_empty() {
            ResolvedHistory::Persisted(persisted)
        } else if !supplied.is_empty() {
            ResolvedHistory::Supplied(supplied)
        } else {
            ResolvedHistory::Empty
        };

        tracing::info!(
            wallet = wallet_address,
            source = resolved.source(),
            count = resolved.len(),
            "Resolved transaction history"
        );

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::model::EmbeddingRecord;
    use crate::testing::{FailingStore, stored, transaction};

    async fn resolver_with(wallet: &str, hashes: &[&str]) -> HistoryResolver {
        let gateway = Arc::new(MemoryGateway::new(Arc::new(InMemoryStore::new())));
        for hash in hashes {
            gateway
                .put(&EmbeddingRecord {
                    id: (*hash).into(),
                    values: vec![0.0; 4],
                    metadata: stored(wallet, hash),
                })
                .await;
        }
        HistoryResolver::new(gateway)
    }

    #[tokio::test]
    async fn test_blank_wallet_is_caller_error() {
        let resolver = resolver_with("0xa", &[]).await;
        let err = resolver.resolve("  ", vec![transaction("0x1")]).await.unwrap_err();
        assert!(err.is_caller_error());
    }

    #[tokio::test]
    async fn test_persisted_takes_precedence() {
        let resolver = resolver_with("0xa", &["0xstored"]).await;
        let history = resolver.resolve("0xa", vec![transaction("0xsupplied")]).await.unwrap();
        assert_eq!(history.source(), "persisted");
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_falls_back_to_supplied() {
        let resolver = resolver_with("0xother", &["0xstored"]).await;
        let history = resolver.resolve("0xa", vec![transaction("0x1"), transaction("0x2")]).await.unwrap();
        assert_eq!(history, ResolvedHistory::Supplied(vec![transaction("0x1"), transaction("0x2")]));
    }

    #[tokio::test]
    async fn test_empty_when_nothing_anywhere() {
        let resolver = resolver_with("0xa", &[]).await;
        let history = resolver.resolve("0xa", Vec::new()).await.unwrap();
        assert_eq!(history, ResolvedHistory::Empty);
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_falls_back_to_supplied() {
        let resolver = HistoryResolver::new(Arc::new(MemoryGateway::new(Arc::new(FailingStore))));
        let history = resolver.resolve("0xa", vec![transaction("0x1")]).await.unwrap();
        assert_eq!(history.source(), "supplied");
    }
}
