//! Insight Pipeline
//!
//! ```text
//! resolve history ──empty──▶ no-history record
//!        │
//!        ▼
//! build evidence ─▶ complete ─▶ validate ──fail──▶ canned error record
//!                                   │
//!                                   ▼
//!                                insights
//! ```
//!
//! Read-only: nothing is written to the memory store here.

use std::sync::Arc;

use crate::completion::{CompletionClient, Generated};
use crate::error::Result;
use crate::history::{HistoryResolver, ResolvedHistory};
use crate::model::{InsightRecord, TransactionRecord};

/// Insight request after ingestion; built with [`InsightRequest::from_loose`]
#[derive(Clone, Debug, Default)]
pub struct InsightRequest {
    pub wallet_address: String,
    pub transactions: Vec<TransactionRecord>,
}

impl InsightRequest {
    /// Build from an untyped transaction list, dropping invalid records
    pub fn from_loose(wallet_address: impl Into<String>, transactions: Vec<serde_json::Value>) -> Self {
        Self {
            wallet_address: wallet_address.into(),
            transactions: TransactionRecord::parse_lenient(transactions),
        }
    }
}

pub struct InsightPipeline {
    resolver: HistoryResolver,
    completion: Arc<CompletionClient>,
}

impl InsightPipeline {
    pub const fn new(resolver: HistoryResolver, completion: Arc<CompletionClient>) -> Self {
        Self { resolver, completion }
    }

    /// Produce insights for a wallet.
    ///
    /// Errors only on caller faults (blank wallet address). Everything else
    /// yields a displayable record list.
    pub async fn generate(&self, request: InsightRequest) -> Result<Generated<Vec<InsightRecord>>> {
        super::guarded("insights", self.run(request), || vec![InsightRecord::request_failed()]).await
    }

    async fn run(&self, request: InsightRequest) -> Result<Generated<Vec<InsightRecord>>> {
        let history = self
            .resolver
            .resolve(&request.wallet_address, request.transactions)
            .await?;

        if let ResolvedHistory::Empty = history {
            return Ok(Generated::generated(vec![InsightRecord::no_history()]));
        }

        let evidence = history.evidence()?;
        tracing::debug!(
            records = evidence.record_count(),
            truncated = evidence.is_truncated(),
            "Evidence assembled"
        );

        Ok(self.completion.generate_insights(&evidence).await)
    }
}
