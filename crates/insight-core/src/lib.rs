//! # insight-core
//!
//! Wallet insight and goal-strategy generation that keeps working, with canned
//! output, when the completion provider, the memory store, or the market-data
//! source is unavailable.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  InsightPipeline                         StrategyPipeline        │
//! │  ┌────────────────┐  ┌──────────────┐    ┌──────────────────┐    │
//! │  │ HistoryResolver│─▶│ EvidenceSet  │─┐  │ MarketDataSource │─┐  │
//! │  └───────┬────────┘  └──────────────┘ │  └──────────────────┘ │  │
//! │          ▼                            ▼                       ▼  │
//! │  ┌────────────────┐          ┌──────────────────────────────────┐│
//! │  │ MemoryGateway  │          │ CompletionClient ── LlmProvider  ││
//! │  └────────────────┘          └──────────────────────────────────┘│
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `ChainGateway` sits beside the pipelines: it fetches a wallet's balance and
//! transfers from a block explorer, which callers may then index or pass to
//! `InsightPipeline`.
//!
//! Only caller errors (blank wallet address, blank goal) surface as `Err`.
//! Every provider problem yields a well-formed record plus an [`Outcome`]
//! saying whether it was generated or canned.

pub mod availability;
pub mod chain;
pub mod completion;
pub mod embedding;
pub mod error;
pub mod evidence;
pub mod history;
pub mod market;
pub mod memory;
pub mod message;
pub mod model;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod response;

#[cfg(test)]
pub(crate) mod testing;

pub use availability::{Availability, ProviderAvailability};
pub use chain::{ChainDataSource, ChainGateway, TokenTransfer, WalletSnapshot};
pub use completion::{CompletionClient, Degradation, Generated, Outcome, PromptKind};
pub use embedding::{EmbeddingClient, IndexReport, TransactionIndexer};
pub use error::{InsightError, Result};
pub use evidence::EvidenceSet;
pub use history::{HistoryResolver, ResolvedHistory};
pub use market::MarketDataSource;
pub use memory::{InMemoryStore, MemoryGateway, MemoryStore};
pub use message::{Message, Role};
pub use model::{InsightRecord, InsightType, StoredTransaction, StrategyRecord, TransactionRecord};
pub use pipeline::{InsightPipeline, InsightRequest, StrategyPipeline, StrategyRequest};
pub use provider::{EmbeddingProvider, LlmProvider};
