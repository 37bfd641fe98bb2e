//! # insight-runtime
//!
//! HTTP collaborators for the insight pipelines.
//!
//! ## Collaborators
//!
//! - **OpenAI**: chat completions (`LlmProvider`) and embeddings (`EmbeddingProvider`)
//! - **Pinecone**: per-wallet transaction memory (`MemoryStore`)
//! - **CoinGecko**: global market statistics (`MarketDataSource`)
//! - **Etherscan**: wallet balance and transfer history (`ChainDataSource`)
//!
//! Each reads its configuration from the environment and reports itself
//! unconfigured, rather than failing, when its credential is missing.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use insight_runtime::{OpenAiProvider, PineconeStore};
//!
//! let provider = Arc::new(OpenAiProvider::from_env());
//! let completion = CompletionClient::with_options(provider.clone(), provider.config().generation_options());
//! let memory = MemoryGateway::new(Arc::new(PineconeStore::from_env()));
//! ```

mod http;

pub mod coingecko;
pub mod etherscan;
pub mod openai;
pub mod pinecone;

pub use coingecko::{CoinGeckoClient, CoinGeckoConfig};
pub use etherscan::{EtherscanClient, EtherscanConfig};
pub use http::HttpError;
pub use openai::{OpenAiConfig, OpenAiProvider};
pub use pinecone::{PineconeConfig, PineconeStore};

// Re-export core types for convenience
pub use insight_core::{
    CompletionClient, EmbeddingClient, InsightError, InsightPipeline, LlmProvider, MemoryGateway, Result,
    StrategyPipeline,
};
