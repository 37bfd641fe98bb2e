//! Application State

use std::sync::Arc;
use std::time::Duration;

use insight_core::{
    ChainGateway, CompletionClient, EmbeddingClient, HistoryResolver, InsightPipeline, MarketDataSource, MemoryGateway,
    StrategyPipeline, TransactionIndexer,
};
use insight_runtime::{CoinGeckoClient, EtherscanClient, OpenAiProvider, PineconeStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Wallet insight generation
    pub insights: Arc<InsightPipeline>,

    /// Goal strategy generation
    pub strategies: Arc<StrategyPipeline>,

    /// Stored per-wallet history
    pub memory: Arc<MemoryGateway>,

    /// Embeds and stores transactions
    pub indexer: Arc<TransactionIndexer>,

    /// Balance and transfers from the block explorer
    pub chain: Arc<ChainGateway>,

    /// Kept for health reporting
    pub completion: Arc<CompletionClient>,
    pub embeddings: Arc<EmbeddingClient>,
}

impl AppState {
    /// Wire pipelines from already-built clients
    pub fn new(
        completion: Arc<CompletionClient>,
        memory: Arc<MemoryGateway>,
        embeddings: Arc<EmbeddingClient>,
        chain: Arc<ChainGateway>,
        market: Option<Arc<dyn MarketDataSource>>,
        market_timeout: Duration,
    ) -> Self {
        let insights = InsightPipeline::new(HistoryResolver::new(memory.clone()), completion.clone());
        let strategies = StrategyPipeline::new(completion.clone(), market).with_market_timeout(market_timeout);
        let indexer = TransactionIndexer::new(embeddings.clone(), memory.clone());

        Self {
            insights: Arc::new(insights),
            strategies: Arc::new(strategies),
            memory,
            indexer: Arc::new(indexer),
            chain,
            completion,
            embeddings,
        }
    }

    /// Build every collaborator from the environment.
    ///
    /// Missing credentials are not an error here: the affected clients report
    /// themselves unavailable and the pipelines fall back to canned records.
    pub fn from_env() -> Self {
        let openai = Arc::new(OpenAiProvider::from_env());
        let options = openai.config().generation_options();
        let timeout = openai.config().timeout;

        let pinecone = PineconeStore::from_env();
        let memory_timeout = pinecone.timeout();

        let etherscan = EtherscanClient::from_env();
        let chain_timeout = etherscan.timeout();

        let market = CoinGeckoClient::from_env();
        let market_timeout = market.timeout();

        Self::new(
            Arc::new(CompletionClient::with_options(openai.clone(), options)),
            Arc::new(MemoryGateway::new(Arc::new(pinecone)).with_timeout(memory_timeout)),
            Arc::new(EmbeddingClient::new(openai).with_timeout(timeout)),
            Arc::new(ChainGateway::new(Arc::new(etherscan)).with_timeout(chain_timeout)),
            Some(Arc::new(market)),
            market_timeout,
        )
    }
}
