//! Test doubles for the collaborator traits

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::chain::{ChainDataSource, TokenTransfer};
use crate::error::{InsightError, Result};
use crate::market::MarketDataSource;
use crate::memory::MemoryStore;
use crate::message::Message;
use crate::model::{EmbeddingRecord, StoredTransaction};
use crate::provider::{Completion, EmbeddingProvider, FinishReason, GenerationOptions, LlmProvider};

enum Reply {
    Text(String),
    Fail(String),
    Panic,
}

/// Completion provider that counts calls and records the last request
pub struct StubProvider {
    configured: bool,
    reply: Reply,
    delay: Option<Duration>,
    calls: AtomicUsize,
    availability_checks: AtomicUsize,
    last: Mutex<Option<(Vec<Message>, GenerationOptions)>>,
}

impl StubProvider {
    fn build(configured: bool, reply: Reply) -> Self {
        Self {
            configured,
            reply,
            delay: None,
            calls: AtomicUsize::new(0),
            availability_checks: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn unconfigured() -> Self {
        Self::build(false, Reply::Fail("unconfigured provider was called".into()))
    }

    pub fn replying(text: impl Into<String>) -> Self {
        Self::build(true, Reply::Text(text.into()))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::build(true, Reply::Fail(message.into()))
    }

    pub fn panicking() -> Self {
        Self::build(true, Reply::Panic)
    }

    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn availability_checks(&self) -> usize {
        self.availability_checks.load(Ordering::SeqCst)
    }

    pub fn last_messages(&self) -> Option<Vec<Message>> {
        self.last.lock().unwrap().as_ref().map(|(m, _)| m.clone())
    }

    pub fn last_options(&self) -> Option<GenerationOptions> {
        self.last.lock().unwrap().as_ref().map(|(_, o)| o.clone())
    }
}

#[async_trait]
impl LlmProvider for StubProvider {
    fn name(&self) -> &str {
        "Stub"
    }

    fn is_configured(&self) -> bool {
        self.availability_checks.fetch_add(1, Ordering::SeqCst);
        self.configured
    }

    async fn complete(&self, messages: &[Message], options: &GenerationOptions) -> Result<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some((messages.to_vec(), options.clone()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.reply {
            Reply::Text(text) => Ok(Completion {
                content: text.clone(),
                model: options.model.clone(),
                usage: None,
                finish_reason: Some(FinishReason::Stop),
            }),
            Reply::Fail(msg) => Err(InsightError::Provider(msg.clone())),
            Reply::Panic => panic!("stub provider blew up"),
        }
    }
}

/// Memory store whose every call fails
pub struct FailingStore;

#[async_trait]
impl MemoryStore for FailingStore {
    fn is_configured(&self) -> bool {
        true
    }

    async fn query_by_wallet(&self, _wallet_address: &str, _limit: usize) -> Result<Vec<serde_json::Value>> {
        Err(InsightError::Memory("index not found".into()))
    }

    async fn upsert(&self, _record: &EmbeddingRecord) -> Result<()> {
        Err(InsightError::Memory("index not found".into()))
    }
}

/// Memory store that hangs longer than any sane timeout
pub struct HangingStore;

#[async_trait]
impl MemoryStore for HangingStore {
    fn is_configured(&self) -> bool {
        true
    }

    async fn query_by_wallet(&self, _wallet_address: &str, _limit: usize) -> Result<Vec<serde_json::Value>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }

    async fn upsert(&self, _record: &EmbeddingRecord) -> Result<()> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

/// Market data source with a canned behavior
pub enum StubMarket {
    Ok(serde_json::Value),
    Failing,
    Slow(Duration),
}

#[async_trait]
impl MarketDataSource for StubMarket {
    fn name(&self) -> &str {
        "StubMarket"
    }

    async fn fetch(&self) -> Result<serde_json::Value> {
        match self {
            Self::Ok(value) => Ok(value.clone()),
            Self::Failing => Err(InsightError::MarketData("HTTP 503".into())),
            Self::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(serde_json::json!({"late": true}))
            }
        }
    }
}

/// Embedding provider returning a fixed vector, or failing
pub struct StubEmbedder {
    pub configured: bool,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl StubEmbedder {
    pub const fn new(configured: bool, fail: bool) -> Self {
        Self {
            configured,
            fail,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(InsightError::Provider("embedding quota exceeded".into()));
        }
        Ok(vec![0.5; self.dimension()])
    }

    fn dimension(&self) -> usize {
        4
    }
}

/// Block explorer with one transfer, one token transfer and a 1.5 ETH balance
pub struct StubChain {
    configured: bool,
    fail_tokens: bool,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl StubChain {
    pub const fn new(configured: bool) -> Self {
        Self {
            configured,
            fail_tokens: false,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub const fn failing_tokens(mut self) -> Self {
        self.fail_tokens = true;
        self
    }

    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ChainDataSource for StubChain {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn balance(&self, _address: &str) -> Result<rust_decimal::Decimal> {
        self.enter().await;
        Ok(rust_decimal::Decimal::new(15, 1))
    }

    async fn transactions(&self, _address: &str, _limit: usize) -> Result<Vec<crate::model::TransactionRecord>> {
        self.enter().await;
        Ok(vec![transaction("0x1")])
    }

    async fn token_transfers(&self, _address: &str, _limit: usize) -> Result<Vec<TokenTransfer>> {
        self.enter().await;
        if self.fail_tokens {
            return Err(InsightError::ChainData("NOTOK".into()));
        }
        Ok(vec![TokenTransfer {
            token_address: "0xa0b8".into(),
            token_name: "USD Coin".into(),
            token_symbol: "USDC".into(),
            balance: "2500000".into(),
            decimals: 6,
        }])
    }
}

/// A persisted record for `wallet`
pub fn stored(wallet: &str, hash: &str) -> StoredTransaction {
    StoredTransaction {
        wallet_address: wallet.into(),
        hash: hash.into(),
        date: "2024-01-01T00:00:00+00:00".into(),
        token: "ETH".into(),
        value_usd: rust_decimal::Decimal::from(100),
        gas_spent_usd: rust_decimal::Decimal::from(2),
        summary: format!("transfer {hash}"),
    }
}

/// A valid caller-supplied transaction
pub fn transaction(hash: &str) -> crate::model::TransactionRecord {
    serde_json::from_value(serde_json::json!({
        "hash": hash,
        "from": "0xfrom",
        "to": "0xto",
        "value": "0.25",
        "timestamp": 1_700_000_000_u64,
        "gasUsed": "0.000021",
        "gasPrice": "20",
    }))
    .unwrap()
}
