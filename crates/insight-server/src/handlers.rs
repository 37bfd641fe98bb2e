//! HTTP Handlers

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use insight_core::{
    Availability, Degradation, IndexReport, InsightError, InsightRecord, InsightRequest, Outcome,
    StoredTransaction, StrategyRecord, StrategyRequest, TransactionRecord, WalletSnapshot,
};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub completion: Availability,
    pub memory: Availability,
    pub embeddings: Availability,
    pub chain: Availability,
}

/// `transactions` may be absent or `null`; both mean "none supplied"
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightBody {
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub transactions: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub insights: Vec<InsightRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalBody {
    #[serde(default)]
    pub goal_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StrategyResponse {
    pub strategy: StrategyRecord,
}

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<StoredTransaction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexBody {
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub transactions: Option<Vec<serde_json::Value>>,
    /// ETH price used for the USD fields; zero when omitted
    #[serde(default)]
    pub eth_usd: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct FetchBody {
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(err: &InsightError) -> ApiError {
    if err.is_caller_error() {
        tracing::debug!(error = %err, "Rejected request");
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: err.user_message(),
                code: "INVALID_INPUT".into(),
            }),
        )
    } else {
        tracing::error!(error = %err, "Request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: err.user_message(),
                code: "INTERNAL_ERROR".into(),
            }),
        )
    }
}

fn bad_body(rejection: &JsonRejection) -> ApiError {
    tracing::debug!(error = %rejection, "Unreadable request body");
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: rejection.body_text(),
            code: "INVALID_BODY".into(),
        }),
    )
}

/// Degraded results still carry a displayable record; only an internal fault changes the status
fn status_for(outcome: Outcome) -> StatusCode {
    match outcome {
        Outcome::Degraded(Degradation::InternalFault) => StatusCode::INTERNAL_SERVER_ERROR,
        Outcome::Generated | Outcome::Degraded(_) => StatusCode::OK,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        completion: state.completion.availability(),
        memory: state.memory.availability(),
        embeddings: state.embeddings.availability(),
        chain: state.chain.availability(),
    })
}

/// Wallet insights
pub async fn insights_handler(
    State(state): State<AppState>,
    payload: Result<Json<InsightBody>, JsonRejection>,
) -> Result<(StatusCode, Json<InsightsResponse>), ApiError> {
    let Json(body) = payload.map_err(|e| bad_body(&e))?;
    let request = InsightRequest::from_loose(
        body.wallet_address.unwrap_or_default(),
        body.transactions.unwrap_or_default(),
    );

    let result = state.insights.generate(request).await.map_err(|e| api_error(&e))?;
    if let Outcome::Degraded(reason) = result.outcome {
        tracing::info!(?reason, "Serving canned insights");
    }

    Ok((status_for(result.outcome), Json(InsightsResponse { insights: result.value })))
}

/// Goal strategy
pub async fn goals_handler(
    State(state): State<AppState>,
    payload: Result<Json<GoalBody>, JsonRejection>,
) -> Result<(StatusCode, Json<StrategyResponse>), ApiError> {
    let Json(body) = payload.map_err(|e| bad_body(&e))?;
    let request = StrategyRequest::new(body.goal_text.unwrap_or_default());

    let result = state.strategies.generate(request).await.map_err(|e| api_error(&e))?;
    if let Outcome::Degraded(reason) = result.outcome {
        tracing::info!(?reason, "Serving canned strategy");
    }

    Ok((status_for(result.outcome), Json(StrategyResponse { strategy: result.value })))
}

/// Stored history for a wallet
pub async fn transactions_handler(
    State(state): State<AppState>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Json<TransactionsResponse>, ApiError> {
    let address = query.address.unwrap_or_default();
    let address = address.trim();
    if address.is_empty() {
        return Err(api_error(&InsightError::InvalidInput("Wallet address is required".into())));
    }

    Ok(Json(TransactionsResponse {
        transactions: state.memory.get_default(address).await,
    }))
}

/// Balance, transfers and token transfers from the block explorer.
///
/// Nothing is stored; callers index what they want through the index route.
pub async fn fetch_handler(
    State(state): State<AppState>,
    payload: Result<Json<FetchBody>, JsonRejection>,
) -> Result<Json<WalletSnapshot>, ApiError> {
    let Json(body) = payload.map_err(|e| bad_body(&e))?;
    let snapshot = state
        .chain
        .snapshot(&body.address.unwrap_or_default())
        .await
        .map_err(|e| api_error(&e))?;

    Ok(Json(snapshot))
}

/// Embed and store transactions for later insight requests
pub async fn index_handler(
    State(state): State<AppState>,
    payload: Result<Json<IndexBody>, JsonRejection>,
) -> Result<Json<IndexReport>, ApiError> {
    let Json(body) = payload.map_err(|e| bad_body(&e))?;
    let transactions = TransactionRecord::parse_lenient(body.transactions.unwrap_or_default());

    let report = state
        .indexer
        .index(
            &body.wallet_address.unwrap_or_default(),
            &transactions,
            body.eth_usd.unwrap_or(Decimal::ZERO),
        )
        .await
        .map_err(|e| api_error(&e))?;

    tracing::info!(submitted = report.submitted, indexed = report.indexed, "Indexed transactions");
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, header},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use insight_core::{
        ChainDataSource, ChainGateway, CompletionClient, EmbeddingClient, InMemoryStore, LlmProvider, MemoryGateway,
        Message, Result, TokenTransfer,
        model::TokenMetadata,
        provider::{Completion, FinishReason, GenerationOptions},
    };

    use super::*;

    /// Provider with a fixed answer; `None` panics mid-call
    struct Scripted {
        configured: bool,
        reply: Option<&'static str>,
    }

    #[async_trait]
    impl LlmProvider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn complete(&self, _messages: &[Message], options: &GenerationOptions) -> Result<Completion> {
            let Some(text) = self.reply else {
                panic!("provider blew up");
            };
            Ok(Completion {
                content: text.into(),
                model: options.model.clone(),
                usage: None,
                finish_reason: Some(FinishReason::Stop),
            })
        }
    }

    /// Explorer answering with a fixed wallet
    struct FixedChain;

    #[async_trait]
    impl ChainDataSource for FixedChain {
        fn is_configured(&self) -> bool {
            true
        }

        async fn balance(&self, _address: &str) -> Result<Decimal> {
            Ok(Decimal::new(125, 2))
        }

        async fn transactions(&self, _address: &str, _limit: usize) -> Result<Vec<TransactionRecord>> {
            Ok(vec![TransactionRecord {
                hash: "0xchain".into(),
                from: "0xa".into(),
                to: "0xb".into(),
                value: Decimal::new(5, 1),
                timestamp: 1_700_000_000,
                gas_used: Decimal::new(21, 6),
                gas_price: Decimal::from(20),
                token: TokenMetadata::default(),
            }])
        }

        async fn token_transfers(&self, _address: &str, _limit: usize) -> Result<Vec<TokenTransfer>> {
            Err(insight_core::InsightError::ChainData("NOTOK".into()))
        }
    }

    const INSIGHTS: &str = r#"[{"title": "Gas heavy week", "description": "Fees ate 4% of volume", "impactScore": 7, "type": "gas"}]"#;
    const STRATEGY: &str = r#"{"strategy": "Weekly DCA", "timeline": "12 months", "risk": 4, "suggestion": "Automate buys", "expectedReturn": "8%"}"#;

    fn app(configured: bool, reply: Option<&'static str>) -> axum::Router {
        app_with_chain(configured, reply, ChainGateway::disabled())
    }

    fn app_with_chain(configured: bool, reply: Option<&'static str>, chain: ChainGateway) -> axum::Router {
        let state = AppState::new(
            Arc::new(CompletionClient::new(Arc::new(Scripted { configured, reply }))),
            Arc::new(MemoryGateway::new(Arc::new(InMemoryStore::new()))),
            Arc::new(EmbeddingClient::disabled()),
            Arc::new(chain),
            None,
            Duration::from_millis(50),
        );
        crate::router(state)
    }

    async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post(uri: &str, body: &Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn transaction(hash: &str) -> Value {
        json!({
            "hash": hash,
            "from": "0xa",
            "to": "0xb",
            "value": "0.5",
            "timestamp": 1_700_000_000,
            "gasUsed": "0.000021",
            "gasPrice": "20"
        })
    }

    #[tokio::test]
    async fn test_health_reports_availability() {
        let (status, body) = send(app(true, Some(INSIGHTS)), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["completion"], "available");
        assert_eq!(body["memory"], "available");
        assert_eq!(body["embeddings"], "unavailable");
        assert_eq!(body["chain"], "unavailable");
    }

    #[tokio::test]
    async fn test_insights_generated() {
        let payload = json!({"walletAddress": "0xa", "transactions": [transaction("0x1")]});
        let (status, body) = send(app(true, Some(INSIGHTS)), post("/api/ai", &payload)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["insights"][0]["title"], "Gas heavy week");
        assert_eq!(body["insights"][0]["impactScore"], 7);
    }

    #[tokio::test]
    async fn test_insights_missing_wallet_is_bad_request() {
        let payload = json!({"transactions": [transaction("0x1")]});
        let (status, body) = send(app(true, Some(INSIGHTS)), post("/api/ai", &payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_INPUT");
        assert_eq!(body["error"], "Wallet address is required");
    }

    #[tokio::test]
    async fn test_insights_unconfigured_is_canned_success() {
        let payload = json!({"walletAddress": "0xa", "transactions": [transaction("0x1")]});
        let (status, body) = send(app(false, None), post("/api/ai", &payload)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["insights"][0]["title"], InsightRecord::unconfigured().title);
    }

    #[tokio::test]
    async fn test_insights_without_history() {
        let payload = json!({"walletAddress": "0xa"});
        let (status, body) = send(app(true, None), post("/api/ai", &payload)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["insights"][0]["title"], InsightRecord::no_history().title);
    }

    #[tokio::test]
    async fn test_insights_fault_keeps_record_in_body() {
        let payload = json!({"walletAddress": "0xa", "transactions": [transaction("0x1")]});
        let (status, body) = send(app(true, None), post("/api/ai", &payload)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["insights"][0]["title"], InsightRecord::request_failed().title);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let request = Request::post("/api/ai")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(app(true, Some(INSIGHTS)), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_BODY");
    }

    #[tokio::test]
    async fn test_goal_strategy_generated() {
        let (status, body) = send(app(true, Some(STRATEGY)), post("/api/goals", &json!({"goalText": "Save for a car"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["strategy"]["strategy"], "Weekly DCA");
        assert_eq!(body["strategy"]["expectedReturn"], "8%");
    }

    #[tokio::test]
    async fn test_empty_goal_is_bad_request() {
        let (status, body) = send(app(true, Some(STRATEGY)), post("/api/goals", &json!({"goalText": ""}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Goal text is required");
    }

    #[tokio::test]
    async fn test_goal_unconfigured_is_canned_success() {
        let (status, body) = send(app(false, None), post("/api/goals", &json!({"goalText": "Retire early"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["strategy"]["risk"], 5);
        assert_eq!(body["strategy"]["timeline"], "N/A");
    }

    #[tokio::test]
    async fn test_index_then_list_and_generate_from_memory() {
        let app = app(true, Some(INSIGHTS));

        let payload = json!({
            "walletAddress": "0xa",
            "transactions": [transaction("0x1"), transaction("0x2"), {"hash": ""}],
            "ethUsd": 2000
        });
        let (status, body) = send(app.clone(), post("/api/transactions/index", &payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["submitted"], 2);
        assert_eq!(body["indexed"], 2);

        let (status, body) = send(app.clone(), get("/api/transactions?address=0xa")).await;
        assert_eq!(status, StatusCode::OK);
        let stored = body["transactions"].as_array().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0]["walletAddress"], "0xa");

        // Persisted history now feeds insights even with nothing supplied
        let (status, body) = send(app, post("/api/ai", &json!({"walletAddress": "0xa"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["insights"][0]["title"], "Gas heavy week");
    }

    #[tokio::test]
    async fn test_list_requires_address() {
        let (status, body) = send(app(true, None), get("/api/transactions")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_index_requires_wallet() {
        let payload = json!({"transactions": [transaction("0x1")]});
        let (status, _) = send(app(true, None), post("/api/transactions/index", &payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_insights_with_null_transactions() {
        let payload = json!({"walletAddress": "0xa", "transactions": null});
        let (status, body) = send(app(false, None), post("/api/ai", &payload)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["insights"][0]["title"], InsightRecord::no_history().title);
    }

    #[tokio::test]
    async fn test_index_with_null_transactions() {
        let payload = json!({"walletAddress": "0xa", "transactions": null});
        let (status, body) = send(app(true, None), post("/api/transactions/index", &payload)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["submitted"], 0);
        assert_eq!(body["indexed"], 0);
    }

    #[tokio::test]
    async fn test_goal_fault_keeps_strategy_in_body() {
        let (status, body) = send(app(true, None), post("/api/goals", &json!({"goalText": "Buy a house"}))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["strategy"]["strategy"], StrategyRecord::unavailable().strategy);
        assert_eq!(body["strategy"]["risk"], 5);
    }

    #[tokio::test]
    async fn test_fetch_wallet_from_chain() {
        let app = app_with_chain(true, None, ChainGateway::new(Arc::new(FixedChain)));
        let (status, body) = send(app, post("/api/transactions", &json!({"address": "0xa"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["balance"], "1.25");
        assert_eq!(body["transactions"][0]["hash"], "0xchain");
        assert_eq!(body["transactions"][0]["value"], "0.5");
        assert!(body["tokens"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_without_explorer_is_empty() {
        let (status, body) = send(app(true, None), post("/api/transactions", &json!({"address": "0xa"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["balance"], "0");
        assert!(body["transactions"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_requires_address() {
        let (status, body) = send(app(true, None), post("/api/transactions", &json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Wallet address is required");
    }
}
