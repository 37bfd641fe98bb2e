//! wallet-insights HTTP Server
//!
//! Axum server exposing wallet insights, goal strategies, on-chain wallet
//! lookups and the transaction memory used to ground insights.

mod handlers;
mod state;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use insight_core::Availability;

use crate::handlers::{
    fetch_handler, goals_handler, health_check, index_handler, insights_handler, transactions_handler,
};
use crate::state::AppState;

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/ai", post(insights_handler))
        .route("/api/goals", post(goals_handler))
        .route("/api/transactions", get(transactions_handler).post(fetch_handler))
        .route("/api/transactions/index", post(index_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn report(name: &str, availability: Availability, hint: &str) {
    match availability {
        Availability::Available => tracing::info!("✓ {name} configured"),
        Availability::Unavailable => {
            tracing::warn!("⚠ {name} not configured; requests will degrade");
            tracing::warn!("  {hint}");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment before reading RUST_LOG
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = AppState::from_env();

    report("OpenAI", state.completion.availability(), "Set OPENAI_API_KEY in .env");
    report("Pinecone", state.memory.availability(), "Set PINECONE_API_KEY in .env");
    report("Etherscan", state.chain.availability(), "Set ETHERSCAN_API_KEY in .env");

    let app = router(state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("wallet-insights server running on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                  - Provider availability");
    tracing::info!("  POST /api/ai                  - Wallet insights");
    tracing::info!("  POST /api/goals               - Goal strategy");
    tracing::info!("  GET  /api/transactions        - Stored history (?address=)");
    tracing::info!("  POST /api/transactions        - Balance and transfers from Etherscan");
    tracing::info!("  POST /api/transactions/index  - Embed and store transactions");

    axum::serve(listener, app).await?;

    Ok(())
}
