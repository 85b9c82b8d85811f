//! HTTP/WebSocket gateway for the Lantern OSINT pipeline.
//!
//! # Endpoints
//!
//! - `GET /health` - health check
//! - `POST /api/v1/query` - submit a query, processed in the background
//! - `GET /api/v1/status` - workflow snapshot of the current run
//! - `GET /api/v1/report` - final report, 404 until one exists
//! - `WS /api/v1/ws` - duplex streaming: submit a query, receive ordered
//!   status frames and a single terminal frame
//!
//! # Architecture
//!
//! ```text
//! Client
//!    │ HTTP / WS
//!    ▼
//! ┌─────────────────┐
//! │   API Gateway   │ ◄── this crate
//! │     (Axum)      │
//! └────────┬────────┘
//!          │ one orchestrator per run
//!          ▼
//! ┌─────────────────┐
//! │  Orchestrator   │──► Collector → Verifier → Reporter → EthicalFilter
//! └─────────────────┘
//! ```

pub mod routes;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use state::AppState;

/// Create the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/v1/query", post(routes::submit_query))
        .route("/api/v1/status", get(routes::get_status))
        .route("/api/v1/report", get(routes::get_report))
        .route("/api/v1/ws", get(routes::websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the API server on the given address.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> anyhow::Result<()> {
    let router = create_router(state);

    info!(%addr, "Starting Lantern API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
