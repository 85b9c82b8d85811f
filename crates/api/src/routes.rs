//! HTTP route handlers and the WebSocket streaming protocol.

use crate::AppState;
use axum::{
    Json,
    extract::{State, WebSocketUpgrade, ws},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lantern_common::{WorkflowSnapshot, WorkflowState};
use lantern_pipeline::{ProgressSender, progress_channel};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// API error with a status code and machine-readable code.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: &'static str,
    #[serde(skip)]
    pub status: StatusCode,
}

impl ApiError {
    fn internal(error: impl Into<String>, code: &'static str) -> Self {
        Self {
            error: error.into(),
            code,
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn not_found(error: impl Into<String>, code: &'static str) -> Self {
        Self {
            error: error.into(),
            code,
            status: StatusCode::NOT_FOUND,
        }
    }

    fn bad_request(error: impl Into<String>, code: &'static str) -> Self {
        Self {
            error: error.into(),
            code,
            status: StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub model: String,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
        model: state.model_name(),
    })
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub query: String,
    pub report: String,
}

/// Accept a query and process it in the background on a fresh orchestrator.
/// Progress is available through `/api/v1/status`.
pub async fn submit_query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    if request.query.trim().is_empty() {
        return Err(ApiError::bad_request("Query must not be empty", "EMPTY_QUERY"));
    }

    info!(
        query_preview = %request.query.chars().take(50).collect::<String>(),
        "Received query"
    );

    let orchestrator = state
        .build_orchestrator()
        .map_err(|e| ApiError::internal(format!("Failed to build pipeline: {e}"), "WIRING_ERROR"))?;
    state.set_current(orchestrator.clone()).await;

    let query = request.query.clone();
    tokio::spawn(async move {
        if let Err(e) = orchestrator
            .process_query(&query, &ProgressSender::noop())
            .await
        {
            error!(error = %e, "Background run failed");
        }
    });

    Ok(Json(QueryResponse {
        query: request.query,
        report: "Processing query in the background. Check /api/v1/status for updates.".into(),
    }))
}

/// Snapshot of the current run, queryable independent of any streaming
/// consumer.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<WorkflowSnapshot> {
    match state.current().await {
        Some(orchestrator) => Json(orchestrator.snapshot().await),
        None => Json(WorkflowState::default().snapshot()),
    }
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub query: String,
    pub report: String,
}

pub async fn get_report(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReportResponse>, ApiError> {
    let orchestrator = state
        .current()
        .await
        .ok_or_else(|| ApiError::not_found("No report available yet", "NO_REPORT"))?;

    match orchestrator.final_report().await {
        Some(report) => Ok(Json(ReportResponse {
            query: orchestrator.snapshot().await.query,
            report,
        })),
        None => Err(ApiError::not_found("No report available yet", "NO_REPORT")),
    }
}

/// WebSocket endpoint for real-time progress streaming.
///
/// Protocol, per run: one inbound `{"query": ...}` message, zero or more
/// `{"status": ...}` messages in pipeline order, then exactly one terminal
/// message — `{"report": ..., "status": "complete"}` or `{"error": ...}`.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

async fn handle_websocket(mut socket: ws::WebSocket, state: Arc<AppState>) {
    info!("WebSocket connection established");

    while let Some(message) = socket.recv().await {
        let text = match message {
            Ok(ws::Message::Text(text)) => text,
            Ok(ws::Message::Close(_)) => {
                info!("WebSocket connection closed");
                return;
            }
            Ok(_) => continue,
            Err(e) => {
                debug!(error = %e, "WebSocket receive error");
                return;
            }
        };

        let query = match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(value) => match value.get("query").and_then(|q| q.as_str()) {
                Some(query) if !query.trim().is_empty() => query.to_string(),
                _ => {
                    send_json(&mut socket, &json!({"error": "Expected a {\"query\": ...} message"}))
                        .await;
                    continue;
                }
            },
            Err(e) => {
                send_json(&mut socket, &json!({"error": format!("Invalid JSON: {e}")})).await;
                continue;
            }
        };

        run_streamed_query(&mut socket, &state, &query).await;
    }
}

/// Drive one run, forwarding progress events as they arrive and finishing
/// with the terminal frame. The run always completes even if the client
/// disconnects mid-stream.
async fn run_streamed_query(socket: &mut ws::WebSocket, state: &Arc<AppState>, query: &str) {
    let orchestrator = match state.build_orchestrator() {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            send_json(socket, &json!({"error": format!("Failed to build pipeline: {e}")})).await;
            return;
        }
    };
    state.set_current(orchestrator.clone()).await;

    let (progress, mut events) = progress_channel();
    let run = {
        let orchestrator = orchestrator.clone();
        let query = query.to_string();
        tokio::spawn(async move { orchestrator.process_query(&query, &progress).await })
    };

    // Forward events until the run drops its sender. Send failures mean
    // the consumer went away; the run continues regardless.
    let mut client_gone = false;
    while let Some(event) = events.recv().await {
        if client_gone {
            continue;
        }
        let frame = json!({"status": event.message});
        if !send_json(socket, &frame).await {
            warn!("WebSocket consumer disconnected mid-run; run continues");
            client_gone = true;
        }
    }

    let terminal = match run.await {
        Ok(Ok(report)) => json!({"report": report, "status": "complete"}),
        Ok(Err(e)) => json!({"error": e.to_string()}),
        Err(e) => json!({"error": format!("Run task failed: {e}")}),
    };

    if !client_gone {
        send_json(socket, &terminal).await;
    }
}

async fn send_json(socket: &mut ws::WebSocket, value: &serde_json::Value) -> bool {
    socket
        .send(ws::Message::Text(value.to_string().into()))
        .await
        .is_ok()
}
