//! HTTP server setup: router and API routes.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use super::state::ApiState;
use crate::error::{Error, IngestError};

/// Start the HTTP server on the given address.
///
/// Returns a handle that resolves when the server shuts down. The caller
/// passes a `tokio::sync::watch::Receiver<bool>` for graceful shutdown.
pub async fn start_http_server(
    bind: SocketAddr,
    state: Arc<ApiState>,
    shutdown_rx: tokio::sync::watch::Receiver<bool>,
) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/chat", post(chat))
        .route("/ingest", post(ingest));

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(%bind, "HTTP server listening");

    let handle = tokio::spawn(async move {
        let mut shutdown = shutdown_rx;
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.wait_for(|v| *v).await;
            })
            .await
            .ok();
    });

    Ok(handle)
}

// -- API handlers --

#[derive(Deserialize)]
struct ChatRequest {
    question: String,
}

#[derive(Deserialize)]
struct IngestRequest {
    path: PathBuf,
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn status(State(state): State<Arc<ApiState>>) -> Json<serde_json::Value> {
    let uptime = state.started_at.elapsed();
    Json(serde_json::json!({
        "status": "running",
        "pid": std::process::id(),
        "uptime_seconds": uptime.as_secs(),
    }))
}

/// Answer a question against the index. Per-request failures come back as a
/// JSON error body; they never take the server down.
async fn chat(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    match state.engine.answer(&request.question).await {
        Ok(answer) => Ok(Json(serde_json::json!({
            "answer": answer.text,
            "sources": answer.sources,
        }))),
        Err(error) => {
            tracing::error!(%error, "chat request failed");
            Err(error_response(error))
        }
    }
}

/// Ingest a document by path, returning the number of chunks written.
async fn ingest(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    match state.pipeline.ingest(&request.path).await {
        Ok(chunks) => Ok(Json(serde_json::json!({ "chunks": chunks }))),
        Err(error) => {
            tracing::error!(%error, path = %request.path.display(), "ingest request failed");
            Err(error_response(error))
        }
    }
}

fn error_response(error: Error) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &error {
        Error::Ingest(IngestError::DocumentNotFound(_)) => StatusCode::NOT_FOUND,
        Error::Ingest(IngestError::DocumentUnreadable { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "error": error.to_string() })))
}
