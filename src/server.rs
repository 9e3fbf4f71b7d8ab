// HTTP server for the web terminal
//
// Routes:
// - GET  /         interactive page
// - POST /run      {"cmd": "..."} -> {"output": "..."}
// - GET  /history  last N history lines
// - GET  /health   liveness
// - GET  /metrics  Prometheus scrape endpoint

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::metrics;
use crate::Terminal;

/// Interactive terminal page
const INDEX_HTML: &str = include_str!("assets/index.html");

/// Body of `POST /run`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunRequest {
    /// Raw command line; missing means empty
    #[serde(default)]
    pub cmd: String,
}

/// Response of `POST /run`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResponse {
    /// Command output, or a description of why it did not run
    pub output: String,
}

/// Build the application router around a terminal
pub fn router(terminal: Arc<Terminal>) -> Router {
    if let Err(e) = metrics::init() {
        error!("Failed to register metrics: {}", e);
    }

    Router::new()
        .route("/", get(index_handler))
        .route("/run", post(run_handler))
        .route("/history", get(history_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(terminal)
}

/// Start the HTTP server and serve until Ctrl-C
///
/// # Arguments
/// * `addr` - Address to listen on (default 0.0.0.0:5025)
/// * `terminal` - The terminal shared by all requests
pub async fn serve(addr: SocketAddr, terminal: Arc<Terminal>) -> Result<()> {
    let app = router(terminal);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Web terminal listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Web terminal stopped");
    Ok(())
}

/// Resolve when the process receives Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Run a command; refusals and failures are reported in the body, not the status
async fn run_handler(
    State(terminal): State<Arc<Terminal>>,
    Json(request): Json<RunRequest>,
) -> Json<RunResponse> {
    let output = terminal.run(&request.cmd).await;
    Json(RunResponse { output })
}

async fn history_handler(State(terminal): State<Arc<Terminal>>) -> Json<Vec<String>> {
    Json(terminal.history_view().await)
}

/// Health check endpoint
async fn health_handler() -> impl IntoResponse {
    StatusCode::OK
}

/// Metrics endpoint handler
async fn metrics_handler() -> Response {
    match metrics::gather_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text).into_response(),
        Err(e) => {
            error!("Failed to gather metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error gathering metrics: {}", e),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_request_missing_cmd() {
        let request: RunRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.cmd, "");
    }

    #[test]
    fn test_index_page_uses_endpoints() {
        assert!(INDEX_HTML.contains("/run"));
        assert!(INDEX_HTML.contains("/history"));
    }

    #[tokio::test]
    async fn test_serve_fails_on_bound_port() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let result = serve(addr, Arc::new(Terminal::default())).await;
        assert!(result.is_err());
    }
}
