//! Server status endpoint.

use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

/// Response for `GET /api/status`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Ring buffer capacity.
    pub buffer_size: usize,
    /// Entries currently retained.
    pub buffer_used: usize,
    /// Lifetime count of ingested lines.
    pub total_received: u64,
    /// Server uptime, seconds-rounded.
    pub uptime: String,
    /// Whether the ingestion source is still open.
    pub stdin_open: bool,
}

/// Creates the status routes with application state.
pub fn status_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(get_status))
        .with_state(state)
}

/// Handler reporting buffer occupancy and upstream liveness.
async fn get_status(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let stats = state.buffer().stats().map_err(|e| {
        tracing::error!(error = %e, "buffer stats failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(StatusResponse {
        buffer_size: stats.capacity,
        buffer_used: stats.used,
        total_received: stats.total_received,
        uptime: format!("{}s", state.uptime_secs()),
        stdin_open: state.hub().is_upstream_open(),
    }))
}
