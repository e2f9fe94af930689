//! Log query endpoints.
//!
//! Provides the point-in-time query over the retained history and the
//! buffer clear operation. Malformed query parameters are ignored rather
//! than rejected; a log-inspection query should never fail on a typo'd
//! number.

use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use shared::buffer::QueryResult;
use shared::models::LogFilter;

/// Raw query parameters of `GET /api/logs`.
///
/// Everything is accepted as text and converted leniently: an unparseable
/// `afterId` or `limit` is treated as unset, and `regex` is only honored
/// when literally `true`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogsQuery {
    /// Search text (substring, or pattern when `regex=true`).
    pub search: Option<String>,
    /// Comma-separated list of levels.
    pub levels: Option<String>,
    /// Interpret `search` as a regular expression.
    pub regex: Option<String>,
    /// Exclude entries with ID at or below this cursor.
    pub after_id: Option<String>,
    /// Maximum number of entries returned.
    pub limit: Option<String>,
}

impl From<LogsQuery> for LogFilter {
    fn from(query: LogsQuery) -> Self {
        let levels = match query.levels.as_deref() {
            Some(levels) if !levels.is_empty() => {
                levels.split(',').map(str::to_string).collect()
            }
            _ => Vec::new(),
        };

        Self {
            search: query.search.unwrap_or_default(),
            levels,
            regex: query.regex.as_deref() == Some("true"),
            after_id: query
                .after_id
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            limit: query.limit.and_then(|v| v.parse().ok()).unwrap_or_default(),
        }
    }
}

/// Response for a successful buffer clear.
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    /// Outcome marker, always "cleared".
    pub status: &'static str,
}

/// Error response for failed storage operations.
#[derive(Debug, Serialize, Deserialize)]
pub struct StorageErrorResponse {
    /// Error type.
    pub error: String,
    /// Detailed error message.
    pub message: String,
}

/// Creates the log query routes with application state.
pub fn logs_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/logs", get(get_logs).delete(clear_logs))
        .with_state(state)
}

/// Handler for filtered history queries.
async fn get_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<QueryResult>, (StatusCode, Json<StorageErrorResponse>)> {
    let filter = LogFilter::from(query);

    let result = state.buffer().query(&filter).map_err(|e| {
        tracing::error!(error = %e, "log query failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(StorageErrorResponse {
                error: "storage_error".to_string(),
                message: e.to_string(),
            }),
        )
    })?;

    tracing::debug!(
        total = result.total,
        returned = result.logs.len(),
        "log query executed"
    );

    Ok(Json(result))
}

/// Handler for clearing the retained history.
///
/// IDs are not reset; entries inserted after a clear continue the existing
/// sequence.
async fn clear_logs(
    State(state): State<AppState>,
) -> Result<Json<ClearResponse>, (StatusCode, Json<StorageErrorResponse>)> {
    state.buffer().clear().map_err(|e| {
        tracing::error!(error = %e, "buffer clear failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(StorageErrorResponse {
                error: "storage_error".to_string(),
                message: e.to_string(),
            }),
        )
    })?;

    tracing::info!("log buffer cleared");
    Ok(Json(ClearResponse { status: "cleared" }))
}
