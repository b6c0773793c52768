use axum::{extract::State, http::StatusCode};

use crate::common::AppState;
use crate::error::{AppError, AppResult};

/// Health check endpoint
///
/// Returns 200 when the database answers a ping, 503 otherwise.
/// Not rate-limited.
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service and database are healthy"),
        (status = 503, description = "Database unreachable"),
    ),
    tag = "health"
)]
pub async fn healthz(State(state): State<AppState>) -> AppResult<StatusCode> {
    state.db.ping().await.map_err(|e| {
        tracing::warn!(error = %e, "Database ping failed");
        AppError::ServiceUnavailable("Database unavailable".to_string())
    })?;

    Ok(StatusCode::OK)
}
