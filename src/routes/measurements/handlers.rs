use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};

use crate::common::AppState;
use crate::error::{AppError, AppResult};
use crate::routes::{ErrorBody, MessageBody};
use crate::services::measurements::{
    MeasurementFilter, MeasurementParams, MeasurementRow, find_measurements,
};

/// Query hourly air-quality measurements
///
/// All filters are optional and combined with AND. Results are ordered by id;
/// use `limit` (max 500) and `offset` to page.
#[utoipa::path(
    get,
    path = "/measurements",
    params(MeasurementParams),
    responses(
        (status = 200, description = "Matching measurements", body = Vec<MeasurementRow>),
        (status = 400, description = "Invalid query parameters", body = ErrorBody),
        (status = 404, description = "No data found matching the criteria", body = MessageBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    ),
    tag = "measurements"
)]
pub async fn list_measurements(
    State(state): State<AppState>,
    query: Result<Query<MeasurementParams>, QueryRejection>,
) -> AppResult<Json<Vec<MeasurementRow>>> {
    let Query(params) = query?;
    let filter = MeasurementFilter::from_params(&params)?;
    tracing::debug!(?filter, "Querying measurements");

    let rows = find_measurements(state.db.as_ref(), &filter).await?;
    if rows.is_empty() {
        return Err(AppError::no_data());
    }

    Ok(Json(rows))
}
