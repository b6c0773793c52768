use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};

use crate::common::AppState;
use crate::error::{AppError, AppResult};
use crate::routes::{ErrorBody, MessageBody};
use crate::services::dams::{DamFilter, DamParams, find_dam_levels};

use super::types::DamLevelResponse;

/// Query dam water levels
///
/// Most recent observations first. `dam` accepts an id or a case-insensitive
/// fragment of the English name; `date` restricts to one UTC day.
#[utoipa::path(
    get,
    path = "/dams",
    params(DamParams),
    responses(
        (status = 200, description = "Matching dam levels, newest first", body = Vec<DamLevelResponse>),
        (status = 400, description = "Invalid query parameters", body = ErrorBody),
        (status = 404, description = "No data found matching the criteria", body = MessageBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    ),
    tag = "dams"
)]
pub async fn list_dam_levels(
    State(state): State<AppState>,
    query: Result<Query<DamParams>, QueryRejection>,
) -> AppResult<Json<Vec<DamLevelResponse>>> {
    let Query(params) = query?;
    let filter = DamFilter::from_params(&params)?;
    tracing::debug!(?filter, "Querying dam levels");

    let rows = find_dam_levels(state.db.as_ref(), &filter).await?;
    if rows.is_empty() {
        return Err(AppError::no_data());
    }

    Ok(Json(rows.into_iter().map(DamLevelResponse::from).collect()))
}
