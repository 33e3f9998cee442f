use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use serde::Deserialize;

use crate::common::{ApiError, CurrentUser};
use crate::domains::corrections::models::ReviewStatus;
use crate::domains::results::activities::{self, NationalResultsView};
use crate::domains::results::models::{ResultRecord, StationVotePayload, StationVoteView};
use crate::server::app::AppState;

pub async fn upsert_station_votes_handler(
    Extension(state): Extension<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(station_code): Path<i32>,
    Json(payload): Json<StationVotePayload>,
) -> Result<Json<StationVoteView>, ApiError> {
    let user = current.require()?;
    let view = activities::upsert_station_votes(&state.deps, user, station_code, payload).await?;
    Ok(Json(view))
}

#[derive(Debug, Default, Deserialize)]
pub struct NationalQuery {
    /// Only apply corrections carrying this review status.
    pub validation_status: Option<String>,
    #[serde(default)]
    pub include_party_details: bool,
}

pub async fn national_results_handler(
    Extension(state): Extension<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<NationalQuery>,
) -> Result<Json<NationalResultsView>, ApiError> {
    let user = current.require()?;
    let status = query
        .validation_status
        .as_deref()
        .map(ReviewStatus::parse)
        .transpose()?;
    let view =
        activities::national_results(&state.deps, user, status, query.include_party_details)
            .await?;
    Ok(Json(view))
}

pub async fn department_results_handler(
    Extension(state): Extension<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(department_code): Path<i32>,
) -> Result<Json<Vec<ResultRecord>>, ApiError> {
    let user = current.require()?;
    let records = activities::department_results(&state.deps, user, department_code).await?;
    Ok(Json(records))
}
