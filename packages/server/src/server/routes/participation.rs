use axum::{
    extract::{Extension, Path},
    Json,
};

use crate::common::{ApiError, CurrentUser};
use crate::domains::participation::activities;
use crate::domains::participation::models::{
    DepartmentParticipationPayload, ParticipationRecord, ParticipationView, StationParticipation,
    StationParticipationPayload,
};
use crate::domains::tally::ParticipationAggregate;
use crate::server::app::AppState;

pub async fn upsert_department_handler(
    Extension(state): Extension<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(department_code): Path<i32>,
    Json(payload): Json<DepartmentParticipationPayload>,
) -> Result<Json<ParticipationView<ParticipationRecord>>, ApiError> {
    let user = current.require()?;
    let view =
        activities::upsert_department_participation(&state.deps, user, department_code, payload)
            .await?;
    Ok(Json(view))
}

pub async fn upsert_station_handler(
    Extension(state): Extension<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(station_code): Path<i32>,
    Json(payload): Json<StationParticipationPayload>,
) -> Result<Json<ParticipationView<StationParticipation>>, ApiError> {
    let user = current.require()?;
    let view =
        activities::upsert_station_participation(&state.deps, user, station_code, payload).await?;
    Ok(Json(view))
}

pub async fn department_aggregate_handler(
    Extension(state): Extension<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(department_code): Path<i32>,
) -> Result<Json<ParticipationAggregate>, ApiError> {
    let user = current.require()?;
    let aggregate = activities::department_aggregate(&state.deps, user, department_code).await?;
    Ok(Json(aggregate))
}
