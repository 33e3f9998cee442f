use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::common::{ApiError, CurrentUser};
use crate::domains::corrections::activities::{
    self, CorrectionPayload, ReviewAction, ReviewPayload,
};
use crate::domains::corrections::models::{CorrectionEntry, CorrectionView, TargetKind};
use crate::server::app::AppState;

pub async fn submit_handler(
    Extension(state): Extension<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path((kind, station_code)): Path<(String, i32)>,
    Json(payload): Json<CorrectionPayload>,
) -> Result<Json<CorrectionView>, ApiError> {
    let user = current.require()?;
    let kind = TargetKind::parse(&kind)?;
    let view =
        activities::submit_correction(&state.deps, user, kind, station_code, payload).await?;
    Ok(Json(view))
}

pub async fn review_handler(
    Extension(state): Extension<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path((correction_id, action)): Path<(Uuid, String)>,
    Json(payload): Json<ReviewPayload>,
) -> Result<Json<CorrectionEntry>, ApiError> {
    let user = current.require()?;
    let action = ReviewAction::parse(&action)?;
    let entry =
        activities::review_correction(&state.deps, user, correction_id, action, payload).await?;
    Ok(Json(entry))
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Required for vote-count targets.
    pub party: Option<String>,
}

pub async fn history_handler(
    Extension(state): Extension<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path((kind, station_code)): Path<(String, i32)>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<CorrectionEntry>>, ApiError> {
    let user = current.require()?;
    let kind = TargetKind::parse(&kind)?;
    let history =
        activities::correction_history(&state.deps, user, kind, station_code, query.party).await?;
    Ok(Json(history))
}
