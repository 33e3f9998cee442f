use axum::{
    extract::{Extension, Path},
    Json,
};

use crate::common::{ApiError, CurrentUser};
use crate::domains::commissions::activities;
use crate::domains::commissions::models::{
    CommissionMember, CommissionMemberPayload, CommissionMemberView,
};
use crate::server::app::AppState;

pub async fn upsert_member_handler(
    Extension(state): Extension<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(department_code): Path<i32>,
    Json(payload): Json<CommissionMemberPayload>,
) -> Result<Json<CommissionMemberView>, ApiError> {
    let user = current.require()?;
    let view = activities::upsert_member(&state.deps, user, department_code, payload).await?;
    Ok(Json(view))
}

pub async fn list_members_handler(
    Extension(state): Extension<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(department_code): Path<i32>,
) -> Result<Json<Vec<CommissionMember>>, ApiError> {
    let user = current.require()?;
    let members = activities::list_members(&state.deps, user, department_code).await?;
    Ok(Json(members))
}
