use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::common::{ApiError, CurrentUser};
use crate::domains::access::activities::{self, AccessDecision, GrantPayload};
use crate::domains::access::models::{AccessGrant, AccessLevel};
use crate::server::app::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub user_id: String,
    pub role: Option<String>,
    pub node: i32,
    pub level: String,
}

/// Evaluate a user's access to a node. Any authenticated caller may ask;
/// the answer is a plain boolean, not an authorization side effect.
pub async fn check_handler(
    Extension(state): Extension<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<CheckQuery>,
) -> Result<Json<AccessDecision>, ApiError> {
    current.require()?;
    let level = AccessLevel::parse(&query.level)?;
    let decision = activities::check_access(
        &state.deps,
        &query.user_id,
        query.role.as_deref(),
        query.node,
        level,
    )
    .await?;
    Ok(Json(decision))
}

pub async fn create_grant_handler(
    Extension(state): Extension<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<GrantPayload>,
) -> Result<Json<AccessGrant>, ApiError> {
    let user = current.require()?;
    let grant = activities::create_grant(&state.deps, user, payload).await?;
    Ok(Json(grant))
}

pub async fn deactivate_grant_handler(
    Extension(state): Extension<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(grant_id): Path<Uuid>,
) -> Result<Json<AccessGrant>, ApiError> {
    let user = current.require()?;
    let grant = activities::deactivate_grant(&state.deps, user, grant_id).await?;
    Ok(Json(grant))
}

#[derive(Debug, Deserialize)]
pub struct ListGrantsQuery {
    pub user_id: String,
}

pub async fn list_grants_handler(
    Extension(state): Extension<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ListGrantsQuery>,
) -> Result<Json<Vec<AccessGrant>>, ApiError> {
    let user = current.require()?;
    let grants = activities::list_grants(&state.deps, user, &query.user_id).await?;
    Ok(Json(grants))
}
