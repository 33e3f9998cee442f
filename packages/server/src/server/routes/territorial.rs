use axum::{
    extract::{Extension, Query},
    Json,
};
use serde::Deserialize;

use crate::common::{ApiError, CurrentUser};
use crate::domains::territory::activities::{self, HierarchyView};
use crate::domains::territory::NodeKind;
use crate::server::app::AppState;

#[derive(Debug, Deserialize)]
pub struct HierarchyQuery {
    /// Root of the requested subtree.
    pub node: i32,
    /// Deepest kind to include; defaults to polling stations.
    pub depth: Option<String>,
}

pub async fn hierarchy_handler(
    Extension(state): Extension<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<HierarchyQuery>,
) -> Result<Json<HierarchyView>, ApiError> {
    let user = current.require()?;
    let depth = query.depth.as_deref().map(NodeKind::parse).transpose()?;
    let view = activities::hierarchy(&state.deps, user, query.node, depth).await?;
    Ok(Json(view))
}
