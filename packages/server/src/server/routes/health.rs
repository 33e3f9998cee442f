use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;

use crate::server::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    territory: TerritoryHealth,
}

#[derive(Serialize)]
pub struct TerritoryHealth {
    status: String,
    nodes: usize,
}

/// Health check endpoint.
///
/// The territorial index is loaded at startup; an empty index means the
/// reference data never made it in and the service cannot do useful work.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let nodes = state.deps.territory.len();
    let healthy = nodes > 0;

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
            territory: TerritoryHealth {
                status: if healthy { "ok" } else { "empty" }.to_string(),
                nodes,
            },
        }),
    )
}
