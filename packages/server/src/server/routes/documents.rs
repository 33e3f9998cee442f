use axum::{
    extract::{Extension, Multipart, Path},
    Json,
};

use crate::common::{ApiError, CurrentUser};
use crate::domains::documents::activities;
use crate::domains::documents::models::{PvDocument, PvDocumentView};
use crate::server::app::AppState;

/// Multipart upload of a procès-verbal scan. The first file field is taken;
/// other fields are ignored.
pub async fn upload_handler(
    Extension(state): Extension<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(station_code): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<PvDocumentView>, ApiError> {
    let user = current.require()?.clone();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidPayload(format!("malformed multipart body: {}", e)))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidPayload(format!("failed to read upload: {}", e)))?;

        let view = activities::upload_pv(
            &state.deps,
            &user,
            station_code,
            &filename,
            bytes.to_vec(),
        )
        .await?;
        return Ok(Json(view));
    }

    Err(ApiError::InvalidPayload(
        "multipart body contains no file field".to_string(),
    ))
}

pub async fn list_handler(
    Extension(state): Extension<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(station_code): Path<i32>,
) -> Result<Json<Vec<PvDocument>>, ApiError> {
    let user = current.require()?;
    let documents = activities::list_station_documents(&state.deps, user, station_code).await?;
    Ok(Json(documents))
}
