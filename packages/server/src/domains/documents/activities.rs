//! Procès-verbal document upload and listing.

use chrono::Utc;
use uuid::Uuid;

use crate::common::{ApiError, AuthUser};
use crate::domains::access::models::AccessLevel;
use crate::domains::access::resolver::require_access;
use crate::domains::documents::models::{PvDocument, PvDocumentView};
use crate::domains::territory::NodeKind;
use crate::kernel::ServerDeps;

/// Store an uploaded PV for a polling station. The bytes go to the blob
/// store; the metadata row records where they live and their hash.
pub async fn upload_pv(
    deps: &ServerDeps,
    user: &AuthUser,
    station_code: i32,
    filename: &str,
    bytes: Vec<u8>,
) -> Result<PvDocumentView, ApiError> {
    deps.territory
        .node_of_kind(station_code, NodeKind::PollingStation)?;
    require_access(deps, user, station_code, AccessLevel::Edit).await?;

    if bytes.is_empty() {
        return Err(ApiError::InvalidPayload(
            "uploaded document is empty".to_string(),
        ));
    }
    let label = filename.trim();
    if label.is_empty() {
        return Err(ApiError::InvalidPayload(
            "uploaded document has no filename".to_string(),
        ));
    }

    let blob = deps.blobs.store(label, &bytes).await?;
    let document = deps
        .documents
        .insert(PvDocument {
            id: Uuid::new_v4(),
            station_code,
            label: label.to_string(),
            path: blob.path,
            content_hash: blob.content_hash,
            size_bytes: bytes.len() as i64,
            uploaded_by: user.user_id.clone(),
            uploaded_at: Utc::now(),
        })
        .await?;

    Ok(PvDocumentView {
        ancestry: deps.territory.ancestry(station_code)?,
        document,
    })
}

/// Documents on file for a polling station, oldest first.
pub async fn list_station_documents(
    deps: &ServerDeps,
    user: &AuthUser,
    station_code: i32,
) -> Result<Vec<PvDocument>, ApiError> {
    deps.territory
        .node_of_kind(station_code, NodeKind::PollingStation)?;
    require_access(deps, user, station_code, AccessLevel::Read).await?;
    deps.documents.for_station(station_code).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::territory::index::fixtures::small_tree;

    fn admin() -> AuthUser {
        AuthUser {
            user_id: "admin-1".to_string(),
            role: "administrateur".to_string(),
        }
    }

    #[tokio::test]
    async fn test_upload_records_metadata() {
        let deps = ServerDeps::in_memory(small_tree());
        let view = upload_pv(&deps, &admin(), 111, "pv-111.pdf", b"%PDF-1.4 ...".to_vec())
            .await
            .unwrap();
        assert_eq!(view.document.station_code, 111);
        assert_eq!(view.document.label, "pv-111.pdf");
        assert_eq!(view.document.size_bytes, 12);
        assert!(!view.document.content_hash.is_empty());
        assert_eq!(view.document.uploaded_by, "admin-1");

        let listed = list_station_documents(&deps, &admin(), 111).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_upload_rejected() {
        let deps = ServerDeps::in_memory(small_tree());
        let result = upload_pv(&deps, &admin(), 111, "pv.pdf", Vec::new()).await;
        assert!(matches!(result, Err(ApiError::InvalidPayload(_))));
    }

    #[tokio::test]
    async fn test_upload_to_non_station_rejected() {
        let deps = ServerDeps::in_memory(small_tree());
        // 11 is an arrondissement
        let result = upload_pv(&deps, &admin(), 11, "pv.pdf", b"data".to_vec()).await;
        assert!(matches!(result, Err(ApiError::InvalidPayload(_))));
    }

    #[tokio::test]
    async fn test_listing_requires_read_access() {
        let deps = ServerDeps::in_memory(small_tree());
        let stranger = AuthUser {
            user_id: "stranger".to_string(),
            role: "operateur-departemental".to_string(),
        };
        let result = list_station_documents(&deps, &stranger, 111).await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }
}
