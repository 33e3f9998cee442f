use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domains::territory::AncestryLabel;

/// Proces-verbal document submitted for a polling station.
///
/// The file itself lives in the blob store; only the path and content hash
/// are kept here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PvDocument {
    pub id: Uuid,
    pub station_code: i32,
    pub label: String,
    pub path: String,
    pub content_hash: String,
    pub size_bytes: i64,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PvDocumentView {
    #[serde(flatten)]
    pub document: PvDocument,
    pub ancestry: Vec<AncestryLabel>,
}
