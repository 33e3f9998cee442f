use std::path::PathBuf;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::common::ApiError;

use super::traits::{BaseBlobStore, StoredBlob};

/// Filesystem blob store for PV documents.
///
/// Files are written under a configured root with a uuid prefix so two
/// uploads with the same filename never collide. The sha256 content hash is
/// returned for duplicate detection.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl BaseBlobStore for FsBlobStore {
    async fn store(&self, filename: &str, bytes: &[u8]) -> Result<StoredBlob, ApiError> {
        // Strip any client-supplied directory components
        let safe_name: String = filename
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        let target = self.root.join(format!("{}-{}", Uuid::new_v4(), safe_name));

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("blob dir: {}", e)))?;
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("blob write: {}", e)))?;

        Ok(StoredBlob {
            path: target.to_string_lossy().into_owned(),
            content_hash: hex::encode(Sha256::digest(bytes)),
        })
    }
}
