use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::ApiError;
use crate::domains::documents::models::PvDocument;
use crate::kernel::traits::BaseDocumentStore;

pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    station_code: i32,
    label: String,
    path: String,
    content_hash: String,
    size_bytes: i64,
    uploaded_by: String,
    uploaded_at: DateTime<Utc>,
}

impl From<DocumentRow> for PvDocument {
    fn from(r: DocumentRow) -> Self {
        PvDocument {
            id: r.id,
            station_code: r.station_code,
            label: r.label,
            path: r.path,
            content_hash: r.content_hash,
            size_bytes: r.size_bytes,
            uploaded_by: r.uploaded_by,
            uploaded_at: r.uploaded_at,
        }
    }
}

#[async_trait]
impl BaseDocumentStore for PgDocumentStore {
    async fn insert(&self, document: PvDocument) -> Result<PvDocument, ApiError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            INSERT INTO pv_documents
                (id, station_code, label, path, content_hash, size_bytes, uploaded_by, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(document.id)
        .bind(document.station_code)
        .bind(&document.label)
        .bind(&document.path)
        .bind(&document.content_hash)
        .bind(document.size_bytes)
        .bind(&document.uploaded_by)
        .bind(document.uploaded_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn for_station(&self, code: i32) -> Result<Vec<PvDocument>, ApiError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT * FROM pv_documents WHERE station_code = $1 ORDER BY uploaded_at",
        )
        .bind(code)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_for_stations(&self, codes: &[i32]) -> Result<i64, ApiError> {
        if codes.is_empty() {
            return Ok(0);
        }
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM pv_documents WHERE station_code = ANY($1)")
                .bind(codes)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
