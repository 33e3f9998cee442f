use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::ApiError;
use crate::domains::corrections::models::{
    CorrectionEntry, CorrectionTarget, CorrectionValues, NewCorrection, ReviewStatus, TargetKind,
};
use crate::kernel::traits::BaseLedgerStore;

pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CorrectionRow {
    id: Uuid,
    seq: i64,
    target_kind: String,
    station_code: i32,
    party: Option<String>,
    initial: serde_json::Value,
    corrected: serde_json::Value,
    reason: String,
    status: String,
    review_reason: Option<String>,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl CorrectionRow {
    fn into_entry(self) -> Result<CorrectionEntry, ApiError> {
        let target = match TargetKind::parse(&self.target_kind)? {
            TargetKind::Participation => CorrectionTarget::StationParticipation {
                station_code: self.station_code,
            },
            TargetKind::Votes => CorrectionTarget::StationVotes {
                station_code: self.station_code,
                party: self.party.unwrap_or_default(),
            },
        };
        let initial: CorrectionValues = serde_json::from_value(self.initial)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored initial values: {}", e)))?;
        let corrected: CorrectionValues = serde_json::from_value(self.corrected)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored corrected values: {}", e)))?;
        Ok(CorrectionEntry {
            id: self.id,
            seq: self.seq,
            target,
            initial,
            corrected,
            reason: self.reason,
            status: ReviewStatus::parse(&self.status)?,
            review_reason: self.review_reason,
            created_by: self.created_by,
            created_at: self.created_at,
        })
    }
}

fn target_columns(target: &CorrectionTarget) -> (&'static str, i32, Option<&str>) {
    (
        target.kind().as_str(),
        target.station_code(),
        target.party(),
    )
}

#[async_trait]
impl BaseLedgerStore for PgLedgerStore {
    async fn append(&self, correction: NewCorrection) -> Result<CorrectionEntry, ApiError> {
        let (kind, station_code, party) = target_columns(&correction.target);
        let initial = serde_json::to_value(&correction.initial)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("serialize initial: {}", e)))?;
        let corrected = serde_json::to_value(&correction.corrected)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("serialize corrected: {}", e)))?;

        let row = sqlx::query_as::<_, CorrectionRow>(
            r#"
            INSERT INTO corrections
                (id, target_kind, station_code, party, initial, corrected, reason, status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'submitted', $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(kind)
        .bind(station_code)
        .bind(party)
        .bind(initial)
        .bind(corrected)
        .bind(&correction.reason)
        .bind(&correction.created_by)
        .fetch_one(&self.pool)
        .await?;
        row.into_entry()
    }

    async fn get(&self, id: Uuid) -> Result<CorrectionEntry, ApiError> {
        let row = sqlx::query_as::<_, CorrectionRow>("SELECT * FROM corrections WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("correction {}", id)))?;
        row.into_entry()
    }

    async fn history(&self, target: &CorrectionTarget) -> Result<Vec<CorrectionEntry>, ApiError> {
        let (kind, station_code, party) = target_columns(target);
        let rows = sqlx::query_as::<_, CorrectionRow>(
            r#"
            SELECT * FROM corrections
            WHERE target_kind = $1 AND station_code = $2 AND party IS NOT DISTINCT FROM $3
            ORDER BY created_at, seq
            "#,
        )
        .bind(kind)
        .bind(station_code)
        .bind(party)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(CorrectionRow::into_entry).collect()
    }

    async fn latest(
        &self,
        target: &CorrectionTarget,
    ) -> Result<Option<CorrectionEntry>, ApiError> {
        let (kind, station_code, party) = target_columns(target);
        let row = sqlx::query_as::<_, CorrectionRow>(
            r#"
            SELECT * FROM corrections
            WHERE target_kind = $1 AND station_code = $2 AND party IS NOT DISTINCT FROM $3
            ORDER BY created_at DESC, seq DESC
            LIMIT 1
            "#,
        )
        .bind(kind)
        .bind(station_code)
        .bind(party)
        .fetch_optional(&self.pool)
        .await?;
        row.map(CorrectionRow::into_entry).transpose()
    }

    async fn latest_by_kind(
        &self,
        kind: TargetKind,
        status: Option<ReviewStatus>,
    ) -> Result<Vec<CorrectionEntry>, ApiError> {
        let rows = sqlx::query_as::<_, CorrectionRow>(
            r#"
            SELECT DISTINCT ON (station_code, party) *
            FROM corrections
            WHERE target_kind = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY station_code, party, created_at DESC, seq DESC
            "#,
        )
        .bind(kind.as_str())
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(CorrectionRow::into_entry).collect()
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ReviewStatus,
        review_reason: Option<String>,
    ) -> Result<CorrectionEntry, ApiError> {
        let row = sqlx::query_as::<_, CorrectionRow>(
            "UPDATE corrections SET status = $2, review_reason = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(review_reason)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("correction {}", id)))?;
        row.into_entry()
    }
}
