use async_trait::async_trait;
use sqlx::PgPool;

use crate::common::ApiError;
use crate::domains::participation::models::{ParticipationRecord, StationParticipation};
use crate::kernel::traits::BaseParticipationStore;

pub struct PgParticipationStore {
    pool: PgPool,
}

impl PgParticipationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DepartmentRow {
    department_code: i32,
    registered: i64,
    voters: i64,
    null_ballots: i64,
    envelopes: i64,
    emargements: i64,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<DepartmentRow> for ParticipationRecord {
    fn from(r: DepartmentRow) -> Self {
        ParticipationRecord {
            department_code: r.department_code,
            registered: r.registered,
            voters: r.voters,
            null_ballots: r.null_ballots,
            envelopes: r.envelopes,
            emargements: r.emargements,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StationRow {
    station_code: i32,
    registered: i64,
    voters: i64,
    null_ballots: i64,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<StationRow> for StationParticipation {
    fn from(r: StationRow) -> Self {
        StationParticipation {
            station_code: r.station_code,
            registered: r.registered,
            voters: r.voters,
            null_ballots: r.null_ballots,
            updated_at: r.updated_at,
        }
    }
}

#[async_trait]
impl BaseParticipationStore for PgParticipationStore {
    async fn upsert_department(
        &self,
        record: ParticipationRecord,
    ) -> Result<ParticipationRecord, ApiError> {
        let row = sqlx::query_as::<_, DepartmentRow>(
            r#"
            INSERT INTO department_participation
                (department_code, registered, voters, null_ballots, envelopes, emargements, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, now())
            ON CONFLICT (department_code) DO UPDATE SET
                registered = EXCLUDED.registered,
                voters = EXCLUDED.voters,
                null_ballots = EXCLUDED.null_ballots,
                envelopes = EXCLUDED.envelopes,
                emargements = EXCLUDED.emargements,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(record.department_code)
        .bind(record.registered)
        .bind(record.voters)
        .bind(record.null_ballots)
        .bind(record.envelopes)
        .bind(record.emargements)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn department(&self, code: i32) -> Result<Option<ParticipationRecord>, ApiError> {
        let row = sqlx::query_as::<_, DepartmentRow>(
            "SELECT * FROM department_participation WHERE department_code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn upsert_station(
        &self,
        record: StationParticipation,
    ) -> Result<StationParticipation, ApiError> {
        let row = sqlx::query_as::<_, StationRow>(
            r#"
            INSERT INTO station_participation
                (station_code, registered, voters, null_ballots, updated_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (station_code) DO UPDATE SET
                registered = EXCLUDED.registered,
                voters = EXCLUDED.voters,
                null_ballots = EXCLUDED.null_ballots,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(record.station_code)
        .bind(record.registered)
        .bind(record.voters)
        .bind(record.null_ballots)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn stations(&self, codes: &[i32]) -> Result<Vec<StationParticipation>, ApiError> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, StationRow>(
            "SELECT * FROM station_participation WHERE station_code = ANY($1) ORDER BY station_code",
        )
        .bind(codes)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
