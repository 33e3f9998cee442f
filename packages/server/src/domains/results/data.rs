use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::common::ApiError;
use crate::domains::results::models::{ResultRecord, StationVote};
use crate::kernel::traits::BaseVoteStore;

pub struct PgVoteStore {
    pool: PgPool,
}

impl PgVoteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct VoteRow {
    station_code: i32,
    party: String,
    votes: i64,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<VoteRow> for StationVote {
    fn from(r: VoteRow) -> Self {
        StationVote {
            station_code: r.station_code,
            party: r.party,
            votes: r.votes,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ResultRow {
    department_code: i32,
    party: String,
    votes: i64,
    percentage: Decimal,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<ResultRow> for ResultRecord {
    fn from(r: ResultRow) -> Self {
        ResultRecord {
            department_code: r.department_code,
            party: r.party,
            votes: r.votes,
            percentage: r.percentage,
            updated_at: r.updated_at,
        }
    }
}

#[async_trait]
impl BaseVoteStore for PgVoteStore {
    async fn upsert_station_votes(&self, record: StationVote) -> Result<StationVote, ApiError> {
        // seq keeps first-insertion order across upserts, so tie ordering
        // in tallies stays stable
        let row = sqlx::query_as::<_, VoteRow>(
            r#"
            INSERT INTO station_votes (station_code, party, votes, updated_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (station_code, party) DO UPDATE SET
                votes = EXCLUDED.votes,
                updated_at = now()
            RETURNING station_code, party, votes, updated_at
            "#,
        )
        .bind(record.station_code)
        .bind(&record.party)
        .bind(record.votes)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn station_votes(&self, codes: &[i32]) -> Result<Vec<StationVote>, ApiError> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, VoteRow>(
            r#"
            SELECT station_code, party, votes, updated_at
            FROM station_votes
            WHERE station_code = ANY($1)
            ORDER BY seq
            "#,
        )
        .bind(codes)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn all_station_votes(&self) -> Result<Vec<StationVote>, ApiError> {
        let rows = sqlx::query_as::<_, VoteRow>(
            "SELECT station_code, party, votes, updated_at FROM station_votes ORDER BY seq",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn upsert_result(&self, record: ResultRecord) -> Result<ResultRecord, ApiError> {
        let row = sqlx::query_as::<_, ResultRow>(
            r#"
            INSERT INTO result_records (department_code, party, votes, percentage, updated_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (department_code, party) DO UPDATE SET
                votes = EXCLUDED.votes,
                percentage = EXCLUDED.percentage,
                updated_at = now()
            RETURNING department_code, party, votes, percentage, updated_at
            "#,
        )
        .bind(record.department_code)
        .bind(&record.party)
        .bind(record.votes)
        .bind(record.percentage)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn results_for_department(&self, code: i32) -> Result<Vec<ResultRecord>, ApiError> {
        let rows = sqlx::query_as::<_, ResultRow>(
            r#"
            SELECT department_code, party, votes, percentage, updated_at
            FROM result_records
            WHERE department_code = $1
            ORDER BY votes DESC, seq
            "#,
        )
        .bind(code)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
