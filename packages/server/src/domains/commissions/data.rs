use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::ApiError;
use crate::domains::commissions::models::{Commission, CommissionMember};
use crate::kernel::traits::BaseCommissionStore;

pub struct PgCommissionStore {
    pool: PgPool,
}

impl PgCommissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CommissionRow {
    id: Uuid,
    department_code: i32,
    libelle: String,
    created_at: DateTime<Utc>,
}

impl From<CommissionRow> for Commission {
    fn from(r: CommissionRow) -> Self {
        Commission {
            id: r.id,
            department_code: r.department_code,
            libelle: r.libelle,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MemberRow {
    id: Uuid,
    commission_id: Uuid,
    full_name: String,
    fonction: String,
    added_at: DateTime<Utc>,
}

impl From<MemberRow> for CommissionMember {
    fn from(r: MemberRow) -> Self {
        CommissionMember {
            id: r.id,
            commission_id: r.commission_id,
            full_name: r.full_name,
            fonction: r.fonction,
            added_at: r.added_at,
        }
    }
}

#[async_trait]
impl BaseCommissionStore for PgCommissionStore {
    async fn upsert_commission(
        &self,
        department_code: i32,
        libelle: &str,
    ) -> Result<Commission, ApiError> {
        let row = sqlx::query_as::<_, CommissionRow>(
            r#"
            INSERT INTO commissions (id, department_code, libelle)
            VALUES ($1, $2, $3)
            ON CONFLICT (department_code) DO UPDATE SET libelle = EXCLUDED.libelle
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(department_code)
        .bind(libelle)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn commission_for_department(&self, code: i32) -> Result<Option<Commission>, ApiError> {
        let row = sqlx::query_as::<_, CommissionRow>(
            "SELECT * FROM commissions WHERE department_code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn upsert_member(
        &self,
        commission_id: Uuid,
        full_name: &str,
        fonction: &str,
    ) -> Result<CommissionMember, ApiError> {
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            INSERT INTO commission_members (id, commission_id, full_name, fonction)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (commission_id, full_name) DO UPDATE SET fonction = EXCLUDED.fonction
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(commission_id)
        .bind(full_name)
        .bind(fonction)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn members(&self, commission_id: Uuid) -> Result<Vec<CommissionMember>, ApiError> {
        let rows = sqlx::query_as::<_, MemberRow>(
            "SELECT * FROM commission_members WHERE commission_id = $1 ORDER BY added_at",
        )
        .bind(commission_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
