use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::ApiError;
use crate::domains::access::models::{AccessGrant, AccessLevel};
use crate::kernel::traits::BaseGrantStore;

pub struct PgGrantStore {
    pool: PgPool,
}

impl PgGrantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct GrantRow {
    id: Uuid,
    user_id: String,
    node_code: i32,
    level: String,
    active: bool,
    granted_at: DateTime<Utc>,
}

impl GrantRow {
    fn into_grant(self) -> Result<AccessGrant, ApiError> {
        Ok(AccessGrant {
            id: self.id,
            user_id: self.user_id,
            node_code: self.node_code,
            level: AccessLevel::parse(&self.level)?,
            active: self.active,
            granted_at: self.granted_at,
        })
    }
}

#[async_trait]
impl BaseGrantStore for PgGrantStore {
    async fn active_grants_for_user(&self, user_id: &str) -> Result<Vec<AccessGrant>, ApiError> {
        let rows = sqlx::query_as::<_, GrantRow>(
            "SELECT * FROM access_grants WHERE user_id = $1 AND active ORDER BY granted_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(GrantRow::into_grant).collect()
    }

    async fn grants_for_user(&self, user_id: &str) -> Result<Vec<AccessGrant>, ApiError> {
        let rows = sqlx::query_as::<_, GrantRow>(
            "SELECT * FROM access_grants WHERE user_id = $1 ORDER BY granted_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(GrantRow::into_grant).collect()
    }

    async fn insert_grant(
        &self,
        user_id: &str,
        node_code: i32,
        level: AccessLevel,
    ) -> Result<AccessGrant, ApiError> {
        let row = sqlx::query_as::<_, GrantRow>(
            r#"
            INSERT INTO access_grants (id, user_id, node_code, level, active)
            VALUES ($1, $2, $3, $4, true)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(node_code)
        .bind(level.as_str())
        .fetch_one(&self.pool)
        .await?;
        row.into_grant()
    }

    async fn deactivate_grant(&self, id: Uuid) -> Result<AccessGrant, ApiError> {
        let row = sqlx::query_as::<_, GrantRow>(
            "UPDATE access_grants SET active = false WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("access grant {}", id)))?;
        row.into_grant()
    }
}
