use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::domains::territory::index::TerritoryIndex;
use crate::domains::territory::models::{NodeKind, TerritorialNode};

#[derive(Debug, sqlx::FromRow)]
struct NodeRow {
    code: i32,
    libelle: String,
    kind: String,
    parent_code: Option<i32>,
}

impl NodeRow {
    fn into_node(self) -> Result<TerritorialNode> {
        let kind = NodeKind::parse(&self.kind)
            .with_context(|| format!("territorial node {} has invalid kind", self.code))?;
        Ok(TerritorialNode {
            code: self.code,
            libelle: self.libelle,
            kind,
            parent_code: self.parent_code,
        })
    }
}

/// Load the full reference tree and build the in-memory index.
///
/// Called once at startup; the table is immutable afterwards.
pub async fn load_index(pool: &PgPool) -> Result<TerritoryIndex> {
    let rows = sqlx::query_as::<_, NodeRow>(
        "SELECT code, libelle, kind, parent_code FROM territorial_nodes ORDER BY code",
    )
    .fetch_all(pool)
    .await
    .context("Failed to load territorial reference data")?;

    let nodes = rows
        .into_iter()
        .map(NodeRow::into_node)
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(count = nodes.len(), "Loaded territorial reference data");
    TerritoryIndex::build(nodes)
}

/// Insert reference nodes, skipping codes that already exist.
///
/// Used by the seed CLI; regular operation never writes this table.
pub async fn insert_nodes(pool: &PgPool, nodes: &[TerritorialNode]) -> Result<u64> {
    let mut inserted = 0;
    for node in nodes {
        let result = sqlx::query(
            r#"
            INSERT INTO territorial_nodes (code, libelle, kind, parent_code)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(node.code)
        .bind(&node.libelle)
        .bind(node.kind.as_str())
        .bind(node.parent_code)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to insert territorial node {}", node.code))?;
        inserted += result.rows_affected();
    }
    Ok(inserted)
}
