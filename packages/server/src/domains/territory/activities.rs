//! Hierarchy listing with per-node aggregate stats.

use serde::Serialize;

use crate::common::{ApiError, AuthUser};
use crate::domains::access::models::AccessLevel;
use crate::domains::access::resolver::require_access;
use crate::domains::territory::models::{NodeKind, TerritorialNode};
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Serialize)]
pub struct NodeStats {
    pub children: i64,
    pub documents: i64,
    pub participations: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HierarchyEntry {
    pub code: i32,
    pub libelle: String,
    pub kind: NodeKind,
    pub parent_code: Option<i32>,
    pub stats: NodeStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct HierarchyView {
    pub root: i32,
    pub entries: Vec<HierarchyEntry>,
}

/// Subtree listing from `node_code` down to `depth` (inclusive), each node
/// annotated with child, document and participation counts.
///
/// Requires read access at the root of the requested subtree; the covering
/// grant then applies to everything below it.
pub async fn hierarchy(
    deps: &ServerDeps,
    user: &AuthUser,
    node_code: i32,
    depth: Option<NodeKind>,
) -> Result<HierarchyView, ApiError> {
    let root = deps.territory.node(node_code)?;
    require_access(deps, user, node_code, AccessLevel::Read).await?;

    let max_rank = depth.map(|k| k.rank()).unwrap_or(NodeKind::PollingStation.rank());
    if max_rank < root.kind.rank() {
        return Err(ApiError::InvalidPayload(format!(
            "depth {} is above the requested node",
            depth.map(|k| k.as_str()).unwrap_or("?")
        )));
    }

    // Walk the subtree, stopping at the requested depth
    let mut entries = Vec::new();
    let mut queue: Vec<&TerritorialNode> = vec![root];
    while let Some(node) = queue.pop() {
        entries.push(annotate(deps, node).await?);
        if node.kind.rank() < max_rank {
            for child_code in deps.territory.children(node.code) {
                queue.push(deps.territory.node(*child_code)?);
            }
        }
    }
    entries.sort_by_key(|e| (e.kind.rank(), e.code));

    Ok(HierarchyView {
        root: node_code,
        entries,
    })
}

async fn annotate(deps: &ServerDeps, node: &TerritorialNode) -> Result<HierarchyEntry, ApiError> {
    let stations = deps.territory.stations_under(node.code)?;
    let documents = deps.documents.count_for_stations(&stations).await?;
    let participations = deps.participation.stations(&stations).await?.len() as i64;
    Ok(HierarchyEntry {
        code: node.code,
        libelle: node.libelle.clone(),
        kind: node.kind,
        parent_code: node.parent_code,
        stats: NodeStats {
            children: deps.territory.children(node.code).len() as i64,
            documents,
            participations,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::domains::participation::models::StationParticipation;
    use crate::domains::territory::index::fixtures::small_tree;

    fn admin() -> AuthUser {
        AuthUser {
            user_id: "admin-1".to_string(),
            role: "administrateur".to_string(),
        }
    }

    #[tokio::test]
    async fn test_subtree_listing_with_depth() {
        let deps = ServerDeps::in_memory(small_tree());

        let view = hierarchy(&deps, &admin(), 1, Some(NodeKind::Arrondissement))
            .await
            .unwrap();
        let codes: Vec<i32> = view.entries.iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![1, 11, 12]);

        let full = hierarchy(&deps, &admin(), 1, None).await.unwrap();
        assert_eq!(full.entries.len(), 6); // dept + 2 arrondissements + 3 stations
    }

    #[tokio::test]
    async fn test_stats_count_participations() {
        let deps = ServerDeps::in_memory(small_tree());
        deps.participation
            .upsert_station(StationParticipation {
                station_code: 111,
                registered: 100,
                voters: 80,
                null_ballots: 0,
                updated_at: Utc::now(),
            })
            .await
            .unwrap();

        let view = hierarchy(&deps, &admin(), 1, Some(NodeKind::Department))
            .await
            .unwrap();
        assert_eq!(view.entries.len(), 1);
        assert_eq!(view.entries[0].stats.children, 2);
        assert_eq!(view.entries[0].stats.participations, 1);
    }

    #[tokio::test]
    async fn test_listing_requires_read_access() {
        let deps = ServerDeps::in_memory(small_tree());
        let stranger = AuthUser {
            user_id: "stranger".to_string(),
            role: "operateur-departemental".to_string(),
        };
        let result = hierarchy(&deps, &stranger, 1, None).await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_depth_above_node_is_rejected() {
        let deps = ServerDeps::in_memory(small_tree());
        let result = hierarchy(&deps, &admin(), 11, Some(NodeKind::Department)).await;
        assert!(matches!(result, Err(ApiError::InvalidPayload(_))));
    }
}
