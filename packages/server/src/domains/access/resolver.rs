use crate::common::{ApiError, AuthUser};
use crate::domains::access::models::{has_capability, AccessLevel, Capability};
use crate::kernel::ServerDeps;

/// Canonical access decision, used by every gateway operation.
///
/// A user with no grants and no global role gets `Ok(false)`, never an
/// error. Unknown node codes fail with `NotFound`.
pub async fn can_access(
    deps: &ServerDeps,
    user: &AuthUser,
    node_code: i32,
    level: AccessLevel,
) -> Result<bool, ApiError> {
    // The node must exist before any decision is made
    deps.territory.node(node_code)?;

    if has_capability(&user.role, Capability::GlobalAccess) {
        return Ok(true);
    }

    let grants = deps.grants.active_grants_for_user(&user.user_id).await?;
    for grant in grants {
        if !grant.level.satisfies(level) {
            continue;
        }
        // A grant covers its own node and every descendant, never ancestors
        if grant.node_code == node_code
            || deps.territory.descendants(grant.node_code)?.contains(&node_code)
        {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Fail with `Forbidden` unless the user may act on the node at the level.
pub async fn require_access(
    deps: &ServerDeps,
    user: &AuthUser,
    node_code: i32,
    level: AccessLevel,
) -> Result<(), ApiError> {
    if can_access(deps, user, node_code, level).await? {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "{} access on territorial node {}",
            level.as_str(),
            node_code
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::territory::index::fixtures::small_tree;
    use crate::kernel::ServerDeps;

    fn user(id: &str, role: &str) -> AuthUser {
        AuthUser {
            user_id: id.to_string(),
            role: role.to_string(),
        }
    }

    async fn deps_with_grant(node_code: i32, level: AccessLevel) -> ServerDeps {
        let deps = ServerDeps::in_memory(small_tree());
        deps.grants
            .insert_grant("agent-7", node_code, level)
            .await
            .unwrap();
        deps
    }

    #[tokio::test]
    async fn test_edit_grant_implies_read() {
        let deps = deps_with_grant(1, AccessLevel::Edit).await;
        let u = user("agent-7", "operateur-departemental");
        assert!(can_access(&deps, &u, 1, AccessLevel::Read).await.unwrap());
        assert!(can_access(&deps, &u, 1, AccessLevel::Edit).await.unwrap());
    }

    #[tokio::test]
    async fn test_read_grant_never_grants_edit() {
        let deps = deps_with_grant(1, AccessLevel::Read).await;
        let u = user("agent-7", "operateur-departemental");
        assert!(can_access(&deps, &u, 1, AccessLevel::Read).await.unwrap());
        assert!(!can_access(&deps, &u, 1, AccessLevel::Edit).await.unwrap());
    }

    #[tokio::test]
    async fn test_grant_covers_descendants_not_ancestors() {
        // Edit grant at arrondissement 11, child of department 1
        let deps = deps_with_grant(11, AccessLevel::Edit).await;
        let u = user("agent-7", "operateur-departemental");

        assert!(!can_access(&deps, &u, 1, AccessLevel::Edit).await.unwrap());
        assert!(can_access(&deps, &u, 11, AccessLevel::Edit).await.unwrap());
        assert!(can_access(&deps, &u, 111, AccessLevel::Edit).await.unwrap());
        assert!(can_access(&deps, &u, 112, AccessLevel::Edit).await.unwrap());
        // Sibling arrondissement stays out of reach
        assert!(!can_access(&deps, &u, 12, AccessLevel::Read).await.unwrap());
    }

    #[tokio::test]
    async fn test_zero_grants_is_empty_access_not_an_error() {
        let deps = ServerDeps::in_memory(small_tree());
        let u = user("nobody", "operateur-departemental");
        assert!(!can_access(&deps, &u, 1, AccessLevel::Read).await.unwrap());
        assert!(!can_access(&deps, &u, 111, AccessLevel::Read).await.unwrap());
    }

    #[tokio::test]
    async fn test_global_role_short_circuits() {
        let deps = ServerDeps::in_memory(small_tree());
        for role in ["administrateur", "superviseur-regional"] {
            let u = user("chief", role);
            assert!(can_access(&deps, &u, 211, AccessLevel::Edit).await.unwrap());
            assert!(can_access(&deps, &u, 100, AccessLevel::Read).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_deactivated_grant_is_ignored() {
        let deps = ServerDeps::in_memory(small_tree());
        let grant = deps
            .grants
            .insert_grant("agent-7", 1, AccessLevel::Edit)
            .await
            .unwrap();
        deps.grants.deactivate_grant(grant.id).await.unwrap();

        let u = user("agent-7", "operateur-departemental");
        assert!(!can_access(&deps, &u, 1, AccessLevel::Read).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_node_is_not_found() {
        let deps = ServerDeps::in_memory(small_tree());
        let u = user("chief", "administrateur");
        let result = can_access(&deps, &u, 9999, AccessLevel::Read).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
