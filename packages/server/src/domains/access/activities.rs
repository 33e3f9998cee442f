//! Grant administration and access-check boundary operations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{ApiError, AuthUser};
use crate::domains::access::models::{has_capability, AccessGrant, AccessLevel, Capability};
use crate::domains::access::resolver;
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Serialize)]
pub struct AccessDecision {
    pub user_id: String,
    pub node_code: i32,
    pub level: AccessLevel,
    pub allowed: bool,
}

/// Evaluate whether `user_id` may act on a node. The answer is a plain
/// boolean; an empty grant set is not an error.
///
/// The subject's role is taken from the query when provided, otherwise the
/// check is purely grant-based (no capabilities assumed).
pub async fn check_access(
    deps: &ServerDeps,
    user_id: &str,
    role: Option<&str>,
    node_code: i32,
    level: AccessLevel,
) -> Result<AccessDecision, ApiError> {
    let subject = AuthUser {
        user_id: user_id.to_string(),
        role: role.unwrap_or("").to_string(),
    };
    let allowed = resolver::can_access(deps, &subject, node_code, level).await?;
    Ok(AccessDecision {
        user_id: subject.user_id,
        node_code,
        level,
        allowed,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct GrantPayload {
    pub user_id: String,
    pub node_code: i32,
    pub level: AccessLevel,
}

fn require_grant_manager(user: &AuthUser) -> Result<(), ApiError> {
    if has_capability(&user.role, Capability::ManageGrants) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "grant administration requires the manage-grants capability".to_string(),
        ))
    }
}

/// Administrative assignment: create an active grant.
pub async fn create_grant(
    deps: &ServerDeps,
    caller: &AuthUser,
    payload: GrantPayload,
) -> Result<AccessGrant, ApiError> {
    require_grant_manager(caller)?;
    if payload.user_id.trim().is_empty() {
        return Err(ApiError::InvalidPayload(
            "grant user_id must not be empty".to_string(),
        ));
    }
    // The node must exist; grants on dangling codes would silently cover
    // nothing
    deps.territory.node(payload.node_code)?;
    deps.grants
        .insert_grant(&payload.user_id, payload.node_code, payload.level)
        .await
}

/// Soft-deactivate a grant, preserving it for audit.
pub async fn deactivate_grant(
    deps: &ServerDeps,
    caller: &AuthUser,
    grant_id: Uuid,
) -> Result<AccessGrant, ApiError> {
    require_grant_manager(caller)?;
    deps.grants.deactivate_grant(grant_id).await
}

/// Grant history for a user (active and deactivated). Users may list their
/// own; grant managers may list anyone's.
pub async fn list_grants(
    deps: &ServerDeps,
    caller: &AuthUser,
    user_id: &str,
) -> Result<Vec<AccessGrant>, ApiError> {
    if caller.user_id != user_id {
        require_grant_manager(caller)?;
    }
    deps.grants.grants_for_user(user_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::territory::index::fixtures::small_tree;

    fn admin() -> AuthUser {
        AuthUser {
            user_id: "admin-1".to_string(),
            role: "administrateur".to_string(),
        }
    }

    fn operator() -> AuthUser {
        AuthUser {
            user_id: "agent-7".to_string(),
            role: "operateur-departemental".to_string(),
        }
    }

    #[tokio::test]
    async fn test_grant_lifecycle_is_soft_deactivation() {
        let deps = ServerDeps::in_memory(small_tree());
        let grant = create_grant(
            &deps,
            &admin(),
            GrantPayload {
                user_id: "agent-7".to_string(),
                node_code: 1,
                level: AccessLevel::Edit,
            },
        )
        .await
        .unwrap();

        deactivate_grant(&deps, &admin(), grant.id).await.unwrap();

        // Still visible in the audit listing, no longer active
        let all = list_grants(&deps, &admin(), "agent-7").await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(!all[0].active);
        let active = deps.grants.active_grants_for_user("agent-7").await.unwrap();
        assert!(active.is_empty());
    }

    #[tokio::test]
    async fn test_non_manager_cannot_create_grants() {
        let deps = ServerDeps::in_memory(small_tree());
        let result = create_grant(
            &deps,
            &operator(),
            GrantPayload {
                user_id: "x".to_string(),
                node_code: 1,
                level: AccessLevel::Read,
            },
        )
        .await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_grant_on_unknown_node_fails() {
        let deps = ServerDeps::in_memory(small_tree());
        let result = create_grant(
            &deps,
            &admin(),
            GrantPayload {
                user_id: "agent-7".to_string(),
                node_code: 4242,
                level: AccessLevel::Read,
            },
        )
        .await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_users_list_own_grants_only() {
        let deps = ServerDeps::in_memory(small_tree());
        assert!(list_grants(&deps, &operator(), "agent-7").await.is_ok());
        assert!(matches!(
            list_grants(&deps, &operator(), "someone-else").await,
            Err(ApiError::Forbidden(_))
        ));
    }
}
