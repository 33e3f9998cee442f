use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::ApiError;

/// Access level carried by a grant. Edit strictly implies read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Read,
    Edit,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Read => "read",
            AccessLevel::Edit => "edit",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "read" => Ok(AccessLevel::Read),
            "edit" => Ok(AccessLevel::Edit),
            other => Err(ApiError::InvalidPayload(format!(
                "unknown access level '{}'",
                other
            ))),
        }
    }

    /// Whether a grant at this level satisfies the requested level.
    pub fn satisfies(&self, requested: AccessLevel) -> bool {
        match (self, requested) {
            (AccessLevel::Edit, _) => true,
            (AccessLevel::Read, AccessLevel::Read) => true,
            (AccessLevel::Read, AccessLevel::Edit) => false,
        }
    }
}

/// Territorial assignment: user → node at a level.
///
/// A grant covers the node and all its descendants, never ancestors.
/// Grants are soft-deactivated to preserve the audit history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessGrant {
    pub id: Uuid,
    pub user_id: String,
    pub node_code: i32,
    pub level: AccessLevel,
    pub active: bool,
    pub granted_at: DateTime<Utc>,
}

/// Capabilities attached to a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Access to every territorial node at any level, without grants.
    GlobalAccess,
    /// Create and deactivate access grants.
    ManageGrants,
}

/// The role capability table.
///
/// The only place in the codebase where role strings are interpreted;
/// everything else asks for capabilities.
pub fn role_capabilities(role: &str) -> &'static [Capability] {
    match role {
        "administrateur" => &[Capability::GlobalAccess, Capability::ManageGrants],
        "superviseur-regional" => &[Capability::GlobalAccess],
        _ => &[],
    }
}

pub fn has_capability(role: &str, capability: Capability) -> bool {
    role_capabilities(role).contains(&capability)
}
