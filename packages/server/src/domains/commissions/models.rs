use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::ApiError;
use crate::domains::territory::AncestryLabel;

/// Departmental oversight body; exactly one per department.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commission {
    pub id: Uuid,
    pub department_code: i32,
    pub libelle: String,
    pub created_at: DateTime<Utc>,
}

/// Member of a commission; one function within exactly one commission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionMember {
    pub id: Uuid,
    pub commission_id: Uuid,
    pub full_name: String,
    pub fonction: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommissionMemberPayload {
    /// Commission label, used when the departmental commission does not
    /// exist yet.
    pub commission_libelle: Option<String>,
    pub full_name: String,
    pub fonction: String,
}

impl CommissionMemberPayload {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.full_name.trim().is_empty() {
            return Err(ApiError::InvalidPayload(
                "member full_name must not be empty".to_string(),
            ));
        }
        if self.fonction.trim().is_empty() {
            return Err(ApiError::InvalidPayload(
                "member fonction must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommissionMemberView {
    pub commission: Commission,
    pub member: CommissionMember,
    pub ancestry: Vec<AncestryLabel>,
}
