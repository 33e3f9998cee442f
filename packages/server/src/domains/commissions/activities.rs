//! Departmental commission boundary operations.

use crate::common::{ApiError, AuthUser};
use crate::domains::access::models::AccessLevel;
use crate::domains::access::resolver::require_access;
use crate::domains::commissions::models::{
    CommissionMember, CommissionMemberPayload, CommissionMemberView,
};
use crate::domains::territory::NodeKind;
use crate::kernel::ServerDeps;

/// Register a member on a department's commission, creating the commission
/// on first use. Re-adding a member replaces their function.
pub async fn upsert_member(
    deps: &ServerDeps,
    user: &AuthUser,
    department_code: i32,
    payload: CommissionMemberPayload,
) -> Result<CommissionMemberView, ApiError> {
    let department = deps
        .territory
        .node_of_kind(department_code, NodeKind::Department)?;
    require_access(deps, user, department_code, AccessLevel::Edit).await?;
    payload.validate()?;

    let libelle = payload
        .commission_libelle
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| format!("Commission départementale {}", department.libelle));
    let commission = deps
        .commissions
        .upsert_commission(department_code, &libelle)
        .await?;
    let member = deps
        .commissions
        .upsert_member(commission.id, &payload.full_name, &payload.fonction)
        .await?;

    Ok(CommissionMemberView {
        ancestry: deps.territory.ancestry(department_code)?,
        commission,
        member,
    })
}

/// Commission roster for a department. An empty list when the commission
/// does not exist yet.
pub async fn list_members(
    deps: &ServerDeps,
    user: &AuthUser,
    department_code: i32,
) -> Result<Vec<CommissionMember>, ApiError> {
    deps.territory
        .node_of_kind(department_code, NodeKind::Department)?;
    require_access(deps, user, department_code, AccessLevel::Read).await?;

    match deps
        .commissions
        .commission_for_department(department_code)
        .await?
    {
        Some(commission) => deps.commissions.members(commission.id).await,
        None => Ok(Vec::new()),
    }
}
