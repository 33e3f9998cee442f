//! Correction (redressement) boundary operations.
//!
//! Corrections are scoped to the department owning the target polling
//! station: submitting and reviewing require edit access at that
//! department.

use serde::Deserialize;
use uuid::Uuid;

use crate::common::{ApiError, AuthUser};
use crate::domains::access::models::AccessLevel;
use crate::domains::access::resolver::require_access;
use crate::domains::corrections::models::{
    CorrectionEntry, CorrectionTarget, CorrectionValues, CorrectionView, NewCorrection,
    ReviewStatus, TargetKind,
};
use crate::domains::territory::NodeKind;
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Deserialize)]
pub struct CorrectionPayload {
    /// Required for vote-count targets, absent for participation targets.
    pub party: Option<String>,
    pub initial: CorrectionValues,
    pub corrected: CorrectionValues,
    pub reason: String,
}

/// Build the target from the URL pieces and the payload.
fn build_target(
    kind: TargetKind,
    station_code: i32,
    party: Option<String>,
) -> Result<CorrectionTarget, ApiError> {
    match kind {
        TargetKind::Participation => Ok(CorrectionTarget::StationParticipation { station_code }),
        TargetKind::Votes => {
            let party = party.filter(|p| !p.trim().is_empty()).ok_or_else(|| {
                ApiError::InvalidPayload(
                    "a vote-count correction requires a party".to_string(),
                )
            })?;
            Ok(CorrectionTarget::StationVotes {
                station_code,
                party,
            })
        }
    }
}

/// Append a correction for a station-level target.
pub async fn submit_correction(
    deps: &ServerDeps,
    user: &AuthUser,
    kind: TargetKind,
    station_code: i32,
    payload: CorrectionPayload,
) -> Result<CorrectionView, ApiError> {
    deps.territory
        .node_of_kind(station_code, NodeKind::PollingStation)?;
    let department = deps.territory.department_of(station_code)?.code;
    require_access(deps, user, department, AccessLevel::Edit).await?;

    let correction = NewCorrection {
        target: build_target(kind, station_code, payload.party)?,
        initial: payload.initial,
        corrected: payload.corrected,
        reason: payload.reason,
        created_by: user.user_id.clone(),
    };
    correction.validate()?;

    let entry = deps.ledger.append(correction).await?;
    Ok(CorrectionView {
        ancestry: deps.territory.ancestry(station_code)?,
        entry,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Approve,
    Reject,
    Validate,
}

impl ReviewAction {
    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "approve" => Ok(ReviewAction::Approve),
            "reject" => Ok(ReviewAction::Reject),
            "validate" => Ok(ReviewAction::Validate),
            other => Err(ApiError::InvalidPayload(format!(
                "unknown review action '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPayload {
    pub reason: Option<String>,
}

/// Apply a review transition. Statuses are last-write-wins: re-reviewing a
/// terminal entry simply overwrites it. Rejection requires a reason.
pub async fn review_correction(
    deps: &ServerDeps,
    user: &AuthUser,
    correction_id: Uuid,
    action: ReviewAction,
    payload: ReviewPayload,
) -> Result<CorrectionEntry, ApiError> {
    let entry = deps.ledger.get(correction_id).await?;
    let department = deps
        .territory
        .department_of(entry.target.station_code())?
        .code;
    require_access(deps, user, department, AccessLevel::Edit).await?;

    let (status, review_reason) = match action {
        ReviewAction::Approve => (ReviewStatus::Approved, payload.reason),
        ReviewAction::Validate => (ReviewStatus::Validated, payload.reason),
        ReviewAction::Reject => {
            let reason = payload
                .reason
                .filter(|r| !r.trim().is_empty())
                .ok_or_else(|| {
                    ApiError::InvalidPayload("a rejection requires a reason".to_string())
                })?;
            (ReviewStatus::Rejected, Some(reason))
        }
    };

    deps.ledger
        .set_status(correction_id, status, review_reason)
        .await
}

/// Full correction history for a target, oldest first.
pub async fn correction_history(
    deps: &ServerDeps,
    user: &AuthUser,
    kind: TargetKind,
    station_code: i32,
    party: Option<String>,
) -> Result<Vec<CorrectionEntry>, ApiError> {
    deps.territory
        .node_of_kind(station_code, NodeKind::PollingStation)?;
    let department = deps.territory.department_of(station_code)?.code;
    require_access(deps, user, department, AccessLevel::Read).await?;

    let target = build_target(kind, station_code, party)?;
    deps.ledger.history(&target).await
}
