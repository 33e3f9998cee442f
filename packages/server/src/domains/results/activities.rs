//! Result submission and tally boundary operations.

use chrono::Utc;
use serde::Serialize;

use crate::common::{ApiError, AuthUser};
use crate::domains::access::models::AccessLevel;
use crate::domains::access::resolver::require_access;
use crate::domains::corrections::models::ReviewStatus;
use crate::domains::results::models::{StationVote, StationVotePayload, StationVoteView};
use crate::domains::tally::{self, PartyTally};
use crate::domains::territory::NodeKind;
use crate::kernel::ServerDeps;

/// Upsert one party's vote count at one polling station.
pub async fn upsert_station_votes(
    deps: &ServerDeps,
    user: &AuthUser,
    station_code: i32,
    payload: StationVotePayload,
) -> Result<StationVoteView, ApiError> {
    let station = deps
        .territory
        .node_of_kind(station_code, NodeKind::PollingStation)?;
    if station.parent_code != Some(payload.arrondissement_code) {
        return Err(ApiError::InvalidPayload(format!(
            "polling station {} does not belong to arrondissement {}",
            station_code, payload.arrondissement_code
        )));
    }
    require_access(deps, user, station_code, AccessLevel::Edit).await?;
    payload.validate()?;

    let record = deps
        .votes
        .upsert_station_votes(StationVote {
            station_code,
            party: payload.party,
            votes: payload.votes,
            updated_at: Utc::now(),
        })
        .await?;

    Ok(StationVoteView {
        ancestry: deps.territory.ancestry(station_code)?,
        record,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct NationalResultsView {
    pub total_votes: i64,
    pub validation_status: Option<ReviewStatus>,
    /// Omitted when party details are not requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parties: Option<Vec<PartyTally>>,
}

/// National tally, grouped by party across all departments.
pub async fn national_results(
    deps: &ServerDeps,
    _user: &AuthUser,
    validation_status: Option<ReviewStatus>,
    include_party_details: bool,
) -> Result<NationalResultsView, ApiError> {
    let tally = tally::aggregate_results_national(deps, validation_status).await?;
    Ok(NationalResultsView {
        total_votes: tally.total_votes,
        validation_status,
        parties: include_party_details.then_some(tally.parties),
    })
}

/// Departmental tally; recomputes and publishes the ResultRecord rows.
pub async fn department_results(
    deps: &ServerDeps,
    user: &AuthUser,
    department_code: i32,
) -> Result<Vec<crate::domains::results::models::ResultRecord>, ApiError> {
    require_access(deps, user, department_code, AccessLevel::Read).await?;
    tally::aggregate_results_department(deps, department_code).await
}
