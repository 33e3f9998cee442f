//! Participation submission boundary operations.
//!
//! Every operation follows the gateway shape: access check, payload
//! validation and cross-reference integrity, write, enriched response.

use chrono::Utc;

use crate::common::{ApiError, AuthUser};
use crate::domains::access::models::AccessLevel;
use crate::domains::access::resolver::require_access;
use crate::domains::participation::models::{
    DepartmentParticipationPayload, ParticipationRecord, ParticipationView, StationParticipation,
    StationParticipationPayload,
};
use crate::domains::tally;
use crate::domains::territory::NodeKind;
use crate::kernel::ServerDeps;

/// Upsert the official departmental record. One row per department, always.
pub async fn upsert_department_participation(
    deps: &ServerDeps,
    user: &AuthUser,
    department_code: i32,
    payload: DepartmentParticipationPayload,
) -> Result<ParticipationView<ParticipationRecord>, ApiError> {
    deps.territory
        .node_of_kind(department_code, NodeKind::Department)?;
    require_access(deps, user, department_code, AccessLevel::Edit).await?;
    payload.validate()?;

    let record = deps
        .participation
        .upsert_department(ParticipationRecord {
            department_code,
            registered: payload.registered,
            voters: payload.voters,
            null_ballots: payload.null_ballots,
            envelopes: payload.envelopes,
            emargements: payload.emargements,
            updated_at: Utc::now(),
        })
        .await?;

    Ok(ParticipationView {
        ancestry: deps.territory.ancestry(department_code)?,
        record,
    })
}

/// Upsert one polling station's snapshot. The claimed arrondissement must
/// match the station's actual parent.
pub async fn upsert_station_participation(
    deps: &ServerDeps,
    user: &AuthUser,
    station_code: i32,
    payload: StationParticipationPayload,
) -> Result<ParticipationView<StationParticipation>, ApiError> {
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
        .participation
        .upsert_station(StationParticipation {
            station_code,
            registered: payload.registered,
            voters: payload.voters,
            null_ballots: payload.null_ballots,
            updated_at: Utc::now(),
        })
        .await?;

    Ok(ParticipationView {
        ancestry: deps.territory.ancestry(station_code)?,
        record,
    })
}

/// Department-level roll-up of effective station participation.
pub async fn department_aggregate(
    deps: &ServerDeps,
    user: &AuthUser,
    department_code: i32,
) -> Result<tally::ParticipationAggregate, ApiError> {
    require_access(deps, user, department_code, AccessLevel::Read).await?;
    tally::aggregate_participation(deps, department_code).await
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

    fn station_payload(arrondissement: i32) -> StationParticipationPayload {
        StationParticipationPayload {
            arrondissement_code: arrondissement,
            registered: 100,
            voters: 80,
            null_ballots: 2,
        }
    }

    #[tokio::test]
    async fn test_department_upsert_never_duplicates() {
        let deps = ServerDeps::in_memory(small_tree());
        let payload = DepartmentParticipationPayload {
            registered: 150,
            voters: 120,
            null_ballots: 4,
            envelopes: 120,
            emargements: 119,
        };
        upsert_department_participation(&deps, &admin(), 1, payload.clone())
            .await
            .unwrap();

        // Second submission merges into the existing row
        let mut second = payload;
        second.voters = 121;
        let view = upsert_department_participation(&deps, &admin(), 1, second)
            .await
            .unwrap();
        assert_eq!(view.record.voters, 121);

        let stored = deps.participation.department(1).await.unwrap().unwrap();
        assert_eq!(stored.voters, 121);
    }

    #[tokio::test]
    async fn test_station_upsert_checks_claimed_arrondissement() {
        let deps = ServerDeps::in_memory(small_tree());
        // Station 111 belongs to arrondissement 11, not 12
        let result =
            upsert_station_participation(&deps, &admin(), 111, station_payload(12)).await;
        assert!(matches!(result, Err(ApiError::InvalidPayload(_))));

        let ok = upsert_station_participation(&deps, &admin(), 111, station_payload(11))
            .await
            .unwrap();
        assert_eq!(ok.record.station_code, 111);
        // Enriched with ancestry up to the region
        let kinds: Vec<NodeKind> = ok.ancestry.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::PollingStation,
                NodeKind::Arrondissement,
                NodeKind::Department,
                NodeKind::Region
            ]
        );
    }

    #[tokio::test]
    async fn test_edit_access_is_checked_before_write() {
        let deps = ServerDeps::in_memory(small_tree());
        deps.grants
            .insert_grant("agent-7", 1, AccessLevel::Read)
            .await
            .unwrap();

        let result =
            upsert_station_participation(&deps, &operator(), 111, station_payload(11)).await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
        // Fail fast: nothing was written
        assert!(deps.participation.stations(&[111]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_department_code_must_be_a_department() {
        let deps = ServerDeps::in_memory(small_tree());
        let payload = DepartmentParticipationPayload {
            registered: 10,
            voters: 5,
            null_ballots: 0,
            envelopes: 5,
            emargements: 5,
        };
        // 11 is an arrondissement
        let result = upsert_department_participation(&deps, &admin(), 11, payload).await;
        assert!(matches!(result, Err(ApiError::InvalidPayload(_))));
    }
}
