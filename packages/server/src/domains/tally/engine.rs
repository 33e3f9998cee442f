//! Aggregation engine.
//!
//! Computes effective (post-correction) values and rolls them up across the
//! territorial hierarchy. Every aggregation re-derives from the stored
//! records; nothing is cached or accumulated across calls, so a read
//! concurrent with a correction simply reflects the state it finds.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::common::ApiError;
use crate::domains::corrections::models::{
    CorrectionEntry, CorrectionValues, ReviewStatus, TargetKind,
};
use crate::domains::participation::models::StationParticipation;
use crate::domains::results::models::{ResultRecord, StationVote};
use crate::domains::territory::NodeKind;
use crate::kernel::ServerDeps;

/// part / total as a percentage, rounded half-up to 2 decimal places.
/// 0 when the total is 0.
fn percentage(part: i64, total: i64) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(part) * Decimal::from(100) / Decimal::from(total))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Effective counts for a station participation record: the latest
/// correction's corrected values if one exists, else the submitted values.
fn effective_participation(
    record: &StationParticipation,
    correction: Option<&CorrectionEntry>,
) -> (i64, i64, i64) {
    match correction.map(|c| &c.corrected) {
        Some(CorrectionValues::Participation {
            registered,
            voters,
            null_ballots,
        }) => (*registered, *voters, *null_ballots),
        _ => (record.registered, record.voters, record.null_ballots),
    }
}

fn effective_votes(record: &StationVote, correction: Option<&CorrectionEntry>) -> i64 {
    match correction.map(|c| &c.corrected) {
        Some(CorrectionValues::Votes { votes }) => *votes,
        _ => record.votes,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipationAggregate {
    pub department_code: i32,
    pub station_count: i64,
    pub registered: i64,
    pub voters: i64,
    pub null_ballots: i64,
    /// Suffrages exprimes: voters minus null ballots.
    pub expressed: i64,
    /// Taux de participation; none (not an error) when registered = 0.
    pub participation_rate: Option<Decimal>,
}

/// Sum effective station participation under a department.
pub async fn aggregate_participation(
    deps: &ServerDeps,
    department_code: i32,
) -> Result<ParticipationAggregate, ApiError> {
    deps.territory
        .node_of_kind(department_code, NodeKind::Department)?;
    let station_codes = deps.territory.stations_under(department_code)?;
    let records = deps.participation.stations(&station_codes).await?;

    let station_set: HashSet<i32> = station_codes.iter().copied().collect();
    let corrections: HashMap<i32, CorrectionEntry> = deps
        .ledger
        .latest_by_kind(TargetKind::Participation, None)
        .await?
        .into_iter()
        .filter(|c| station_set.contains(&c.target.station_code()))
        .map(|c| (c.target.station_code(), c))
        .collect();

    let mut registered = 0i64;
    let mut voters = 0i64;
    let mut null_ballots = 0i64;
    for record in &records {
        let (r, v, n) =
            effective_participation(record, corrections.get(&record.station_code));
        registered += r;
        voters += v;
        null_ballots += n;
    }

    let participation_rate = if registered == 0 {
        None
    } else {
        Some(percentage(voters, registered))
    };

    Ok(ParticipationAggregate {
        department_code,
        station_count: records.len() as i64,
        registered,
        voters,
        null_ballots,
        expressed: voters - null_ballots,
        participation_rate,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartyTally {
    pub party: String,
    pub votes: i64,
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NationalTally {
    pub total_votes: i64,
    pub parties: Vec<PartyTally>,
}

/// Group effective vote counts by party, keeping first-submission order for
/// equal counts. `votes` must arrive in insertion order (store contract).
fn tally_parties(
    votes: &[StationVote],
    corrections: &HashMap<(i32, String), CorrectionEntry>,
) -> Vec<PartyTally> {
    let mut order: Vec<String> = Vec::new();
    let mut by_party: HashMap<String, i64> = HashMap::new();
    for vote in votes {
        let key = (vote.station_code, vote.party.clone());
        let effective = effective_votes(vote, corrections.get(&key));
        match by_party.get_mut(&vote.party) {
            Some(total) => *total += effective,
            None => {
                order.push(vote.party.clone());
                by_party.insert(vote.party.clone(), effective);
            }
        }
    }

    let total: i64 = by_party.values().sum();
    let mut parties: Vec<PartyTally> = order
        .into_iter()
        .map(|party| {
            let votes = by_party[&party];
            PartyTally {
                percentage: percentage(votes, total),
                party,
                votes,
            }
        })
        .collect();
    // Stable sort: equal counts keep their insertion order
    parties.sort_by(|a, b| b.votes.cmp(&a.votes));
    parties
}

/// National tally across all departments.
///
/// With a status filter, only corrections carrying that review status are
/// applied; without one, the latest correction applies regardless.
pub async fn aggregate_results_national(
    deps: &ServerDeps,
    status_filter: Option<ReviewStatus>,
) -> Result<NationalTally, ApiError> {
    let votes = deps.votes.all_station_votes().await?;
    let corrections: HashMap<(i32, String), CorrectionEntry> = deps
        .ledger
        .latest_by_kind(TargetKind::Votes, status_filter)
        .await?
        .into_iter()
        .filter_map(|c| {
            let party = c.target.party()?.to_string();
            Some(((c.target.station_code(), party), c))
        })
        .collect();

    let parties = tally_parties(&votes, &corrections);
    let total_votes = parties.iter().map(|p| p.votes).sum();
    Ok(NationalTally {
        total_votes,
        parties,
    })
}

/// Departmental tally; publishes the rows as `ResultRecord`s (upsert by
/// department and party) and returns them.
pub async fn aggregate_results_department(
    deps: &ServerDeps,
    department_code: i32,
) -> Result<Vec<ResultRecord>, ApiError> {
    deps.territory
        .node_of_kind(department_code, NodeKind::Department)?;
    let station_codes = deps.territory.stations_under(department_code)?;
    let votes = deps.votes.station_votes(&station_codes).await?;

    let station_set: HashSet<i32> = station_codes.iter().copied().collect();
    let corrections: HashMap<(i32, String), CorrectionEntry> = deps
        .ledger
        .latest_by_kind(TargetKind::Votes, None)
        .await?
        .into_iter()
        .filter(|c| station_set.contains(&c.target.station_code()))
        .filter_map(|c| {
            let party = c.target.party()?.to_string();
            Some(((c.target.station_code(), party), c))
        })
        .collect();

    let mut records = Vec::new();
    for tally in tally_parties(&votes, &corrections) {
        let record = deps
            .votes
            .upsert_result(ResultRecord {
                department_code,
                party: tally.party,
                votes: tally.votes,
                percentage: tally.percentage,
                updated_at: Utc::now(),
            })
            .await?;
        records.push(record);
    }
    Ok(records)
}
