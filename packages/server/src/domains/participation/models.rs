use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::ApiError;
use crate::domains::territory::AncestryLabel;

/// Departmental participation record, unique per department (upsert).
///
/// Holds the official departmental counts, including the envelope and
/// emargement consistency sub-counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipationRecord {
    pub department_code: i32,
    pub registered: i64,
    pub voters: i64,
    pub null_ballots: i64,
    pub envelopes: i64,
    pub emargements: i64,
    pub updated_at: DateTime<Utc>,
}

/// Polling-station participation snapshot, unique per station (upsert).
///
/// The unit the aggregation engine sums and corrections target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationParticipation {
    pub station_code: i32,
    pub registered: i64,
    pub voters: i64,
    pub null_ballots: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepartmentParticipationPayload {
    pub registered: i64,
    pub voters: i64,
    pub null_ballots: i64,
    pub envelopes: i64,
    pub emargements: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationParticipationPayload {
    /// Claimed parent; must match the station's actual arrondissement.
    pub arrondissement_code: i32,
    pub registered: i64,
    pub voters: i64,
    pub null_ballots: i64,
}

/// Gateway response: the record joined with its territorial ancestry.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipationView<T> {
    #[serde(flatten)]
    pub record: T,
    pub ancestry: Vec<AncestryLabel>,
}

fn check_non_negative(name: &str, value: i64) -> Result<(), ApiError> {
    if value < 0 {
        return Err(ApiError::InvalidPayload(format!(
            "{} must be a non-negative integer",
            name
        )));
    }
    Ok(())
}

impl DepartmentParticipationPayload {
    /// Simple consistency bounds; anything beyond is out of scope.
    pub fn validate(&self) -> Result<(), ApiError> {
        check_non_negative("registered", self.registered)?;
        check_non_negative("voters", self.voters)?;
        check_non_negative("null_ballots", self.null_ballots)?;
        check_non_negative("envelopes", self.envelopes)?;
        check_non_negative("emargements", self.emargements)?;
        if self.voters > self.registered {
            return Err(ApiError::InvalidPayload(
                "voters cannot exceed registered voters".to_string(),
            ));
        }
        if self.null_ballots > self.voters {
            return Err(ApiError::InvalidPayload(
                "null ballots cannot exceed voters".to_string(),
            ));
        }
        if self.emargements > self.registered {
            return Err(ApiError::InvalidPayload(
                "emargements cannot exceed registered voters".to_string(),
            ));
        }
        Ok(())
    }
}

impl StationParticipationPayload {
    pub fn validate(&self) -> Result<(), ApiError> {
        check_non_negative("registered", self.registered)?;
        check_non_negative("voters", self.voters)?;
        check_non_negative("null_ballots", self.null_ballots)?;
        if self.voters > self.registered {
            return Err(ApiError::InvalidPayload(
                "voters cannot exceed registered voters".to_string(),
            ));
        }
        if self.null_ballots > self.voters {
            return Err(ApiError::InvalidPayload(
                "null ballots cannot exceed voters".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(registered: i64, voters: i64, nulls: i64) -> StationParticipationPayload {
        StationParticipationPayload {
            arrondissement_code: 11,
            registered,
            voters,
            null_ballots: nulls,
        }
    }

    #[test]
    fn test_valid_station_payload() {
        assert!(payload(100, 80, 3).validate().is_ok());
        assert!(payload(0, 0, 0).validate().is_ok());
    }

    #[test]
    fn test_negative_counts_rejected() {
        assert!(payload(-1, 0, 0).validate().is_err());
        assert!(payload(100, -5, 0).validate().is_err());
    }

    #[test]
    fn test_consistency_bounds() {
        assert!(payload(100, 101, 0).validate().is_err());
        assert!(payload(100, 50, 51).validate().is_err());
    }
}
