use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::ApiError;
use crate::domains::territory::AncestryLabel;

/// Vote count submitted for one party at one polling station.
///
/// Unique by (station, party); the correction target for vote counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationVote {
    pub station_code: i32,
    pub party: String,
    pub votes: i64,
    pub updated_at: DateTime<Utc>,
}

/// Published departmental tally for one party, unique by (department, party).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub department_code: i32,
    pub party: String,
    pub votes: i64,
    pub percentage: Decimal,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationVotePayload {
    /// Claimed parent; must match the station's actual arrondissement.
    pub arrondissement_code: i32,
    pub party: String,
    pub votes: i64,
}

impl StationVotePayload {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.party.trim().is_empty() {
            return Err(ApiError::InvalidPayload(
                "party must not be empty".to_string(),
            ));
        }
        if self.votes < 0 {
            return Err(ApiError::InvalidPayload(
                "votes must be a non-negative integer".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StationVoteView {
    #[serde(flatten)]
    pub record: StationVote,
    pub ancestry: Vec<AncestryLabel>,
}
