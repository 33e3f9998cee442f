use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::ApiError;
use crate::domains::territory::AncestryLabel;

/// Kind of entity a correction targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Participation,
    Votes,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Participation => "participation",
            TargetKind::Votes => "votes",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "participation" => Ok(TargetKind::Participation),
            "votes" => Ok(TargetKind::Votes),
            other => Err(ApiError::InvalidPayload(format!(
                "unknown correction target kind '{}'",
                other
            ))),
        }
    }
}

/// Exactly one target entity per correction: a station participation
/// snapshot, or one (station, party) vote count.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CorrectionTarget {
    StationParticipation { station_code: i32 },
    StationVotes { station_code: i32, party: String },
}

impl CorrectionTarget {
    pub fn kind(&self) -> TargetKind {
        match self {
            CorrectionTarget::StationParticipation { .. } => TargetKind::Participation,
            CorrectionTarget::StationVotes { .. } => TargetKind::Votes,
        }
    }

    pub fn station_code(&self) -> i32 {
        match self {
            CorrectionTarget::StationParticipation { station_code } => *station_code,
            CorrectionTarget::StationVotes { station_code, .. } => *station_code,
        }
    }

    pub fn party(&self) -> Option<&str> {
        match self {
            CorrectionTarget::StationParticipation { .. } => None,
            CorrectionTarget::StationVotes { party, .. } => Some(party),
        }
    }
}

/// Value set attached to a correction; the shape must match the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CorrectionValues {
    Participation {
        registered: i64,
        voters: i64,
        null_ballots: i64,
    },
    Votes {
        votes: i64,
    },
}

impl CorrectionValues {
    pub fn matches(&self, target: &CorrectionTarget) -> bool {
        matches!(
            (self, target),
            (
                CorrectionValues::Participation { .. },
                CorrectionTarget::StationParticipation { .. }
            ) | (
                CorrectionValues::Votes { .. },
                CorrectionTarget::StationVotes { .. }
            )
        )
    }

    pub fn is_non_negative(&self) -> bool {
        match self {
            CorrectionValues::Participation {
                registered,
                voters,
                null_ballots,
            } => *registered >= 0 && *voters >= 0 && *null_ballots >= 0,
            CorrectionValues::Votes { votes } => *votes >= 0,
        }
    }

    /// Same internal bounds the submission payloads enforce; a single vote
    /// count has none.
    pub fn is_consistent(&self) -> bool {
        match self {
            CorrectionValues::Participation {
                registered,
                voters,
                null_ballots,
            } => voters <= registered && null_ballots <= voters,
            CorrectionValues::Votes { .. } => true,
        }
    }
}

/// Review status of a correction. `submitted` on creation; terminal
/// statuses may be overwritten (last write wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Submitted,
    Approved,
    Rejected,
    Validated,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Submitted => "submitted",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
            ReviewStatus::Validated => "validated",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "submitted" => Ok(ReviewStatus::Submitted),
            "approved" => Ok(ReviewStatus::Approved),
            "rejected" => Ok(ReviewStatus::Rejected),
            "validated" => Ok(ReviewStatus::Validated),
            other => Err(ApiError::InvalidPayload(format!(
                "unknown review status '{}'",
                other
            ))),
        }
    }
}

/// A redressement: immutable once recorded. A later entry for the same
/// target supersedes this one as "latest" without deleting it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionEntry {
    pub id: Uuid,
    /// Insertion order, assigned by the store; breaks created_at ties.
    pub seq: i64,
    pub target: CorrectionTarget,
    pub initial: CorrectionValues,
    pub corrected: CorrectionValues,
    pub reason: String,
    pub status: ReviewStatus,
    pub review_reason: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Append request; id, seq, created_at are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewCorrection {
    pub target: CorrectionTarget,
    pub initial: CorrectionValues,
    pub corrected: CorrectionValues,
    pub reason: String,
    pub created_by: String,
}

impl NewCorrection {
    /// Shape and range checks; both value sets must match the target kind
    /// and corrected counts must be non-negative and internally consistent
    /// (aggregation subtracts null ballots from voters). Corrections may
    /// raise or lower counts, so no bound against `initial`.
    pub fn validate(&self) -> Result<(), ApiError> {
        if !self.initial.matches(&self.target) {
            return Err(ApiError::InvalidCorrection(
                "initial value set does not match the target kind".to_string(),
            ));
        }
        if !self.corrected.matches(&self.target) {
            return Err(ApiError::InvalidCorrection(
                "corrected value set does not match the target kind".to_string(),
            ));
        }
        if !self.corrected.is_non_negative() {
            return Err(ApiError::InvalidCorrection(
                "corrected counts must be non-negative integers".to_string(),
            ));
        }
        if !self.corrected.is_consistent() {
            return Err(ApiError::InvalidCorrection(
                "corrected counts must satisfy null_ballots <= voters <= registered".to_string(),
            ));
        }
        if self.reason.trim().is_empty() {
            return Err(ApiError::InvalidPayload(
                "a correction requires a reason".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CorrectionView {
    #[serde(flatten)]
    pub entry: CorrectionEntry,
    pub ancestry: Vec<AncestryLabel>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participation_target() -> CorrectionTarget {
        CorrectionTarget::StationParticipation { station_code: 111 }
    }

    fn new_correction(corrected: CorrectionValues) -> NewCorrection {
        NewCorrection {
            target: participation_target(),
            initial: CorrectionValues::Participation {
                registered: 100,
                voters: 80,
                null_ballots: 2,
            },
            corrected,
            reason: "recount".to_string(),
            created_by: "agent-7".to_string(),
        }
    }

    #[test]
    fn test_shape_mismatch_is_invalid() {
        let bad = new_correction(CorrectionValues::Votes { votes: 10 });
        assert!(matches!(
            bad.validate(),
            Err(ApiError::InvalidCorrection(_))
        ));
    }

    #[test]
    fn test_negative_corrected_counts_rejected() {
        let bad = new_correction(CorrectionValues::Participation {
            registered: 100,
            voters: -1,
            null_ballots: 0,
        });
        assert!(matches!(
            bad.validate(),
            Err(ApiError::InvalidCorrection(_))
        ));
    }

    #[test]
    fn test_inconsistent_corrected_counts_rejected() {
        // Would drive expressed (voters - null_ballots) negative in the
        // aggregation engine
        let bad = new_correction(CorrectionValues::Participation {
            registered: 100,
            voters: 80,
            null_ballots: 90,
        });
        assert!(matches!(
            bad.validate(),
            Err(ApiError::InvalidCorrection(_))
        ));

        let also_bad = new_correction(CorrectionValues::Participation {
            registered: 100,
            voters: 120,
            null_ballots: 0,
        });
        assert!(matches!(
            also_bad.validate(),
            Err(ApiError::InvalidCorrection(_))
        ));
    }

    #[test]
    fn test_corrections_may_raise_counts() {
        // No invariant forces corrected <= initial
        let raise = new_correction(CorrectionValues::Participation {
            registered: 100,
            voters: 95,
            null_ballots: 0,
        });
        assert!(raise.validate().is_ok());
    }

    #[test]
    fn test_missing_reason_is_invalid_payload() {
        let mut c = new_correction(CorrectionValues::Participation {
            registered: 100,
            voters: 85,
            null_ballots: 2,
        });
        c.reason = "  ".to_string();
        assert!(matches!(c.validate(), Err(ApiError::InvalidPayload(_))));
    }
}
