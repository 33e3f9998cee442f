// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic. Access
// decisions, validation and aggregation are domain functions that use
// these traits.
//
// Naming convention: Base* for trait names (e.g. BaseGrantStore)

use async_trait::async_trait;
use uuid::Uuid;

use crate::common::ApiError;
use crate::domains::access::models::{AccessGrant, AccessLevel};
use crate::domains::commissions::models::{Commission, CommissionMember};
use crate::domains::corrections::models::{
    CorrectionEntry, CorrectionTarget, NewCorrection, ReviewStatus, TargetKind,
};
use crate::domains::documents::models::PvDocument;
use crate::domains::participation::models::{ParticipationRecord, StationParticipation};
use crate::domains::results::models::{ResultRecord, StationVote};

// =============================================================================
// Access grants
// =============================================================================

#[async_trait]
pub trait BaseGrantStore: Send + Sync {
    /// Active grants only; the resolver never sees deactivated ones.
    async fn active_grants_for_user(&self, user_id: &str) -> Result<Vec<AccessGrant>, ApiError>;

    /// Full grant history, deactivated included (audit).
    async fn grants_for_user(&self, user_id: &str) -> Result<Vec<AccessGrant>, ApiError>;

    async fn insert_grant(
        &self,
        user_id: &str,
        node_code: i32,
        level: AccessLevel,
    ) -> Result<AccessGrant, ApiError>;

    /// Soft-deactivate; the row is never deleted.
    async fn deactivate_grant(&self, id: Uuid) -> Result<AccessGrant, ApiError>;
}

// =============================================================================
// Participation records
// =============================================================================

#[async_trait]
pub trait BaseParticipationStore: Send + Sync {
    /// Upsert keyed by department code; never creates a duplicate row.
    async fn upsert_department(
        &self,
        record: ParticipationRecord,
    ) -> Result<ParticipationRecord, ApiError>;

    async fn department(&self, code: i32) -> Result<Option<ParticipationRecord>, ApiError>;

    /// Upsert keyed by station code.
    async fn upsert_station(
        &self,
        record: StationParticipation,
    ) -> Result<StationParticipation, ApiError>;

    async fn stations(&self, codes: &[i32]) -> Result<Vec<StationParticipation>, ApiError>;
}

// =============================================================================
// Vote counts and published results
// =============================================================================

#[async_trait]
pub trait BaseVoteStore: Send + Sync {
    /// Upsert keyed by (station, party).
    async fn upsert_station_votes(&self, record: StationVote) -> Result<StationVote, ApiError>;

    /// Rows for the given stations, in insertion order (stable tie order
    /// for equal vote counts depends on this).
    async fn station_votes(&self, codes: &[i32]) -> Result<Vec<StationVote>, ApiError>;

    /// Every station vote row, in insertion order.
    async fn all_station_votes(&self) -> Result<Vec<StationVote>, ApiError>;

    /// Upsert keyed by (department, party).
    async fn upsert_result(&self, record: ResultRecord) -> Result<ResultRecord, ApiError>;

    async fn results_for_department(&self, code: i32) -> Result<Vec<ResultRecord>, ApiError>;
}

// =============================================================================
// Correction ledger
// =============================================================================

#[async_trait]
pub trait BaseLedgerStore: Send + Sync {
    /// Append-only; assigns id, seq and created_at. Never mutates an
    /// existing entry.
    async fn append(&self, correction: NewCorrection) -> Result<CorrectionEntry, ApiError>;

    async fn get(&self, id: Uuid) -> Result<CorrectionEntry, ApiError>;

    /// All entries for the target, oldest first.
    async fn history(&self, target: &CorrectionTarget) -> Result<Vec<CorrectionEntry>, ApiError>;

    /// Entry with the maximum created_at for the target; ties broken by
    /// insertion order (highest seq wins).
    async fn latest(&self, target: &CorrectionTarget)
        -> Result<Option<CorrectionEntry>, ApiError>;

    /// Latest entry per target across all targets of a kind. With a status
    /// filter, only entries carrying that review status are candidates.
    async fn latest_by_kind(
        &self,
        kind: TargetKind,
        status: Option<ReviewStatus>,
    ) -> Result<Vec<CorrectionEntry>, ApiError>;

    /// Overwrite the review status (last write wins; re-reviewing a
    /// terminal entry is allowed).
    async fn set_status(
        &self,
        id: Uuid,
        status: ReviewStatus,
        review_reason: Option<String>,
    ) -> Result<CorrectionEntry, ApiError>;
}

// =============================================================================
// Commissions
// =============================================================================

#[async_trait]
pub trait BaseCommissionStore: Send + Sync {
    /// Upsert keyed by department code (one commission per department).
    async fn upsert_commission(
        &self,
        department_code: i32,
        libelle: &str,
    ) -> Result<Commission, ApiError>;

    async fn commission_for_department(&self, code: i32) -> Result<Option<Commission>, ApiError>;

    /// Upsert keyed by (commission, full_name); a member holds exactly one
    /// function, so re-adding replaces the function.
    async fn upsert_member(
        &self,
        commission_id: Uuid,
        full_name: &str,
        fonction: &str,
    ) -> Result<CommissionMember, ApiError>;

    async fn members(&self, commission_id: Uuid) -> Result<Vec<CommissionMember>, ApiError>;
}

// =============================================================================
// PV documents
// =============================================================================

#[async_trait]
pub trait BaseDocumentStore: Send + Sync {
    async fn insert(&self, document: PvDocument) -> Result<PvDocument, ApiError>;

    async fn for_station(&self, code: i32) -> Result<Vec<PvDocument>, ApiError>;

    async fn count_for_stations(&self, codes: &[i32]) -> Result<i64, ApiError>;
}

// =============================================================================
// Blob store (opaque file storage)
// =============================================================================

#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub path: String,
    pub content_hash: String,
}

#[async_trait]
pub trait BaseBlobStore: Send + Sync {
    /// Persist the bytes and return where they live plus a content hash.
    async fn store(&self, filename: &str, bytes: &[u8]) -> Result<StoredBlob, ApiError>;
}
