// In-memory store implementations.
//
// Used by the test suite and by local development without Postgres. Upsert
// and ordering semantics mirror the Postgres implementations exactly:
// upserts are keyed, never duplicating rows, and vote rows keep insertion
// order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
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

use super::traits::{
    BaseBlobStore, BaseCommissionStore, BaseDocumentStore, BaseGrantStore, BaseLedgerStore,
    BaseParticipationStore, BaseVoteStore, StoredBlob,
};

// =============================================================================
// Grants
// =============================================================================

#[derive(Default)]
pub struct MemoryGrantStore {
    grants: Arc<Mutex<Vec<AccessGrant>>>,
}

impl MemoryGrantStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseGrantStore for MemoryGrantStore {
    async fn active_grants_for_user(&self, user_id: &str) -> Result<Vec<AccessGrant>, ApiError> {
        Ok(self
            .grants
            .lock()
            .unwrap()
            .iter()
            .filter(|g| g.user_id == user_id && g.active)
            .cloned()
            .collect())
    }

    async fn grants_for_user(&self, user_id: &str) -> Result<Vec<AccessGrant>, ApiError> {
        Ok(self
            .grants
            .lock()
            .unwrap()
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_grant(
        &self,
        user_id: &str,
        node_code: i32,
        level: AccessLevel,
    ) -> Result<AccessGrant, ApiError> {
        let grant = AccessGrant {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            node_code,
            level,
            active: true,
            granted_at: Utc::now(),
        };
        self.grants.lock().unwrap().push(grant.clone());
        Ok(grant)
    }

    async fn deactivate_grant(&self, id: Uuid) -> Result<AccessGrant, ApiError> {
        let mut grants = self.grants.lock().unwrap();
        let grant = grants
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("access grant {}", id)))?;
        grant.active = false;
        Ok(grant.clone())
    }
}

// =============================================================================
// Participation
// =============================================================================

#[derive(Default)]
pub struct MemoryParticipationStore {
    departments: Arc<Mutex<HashMap<i32, ParticipationRecord>>>,
    stations: Arc<Mutex<Vec<StationParticipation>>>,
}

impl MemoryParticipationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseParticipationStore for MemoryParticipationStore {
    async fn upsert_department(
        &self,
        record: ParticipationRecord,
    ) -> Result<ParticipationRecord, ApiError> {
        self.departments
            .lock()
            .unwrap()
            .insert(record.department_code, record.clone());
        Ok(record)
    }

    async fn department(&self, code: i32) -> Result<Option<ParticipationRecord>, ApiError> {
        Ok(self.departments.lock().unwrap().get(&code).cloned())
    }

    async fn upsert_station(
        &self,
        record: StationParticipation,
    ) -> Result<StationParticipation, ApiError> {
        let mut stations = self.stations.lock().unwrap();
        match stations
            .iter_mut()
            .find(|s| s.station_code == record.station_code)
        {
            Some(existing) => *existing = record.clone(),
            None => stations.push(record.clone()),
        }
        Ok(record)
    }

    async fn stations(&self, codes: &[i32]) -> Result<Vec<StationParticipation>, ApiError> {
        Ok(self
            .stations
            .lock()
            .unwrap()
            .iter()
            .filter(|s| codes.contains(&s.station_code))
            .cloned()
            .collect())
    }
}

// =============================================================================
// Votes and results
// =============================================================================

#[derive(Default)]
pub struct MemoryVoteStore {
    station_votes: Arc<Mutex<Vec<StationVote>>>,
    results: Arc<Mutex<Vec<ResultRecord>>>,
}

impl MemoryVoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseVoteStore for MemoryVoteStore {
    async fn upsert_station_votes(&self, record: StationVote) -> Result<StationVote, ApiError> {
        let mut votes = self.station_votes.lock().unwrap();
        match votes
            .iter_mut()
            .find(|v| v.station_code == record.station_code && v.party == record.party)
        {
            Some(existing) => *existing = record.clone(),
            None => votes.push(record.clone()),
        }
        Ok(record)
    }

    async fn station_votes(&self, codes: &[i32]) -> Result<Vec<StationVote>, ApiError> {
        Ok(self
            .station_votes
            .lock()
            .unwrap()
            .iter()
            .filter(|v| codes.contains(&v.station_code))
            .cloned()
            .collect())
    }

    async fn all_station_votes(&self) -> Result<Vec<StationVote>, ApiError> {
        Ok(self.station_votes.lock().unwrap().clone())
    }

    async fn upsert_result(&self, record: ResultRecord) -> Result<ResultRecord, ApiError> {
        let mut results = self.results.lock().unwrap();
        match results
            .iter_mut()
            .find(|r| r.department_code == record.department_code && r.party == record.party)
        {
            Some(existing) => *existing = record.clone(),
            None => results.push(record.clone()),
        }
        Ok(record)
    }

    async fn results_for_department(&self, code: i32) -> Result<Vec<ResultRecord>, ApiError> {
        Ok(self
            .results
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.department_code == code)
            .cloned()
            .collect())
    }
}

// =============================================================================
// Correction ledger
// =============================================================================

#[derive(Default)]
pub struct MemoryLedgerStore {
    entries: Arc<Mutex<Vec<CorrectionEntry>>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn is_later(candidate: &CorrectionEntry, current: &CorrectionEntry) -> bool {
    (candidate.created_at, candidate.seq) > (current.created_at, current.seq)
}

#[async_trait]
impl BaseLedgerStore for MemoryLedgerStore {
    async fn append(&self, correction: NewCorrection) -> Result<CorrectionEntry, ApiError> {
        let mut entries = self.entries.lock().unwrap();
        let entry = CorrectionEntry {
            id: Uuid::new_v4(),
            seq: entries.len() as i64 + 1,
            target: correction.target,
            initial: correction.initial,
            corrected: correction.corrected,
            reason: correction.reason,
            status: ReviewStatus::Submitted,
            review_reason: None,
            created_by: correction.created_by,
            created_at: Utc::now(),
        };
        entries.push(entry.clone());
        Ok(entry)
    }

    async fn get(&self, id: Uuid) -> Result<CorrectionEntry, ApiError> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("correction {}", id)))
    }

    async fn history(&self, target: &CorrectionTarget) -> Result<Vec<CorrectionEntry>, ApiError> {
        let mut out: Vec<CorrectionEntry> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| &e.target == target)
            .cloned()
            .collect();
        out.sort_by_key(|e| (e.created_at, e.seq));
        Ok(out)
    }

    async fn latest(
        &self,
        target: &CorrectionTarget,
    ) -> Result<Option<CorrectionEntry>, ApiError> {
        let entries = self.entries.lock().unwrap();
        let mut latest: Option<&CorrectionEntry> = None;
        for entry in entries.iter().filter(|e| &e.target == target) {
            if latest.map(|cur| is_later(entry, cur)).unwrap_or(true) {
                latest = Some(entry);
            }
        }
        Ok(latest.cloned())
    }

    async fn latest_by_kind(
        &self,
        kind: TargetKind,
        status: Option<ReviewStatus>,
    ) -> Result<Vec<CorrectionEntry>, ApiError> {
        let entries = self.entries.lock().unwrap();
        let mut order: Vec<CorrectionTarget> = Vec::new();
        let mut latest: HashMap<CorrectionTarget, CorrectionEntry> = HashMap::new();
        for entry in entries.iter() {
            if entry.target.kind() != kind {
                continue;
            }
            if let Some(wanted) = status {
                if entry.status != wanted {
                    continue;
                }
            }
            match latest.get(&entry.target) {
                Some(cur) if !is_later(entry, cur) => {}
                Some(_) => {
                    latest.insert(entry.target.clone(), entry.clone());
                }
                None => {
                    order.push(entry.target.clone());
                    latest.insert(entry.target.clone(), entry.clone());
                }
            }
        }
        Ok(order.into_iter().filter_map(|t| latest.remove(&t)).collect())
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ReviewStatus,
        review_reason: Option<String>,
    ) -> Result<CorrectionEntry, ApiError> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("correction {}", id)))?;
        entry.status = status;
        entry.review_reason = review_reason;
        Ok(entry.clone())
    }
}

// =============================================================================
// Commissions
// =============================================================================

#[derive(Default)]
pub struct MemoryCommissionStore {
    commissions: Arc<Mutex<Vec<Commission>>>,
    members: Arc<Mutex<Vec<CommissionMember>>>,
}

impl MemoryCommissionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseCommissionStore for MemoryCommissionStore {
    async fn upsert_commission(
        &self,
        department_code: i32,
        libelle: &str,
    ) -> Result<Commission, ApiError> {
        let mut commissions = self.commissions.lock().unwrap();
        if let Some(existing) = commissions
            .iter_mut()
            .find(|c| c.department_code == department_code)
        {
            existing.libelle = libelle.to_string();
            return Ok(existing.clone());
        }
        let commission = Commission {
            id: Uuid::new_v4(),
            department_code,
            libelle: libelle.to_string(),
            created_at: Utc::now(),
        };
        commissions.push(commission.clone());
        Ok(commission)
    }

    async fn commission_for_department(&self, code: i32) -> Result<Option<Commission>, ApiError> {
        Ok(self
            .commissions
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.department_code == code)
            .cloned())
    }

    async fn upsert_member(
        &self,
        commission_id: Uuid,
        full_name: &str,
        fonction: &str,
    ) -> Result<CommissionMember, ApiError> {
        let mut members = self.members.lock().unwrap();
        if let Some(existing) = members
            .iter_mut()
            .find(|m| m.commission_id == commission_id && m.full_name == full_name)
        {
            existing.fonction = fonction.to_string();
            return Ok(existing.clone());
        }
        let member = CommissionMember {
            id: Uuid::new_v4(),
            commission_id,
            full_name: full_name.to_string(),
            fonction: fonction.to_string(),
            added_at: Utc::now(),
        };
        members.push(member.clone());
        Ok(member)
    }

    async fn members(&self, commission_id: Uuid) -> Result<Vec<CommissionMember>, ApiError> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.commission_id == commission_id)
            .cloned()
            .collect())
    }
}

// =============================================================================
// Documents
// =============================================================================

#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: Arc<Mutex<Vec<PvDocument>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseDocumentStore for MemoryDocumentStore {
    async fn insert(&self, document: PvDocument) -> Result<PvDocument, ApiError> {
        self.documents.lock().unwrap().push(document.clone());
        Ok(document)
    }

    async fn for_station(&self, code: i32) -> Result<Vec<PvDocument>, ApiError> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.station_code == code)
            .cloned()
            .collect())
    }

    async fn count_for_stations(&self, codes: &[i32]) -> Result<i64, ApiError> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| codes.contains(&d.station_code))
            .count() as i64)
    }
}

// =============================================================================
// Blob store
// =============================================================================

/// Keeps nothing but the hash; good enough for tests and dry runs.
#[derive(Default)]
pub struct MemoryBlobStore;

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BaseBlobStore for MemoryBlobStore {
    async fn store(&self, filename: &str, bytes: &[u8]) -> Result<StoredBlob, ApiError> {
        let hash = hex::encode(Sha256::digest(bytes));
        Ok(StoredBlob {
            path: format!("memory://{}", filename),
            content_hash: hash,
        })
    }
}
