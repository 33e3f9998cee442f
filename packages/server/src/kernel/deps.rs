use std::sync::Arc;

use sqlx::PgPool;

use crate::domains::territory::TerritoryIndex;

use super::blob::FsBlobStore;
use super::memory::{
    MemoryBlobStore, MemoryCommissionStore, MemoryDocumentStore, MemoryGrantStore,
    MemoryLedgerStore, MemoryParticipationStore, MemoryVoteStore,
};
use super::traits::{
    BaseBlobStore, BaseCommissionStore, BaseDocumentStore, BaseGrantStore, BaseLedgerStore,
    BaseParticipationStore, BaseVoteStore,
};

/// Shared dependencies injected into every gateway operation.
///
/// The territory index is the only long-lived state; everything else is a
/// handle to the persistent store.
#[derive(Clone)]
pub struct ServerDeps {
    pub territory: Arc<TerritoryIndex>,
    pub grants: Arc<dyn BaseGrantStore>,
    pub participation: Arc<dyn BaseParticipationStore>,
    pub votes: Arc<dyn BaseVoteStore>,
    pub ledger: Arc<dyn BaseLedgerStore>,
    pub commissions: Arc<dyn BaseCommissionStore>,
    pub documents: Arc<dyn BaseDocumentStore>,
    pub blobs: Arc<dyn BaseBlobStore>,
}

impl ServerDeps {
    /// Production wiring: every store backed by Postgres, documents on the
    /// local filesystem.
    pub fn postgres(pool: PgPool, territory: TerritoryIndex, document_dir: &str) -> Self {
        use crate::domains::access::data::PgGrantStore;
        use crate::domains::commissions::data::PgCommissionStore;
        use crate::domains::corrections::data::PgLedgerStore;
        use crate::domains::documents::data::PgDocumentStore;
        use crate::domains::participation::data::PgParticipationStore;
        use crate::domains::results::data::PgVoteStore;

        Self {
            territory: Arc::new(territory),
            grants: Arc::new(PgGrantStore::new(pool.clone())),
            participation: Arc::new(PgParticipationStore::new(pool.clone())),
            votes: Arc::new(PgVoteStore::new(pool.clone())),
            ledger: Arc::new(PgLedgerStore::new(pool.clone())),
            commissions: Arc::new(PgCommissionStore::new(pool.clone())),
            documents: Arc::new(PgDocumentStore::new(pool)),
            blobs: Arc::new(FsBlobStore::new(document_dir)),
        }
    }

    /// All-in-memory wiring for tests and local dry runs.
    pub fn in_memory(territory: TerritoryIndex) -> Self {
        Self {
            territory: Arc::new(territory),
            grants: Arc::new(MemoryGrantStore::new()),
            participation: Arc::new(MemoryParticipationStore::new()),
            votes: Arc::new(MemoryVoteStore::new()),
            ledger: Arc::new(MemoryLedgerStore::new()),
            commissions: Arc::new(MemoryCommissionStore::new()),
            documents: Arc::new(MemoryDocumentStore::new()),
            blobs: Arc::new(MemoryBlobStore::new()),
        }
    }
}
