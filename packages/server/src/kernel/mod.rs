pub mod blob;
pub mod deps;
pub mod memory;
pub mod traits;

pub use blob::FsBlobStore;
pub use deps::ServerDeps;
pub use traits::{
    BaseBlobStore, BaseCommissionStore, BaseDocumentStore, BaseGrantStore, BaseLedgerStore,
    BaseParticipationStore, BaseVoteStore, StoredBlob,
};
