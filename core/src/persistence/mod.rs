pub mod gateway;
pub mod redb_store;
pub mod snapshot;

pub use gateway::{PersistenceGateway, SaveOutcome};
pub use redb_store::RedbSnapshotStore;
pub use snapshot::{Snapshot, SnapshotStore, LATEST_KEY};

/// Failures of the durable snapshot store.
#[derive(thiserror::Error, Debug)]
pub enum PersistenceError {
    #[error("storage engine: {0}")]
    Storage(#[from] redb::Error),
    #[error("snapshot encoding: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("background write aborted: {0}")]
    Aborted(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
