use crate::persistence::PersistenceResult;
use crate::processing::EntityRecord;
use serde::{Deserialize, Serialize};

/// Sentinel key of the single overwritten snapshot.
pub const LATEST_KEY: &str = "latest";

/// Full serialization of canonical state at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(rename = "timestamp")]
    pub key: String,
    pub data: Vec<EntityRecord>,
    pub updated_at: u64,
}

impl Snapshot {
    pub fn latest(data: Vec<EntityRecord>, updated_at: u64) -> Self {
        Self {
            key: LATEST_KEY.to_string(),
            data,
            updated_at,
        }
    }
}

/// Durable key-value contract used by the persistence gateway.
///
/// Calls block; the gateway runs them off the pipeline task.
pub trait SnapshotStore: Send + Sync + 'static {
    /// Replaces the stored snapshot under `snapshot.key`.
    fn put_latest(&self, snapshot: &Snapshot) -> PersistenceResult<()>;
    fn load_latest(&self) -> PersistenceResult<Option<Snapshot>>;
}
