use crate::persistence::snapshot::{Snapshot, SnapshotStore, LATEST_KEY};
use crate::persistence::{PersistenceError, PersistenceResult};
use log::info;
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;

/// key = snapshot key, value = JSON-encoded `Snapshot`.
const SNAPSHOTS: TableDefinition<&str, &[u8]> = TableDefinition::new("snapshots");

fn storage<E: Into<redb::Error>>(err: E) -> PersistenceError {
    PersistenceError::Storage(err.into())
}

/// Embedded single-file snapshot store.
pub struct RedbSnapshotStore {
    db: Database,
}

impl RedbSnapshotStore {
    /// Opens or creates the database and makes sure the snapshot table exists.
    pub fn open<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        let path = path.as_ref();
        let db = Database::create(path).map_err(storage)?;
        let txn = db.begin_write().map_err(storage)?;
        txn.open_table(SNAPSHOTS).map_err(storage)?;
        txn.commit().map_err(storage)?;
        info!("[persistence] snapshot store ready at {}", path.display());
        Ok(Self { db })
    }
}

impl SnapshotStore for RedbSnapshotStore {
    fn put_latest(&self, snapshot: &Snapshot) -> PersistenceResult<()> {
        let bytes = serde_json::to_vec(snapshot)?;
        let txn = self.db.begin_write().map_err(storage)?;
        {
            let mut table = txn.open_table(SNAPSHOTS).map_err(storage)?;
            table
                .insert(snapshot.key.as_str(), bytes.as_slice())
                .map_err(storage)?;
        }
        txn.commit().map_err(storage)?;
        Ok(())
    }

    fn load_latest(&self) -> PersistenceResult<Option<Snapshot>> {
        let txn = self.db.begin_read().map_err(storage)?;
        let table = txn.open_table(SNAPSHOTS).map_err(storage)?;
        let entry = table.get(LATEST_KEY).map_err(storage)?;
        match entry {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::EntityRecord;
    use tempfile::tempdir;

    fn record(id: i32, lat: f64) -> EntityRecord {
        EntityRecord {
            id,
            lat,
            lng: -122.0,
            status: 2,
            last_update: 1_000,
            is_moving: false,
        }
    }

    #[test]
    fn fresh_store_has_no_snapshot() {
        let dir = tempdir().unwrap();
        let store = RedbSnapshotStore::open(dir.path().join("fleet.redb")).unwrap();
        assert!(store.load_latest().unwrap().is_none());
    }

    #[test]
    fn put_overwrites_previous_snapshot() {
        let dir = tempdir().unwrap();
        let store = RedbSnapshotStore::open(dir.path().join("fleet.redb")).unwrap();

        store
            .put_latest(&Snapshot::latest(vec![record(1, 1.0), record(2, 2.0)], 5))
            .unwrap();
        store
            .put_latest(&Snapshot::latest(vec![record(3, 3.0)], 6))
            .unwrap();

        let loaded = store.load_latest().unwrap().unwrap();
        assert_eq!(loaded.key, LATEST_KEY);
        assert_eq!(loaded.updated_at, 6);
        assert_eq!(loaded.data, vec![record(3, 3.0)]);
    }

    #[test]
    fn snapshot_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fleet.redb");
        {
            let store = RedbSnapshotStore::open(&path).unwrap();
            store
                .put_latest(&Snapshot::latest(vec![record(7, 7.5)], 9))
                .unwrap();
        }
        let reopened = RedbSnapshotStore::open(&path).unwrap();
        assert_eq!(reopened.load_latest().unwrap().unwrap().data[0].id, 7);
    }
}
