use serde::{Deserialize, Serialize};
use std::collections::btree_map::{BTreeMap, Entry};

/// Canonical state of one tracked vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    pub id: i32,
    pub lat: f64,
    pub lng: f64,
    pub status: u8,
    /// Epoch milliseconds of the last frame that carried this id.
    pub last_update: u64,
    pub is_moving: bool,
}

/// Authoritative id -> record mapping. Entities are never evicted.
#[derive(Debug, Default)]
pub struct CanonicalStore {
    entries: BTreeMap<i32, EntityRecord>,
}

impl CanonicalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: i32) -> Option<&EntityRecord> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current values ordered by id.
    pub fn values(&self) -> impl Iterator<Item = &EntityRecord> {
        self.entries.values()
    }

    pub fn snapshot_values(&self) -> Vec<EntityRecord> {
        self.entries.values().cloned().collect()
    }

    /// Replaces the record for `record.id`. Only the denoise engine writes here.
    pub(crate) fn upsert(&mut self, record: EntityRecord) -> &EntityRecord {
        match self.entries.entry(record.id) {
            Entry::Occupied(mut slot) => {
                *slot.get_mut() = record;
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(record),
        }
    }
}
