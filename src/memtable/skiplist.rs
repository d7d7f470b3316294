use std::sync::Arc;

use crossbeam_skiplist::SkipMap;
use parking_lot::RwLock;

use crate::column_family::ColumnFamily;
use crate::util::Slice;

/// A row held in a memtable. Readers take the read lock for the duration of
/// one selection, so they see a row either before or after an insert.
pub type SharedRow = Arc<RwLock<ColumnFamily>>;

/// Lock-free ordered map from row key to row.
pub struct SkipList {
    map: SkipMap<Slice, SharedRow>,
}

impl SkipList {
    pub fn new() -> Self {
        SkipList {
            map: SkipMap::new(),
        }
    }

    pub fn get(&self, key: &Slice) -> Option<SharedRow> {
        self.map.get(key).map(|entry| entry.value().clone())
    }

    /// Return the row under `key`, creating it with `make` when absent.
    ///
    /// Callers must serialize inserts; concurrent `get`s are fine.
    pub fn get_or_insert(&self, key: &Slice, make: impl FnOnce() -> ColumnFamily) -> SharedRow {
        if let Some(row) = self.get(key) {
            return row;
        }
        let row = Arc::new(RwLock::new(make()));
        self.map.insert(key.clone(), row.clone());
        row
    }

    /// All rows in key order.
    pub fn rows(&self) -> impl Iterator<Item = (Slice, SharedRow)> + '_ {
        self.map
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new()
    }
}
