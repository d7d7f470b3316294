use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::column::ColumnEntry;
use crate::column_family::{ColumnFamily, ColumnType};
use crate::comparator::ComparatorType;
use crate::iterator::{MemTableIterator, RowSource};
use crate::memtable::skiplist::SkipList;
use crate::query::QueryFilter;
use crate::util::{Result, Slice};

/// In-memory, mutable rows of one column family.
///
/// One writer at a time (inserts are serialized by `write_lock`), any number
/// of concurrent readers. Each row is guarded by its own lock, so a reader
/// observes every insert into that row either completely or not at all.
pub struct MemTable {
    table: String,
    family: String,
    column_type: ColumnType,
    comparator: ComparatorType,
    rows: SkipList,
    approximate_memory: AtomicUsize,
    write_lock: Mutex<()>,
}

impl MemTable {
    pub fn new(
        table: impl Into<String>,
        family: impl Into<String>,
        column_type: ColumnType,
        comparator: ComparatorType,
    ) -> Self {
        MemTable {
            table: table.into(),
            family: family.into(),
            column_type,
            comparator,
            rows: SkipList::new(),
            approximate_memory: AtomicUsize::new(0),
            write_lock: Mutex::new(()),
        }
    }

    fn empty_row(&self) -> ColumnFamily {
        ColumnFamily::new(
            self.table.clone(),
            self.family.clone(),
            self.column_type,
            self.comparator,
        )
    }

    /// Insert `entry` into the row, reconciling with any existing entry of
    /// the same name.
    pub fn insert_or_merge(&self, row_key: &Slice, entry: ColumnEntry) {
        let _writer = self.write_lock.lock();
        let size = entry.size();
        let row = self.rows.get_or_insert(row_key, || self.empty_row());
        row.write().add(entry);
        self.approximate_memory
            .fetch_add(size + row_key.size(), Ordering::Relaxed);
    }

    /// Fold every entry and the deletion marker of `cf` into the row.
    pub fn apply(&self, row_key: &Slice, cf: ColumnFamily) {
        let _writer = self.write_lock.lock();
        let size = cf.size();
        let row = self.rows.get_or_insert(row_key, || self.empty_row());
        {
            let mut row = row.write();
            if let Some(ts) = cf.marked_for_delete_at() {
                row.delete(ts);
            }
            for entry in cf.entries() {
                row.add(entry.clone());
            }
        }
        self.approximate_memory
            .fetch_add(size + row_key.size(), Ordering::Relaxed);
    }

    /// A copy of the whole row.
    pub fn get_row(&self, row_key: &Slice) -> Option<ColumnFamily> {
        self.rows.get(row_key).map(|row| row.read().clone())
    }

    /// The entries of the row selected by `filter`, in filter order.
    ///
    /// The selected entries are copied out under the row's read lock, so the
    /// returned iterator is unaffected by later inserts.
    pub fn read_range(&self, row_key: &Slice, filter: &QueryFilter) -> Result<Option<RowSource>> {
        let Some(row) = self.rows.get(row_key) else {
            return Ok(None);
        };
        let row = row.read();
        let entries = row.entries();
        let selection = filter.select(entries.len(), row.comparator(), |i| {
            Ok(entries[i].name().clone())
        })?;
        let selected: Vec<ColumnEntry> = selection.map(|i| entries[i].clone()).collect();
        Ok(Some(RowSource::new(
            row.marked_for_delete_at(),
            MemTableIterator::new(selected),
        )))
    }

    /// Copies of all rows in key order, for writing an SSTable.
    pub fn snapshot_rows(&self) -> Vec<(Slice, ColumnFamily)> {
        self.rows
            .rows()
            .map(|(key, row)| (key, row.read().clone()))
            .collect()
    }

    pub fn family_name(&self) -> &str {
        &self.family
    }

    pub fn approximate_memory_usage(&self) -> usize {
        self.approximate_memory.load(Ordering::Relaxed)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
