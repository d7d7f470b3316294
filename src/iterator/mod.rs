/// Iterator module
///
/// A read of one row of one column family draws from several sources, each
/// already restricted and ordered by the query filter:
///
/// ```text
/// ColumnFamilyStore::get_column_family
///     ↓
/// MergingIterator
///     ├─→ MemTableIterator (active memtable)
///     ├─→ MemTableIterator (memtables being flushed)
///     └─→ [TableIterator, TableIterator, ...] (SSTables)
/// ```
///
/// ## Key Design Principles
///
/// 1. **Reconcile, don't shadow**: equal names from different sources are
///    combined with `column::reconcile`, so source order never matters
/// 2. **Tombstones flow through**: deletions are returned to the caller,
///    who purges them with `remove_deleted`
/// 3. **Lazy**: SSTable entries are decoded only when the merge pulls them,
///    so a count-limited read stops decoding early
/// 4. **Fail whole**: an error from any source ends the merge
use crate::column::ColumnEntry;
use crate::util::Result;

mod memtable_iterator;
mod merging_iterator;
mod table_iterator;

pub use memtable_iterator::MemTableIterator;
pub use merging_iterator::MergingIterator;
pub use table_iterator::TableIterator;

/// A finite, ordered, non-restartable stream of top-level entries.
pub type ColumnIter = Box<dyn Iterator<Item = Result<ColumnEntry>> + Send>;

/// What one source knows about one row: its deletion marker and the entries
/// a query selected from it.
pub struct RowSource {
    pub marked_for_delete_at: Option<i64>,
    pub columns: ColumnIter,
}

impl RowSource {
    pub fn new(
        marked_for_delete_at: Option<i64>,
        columns: impl Iterator<Item = Result<ColumnEntry>> + Send + 'static,
    ) -> Self {
        RowSource {
            marked_for_delete_at,
            columns: Box::new(columns),
        }
    }
}
