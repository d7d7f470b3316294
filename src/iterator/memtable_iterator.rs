use crate::column::ColumnEntry;
use crate::util::Result;

/// Entries selected from a memtable row, already copied out of the row so the
/// memtable can keep taking writes.
pub struct MemTableIterator {
    entries: std::vec::IntoIter<ColumnEntry>,
}

impl MemTableIterator {
    pub fn new(entries: Vec<ColumnEntry>) -> Self {
        MemTableIterator {
            entries: entries.into_iter(),
        }
    }
}

impl Iterator for MemTableIterator {
    type Item = Result<ColumnEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next().map(Ok)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}
