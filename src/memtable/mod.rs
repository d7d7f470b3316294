#[allow(clippy::module_inception)]
pub mod memtable;
pub mod skiplist;

pub use memtable::MemTable;
pub use skiplist::SkipList;
