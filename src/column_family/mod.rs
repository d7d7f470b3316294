/// Column Family module
///
/// A table holds several named column families. Each family stores, per row
/// key, a sorted set of columns (standard families) or of super columns
/// holding sorted sub-columns (super families). Each family has its own:
/// - Options (column type, comparator, flush threshold, compression, bloom filter)
/// - Memtable and memtables pending flush
/// - SSTable files and manifest
///
/// # Architecture
///
/// ```text
/// Table("Table1")
///  ├─→ ColumnFamilyStore("Standard1")
///  │    ├─→ MemTable
///  │    ├─→ MemTables being flushed
///  │    └─→ SSTables (Standard1-1-Data.db, ...)
///  └─→ ColumnFamilyStore("Super1")
///       └─→ ...
/// ```
///
/// # Usage
///
/// ```ignore
/// use widecol::{ColumnFamilyDescriptor, QueryFilter, QueryPath, Table, TableOptions};
///
/// let table = Table::open(
///     "data/Table1",
///     "Table1",
///     TableOptions::default(),
///     vec![ColumnFamilyDescriptor::standard("Standard1")],
/// )?;
///
/// let store = table.column_family_store("Standard1")?;
/// let cf = store.get_column_family(
///     &"key1".into(),
///     &QueryPath::new("Standard1"),
///     &QueryFilter::slice("col2", "col4", false, 10),
/// )?;
/// ```
#[allow(clippy::module_inception)]
mod column_family;
pub mod column_family_descriptor;
pub mod column_family_options;
mod column_family_set;
pub mod column_family_store;
pub mod manifest;

pub use column_family::ColumnFamily;
pub use column_family_descriptor::ColumnFamilyDescriptor;
pub use column_family_options::{ColumnFamilyOptions, ColumnType};
pub use column_family_set::ColumnFamilySet;
pub use column_family_store::ColumnFamilyStore;
