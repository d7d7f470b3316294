pub mod column;
pub mod column_family;
pub mod comparator;
pub mod compression;
pub mod db;
pub mod filter;
pub mod iterator;
pub mod memtable;
pub mod query;
pub mod statistics;
pub mod table;
pub mod util;

pub use column::{Column, ColumnEntry, SuperColumn, reconcile};
pub use column_family::{
    ColumnFamily, ColumnFamilyDescriptor, ColumnFamilyOptions, ColumnFamilyStore, ColumnType,
};
pub use comparator::{ColumnComparator, ComparatorType, get_comparator, get_comparator_by_index};
pub use compression::CompressionType;
pub use db::{Row, RowMutation, Table, TableOptions};
pub use filter::{BloomFilterPolicy, FilterPolicy};
pub use query::{NamesFilter, QueryFilter, QueryPath, SliceRange};
pub use statistics::Statistics;
pub use util::{Code, Result, Slice, Status};
