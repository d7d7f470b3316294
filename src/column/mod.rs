//! The column model.
//!
//! A row of a standard column family is a sorted list of [`Column`]s; a row
//! of a super column family is a sorted list of [`SuperColumn`]s, each holding
//! its own sorted sub-columns. [`ColumnEntry`] is the element type shared by
//! both kinds of row, and [`reconcile`] is the single rule used everywhere two
//! versions of the same name meet: memtable inserts and the read-time merge.

#[allow(clippy::module_inception)]
mod column;
pub mod serializer;
mod super_column;

use std::fmt;

pub use column::Column;
pub use super_column::SuperColumn;

use crate::util::Slice;

/// One top-level entry of a row.
#[derive(Clone, PartialEq, Eq)]
pub enum ColumnEntry {
    Column(Column),
    Super(SuperColumn),
}

impl ColumnEntry {
    pub fn name(&self) -> &Slice {
        match self {
            ColumnEntry::Column(c) => c.name(),
            ColumnEntry::Super(sc) => sc.name(),
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            ColumnEntry::Column(c) => c.timestamp(),
            ColumnEntry::Super(sc) => sc.timestamp(),
        }
    }

    pub fn is_super(&self) -> bool {
        matches!(self, ColumnEntry::Super(_))
    }

    /// True for a leaf tombstone. A super column is never itself a tombstone;
    /// its deletion is expressed by its marker.
    pub fn is_tombstone(&self) -> bool {
        match self {
            ColumnEntry::Column(c) => c.is_tombstone(),
            ColumnEntry::Super(_) => false,
        }
    }

    /// Leaf value; `None` for a super column.
    pub fn value(&self) -> Option<&Slice> {
        match self {
            ColumnEntry::Column(c) => Some(c.value()),
            ColumnEntry::Super(_) => None,
        }
    }

    /// Children of a super column; empty for a leaf.
    pub fn sub_columns(&self) -> &[Column] {
        match self {
            ColumnEntry::Column(_) => &[],
            ColumnEntry::Super(sc) => sc.sub_columns(),
        }
    }

    pub fn as_column(&self) -> Option<&Column> {
        match self {
            ColumnEntry::Column(c) => Some(c),
            ColumnEntry::Super(_) => None,
        }
    }

    pub fn as_super_column(&self) -> Option<&SuperColumn> {
        match self {
            ColumnEntry::Column(_) => None,
            ColumnEntry::Super(sc) => Some(sc),
        }
    }

    pub fn size(&self) -> usize {
        match self {
            ColumnEntry::Column(c) => c.size(),
            ColumnEntry::Super(sc) => sc.size(),
        }
    }
}

impl From<Column> for ColumnEntry {
    fn from(c: Column) -> Self {
        ColumnEntry::Column(c)
    }
}

impl From<SuperColumn> for ColumnEntry {
    fn from(sc: SuperColumn) -> Self {
        ColumnEntry::Super(sc)
    }
}

impl fmt::Debug for ColumnEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnEntry::Column(c) => c.fmt(f),
            ColumnEntry::Super(sc) => sc.fmt(f),
        }
    }
}

/// Combine two versions of the same name into the surviving one.
///
/// Leaf columns: newest timestamp wins (see [`Column::reconcile`]). Super
/// columns: children are unioned recursively and the later deletion marker is
/// kept. Callers never pass entries of different kinds; column families reject
/// such writes before they reach a container.
pub fn reconcile(existing: ColumnEntry, incoming: ColumnEntry) -> ColumnEntry {
    match (existing, incoming) {
        (ColumnEntry::Column(a), ColumnEntry::Column(b)) => ColumnEntry::Column(a.reconcile(b)),
        (ColumnEntry::Super(mut a), ColumnEntry::Super(b)) => {
            a.merge(b);
            ColumnEntry::Super(a)
        }
        (_, incoming) => {
            debug_assert!(false, "reconciling a column with a super column");
            incoming
        }
    }
}
