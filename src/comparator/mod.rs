//! Column ordering.
//!
//! Every container (a row of a column family, the children of a super column)
//! and every merge keeps its entries sorted by one [`ColumnComparator`]. The
//! comparator is chosen per column family through the closed
//! [`ComparatorType`] enum; [`get_comparator`] resolves a type to its shared
//! static instance so that all containers of a family use the same one.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::column::ColumnEntry;
use crate::util::{Result, Status};

/// Total order over column names, with a timestamp tie-break for leaf columns.
pub trait ColumnComparator: Send + Sync + fmt::Debug {
    fn comparator_type(&self) -> ComparatorType;

    /// Order two raw names. Containers are sorted and searched with this.
    fn compare_names(&self, a: &[u8], b: &[u8]) -> Ordering;

    /// Order two entries of the same kind.
    ///
    /// Names decide first. Two leaf columns with equal names order newer
    /// timestamp first, so an unreconciled sequence lists the latest version
    /// of a name before older ones. Super columns with equal names are equal.
    fn compare(&self, a: &ColumnEntry, b: &ColumnEntry) -> Ordering {
        debug_assert_eq!(
            a.is_super(),
            b.is_super(),
            "cannot order a column against a super column"
        );
        self.compare_names(a.name().data(), b.name().data())
            .then_with(|| match (a, b) {
                (ColumnEntry::Column(x), ColumnEntry::Column(y)) => {
                    y.timestamp().cmp(&x.timestamp())
                }
                _ => Ordering::Equal,
            })
    }
}

pub type ComparatorRef = &'static dyn ColumnComparator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ComparatorType {
    /// Lexicographic comparison of the raw name bytes.
    #[default]
    Name = 0,
}

impl ComparatorType {
    pub const ALL: [ComparatorType; 1] = [ComparatorType::Name];

    pub fn comparator(self) -> ComparatorRef {
        get_comparator(self)
    }
}

impl fmt::Display for ComparatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparatorType::Name => write!(f, "NAME"),
        }
    }
}

#[derive(Debug, Default)]
pub struct NameComparator;

impl ColumnComparator for NameComparator {
    fn comparator_type(&self) -> ComparatorType {
        ComparatorType::Name
    }

    fn compare_names(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }
}

static NAME_COMPARATOR: NameComparator = NameComparator;

pub fn get_comparator(comparator_type: ComparatorType) -> ComparatorRef {
    match comparator_type {
        ComparatorType::Name => &NAME_COMPARATOR,
    }
}

/// Resolve a comparator from its ordinal in [`ComparatorType::ALL`].
pub fn get_comparator_by_index(index: usize) -> Result<ComparatorRef> {
    ComparatorType::ALL
        .get(index)
        .map(|t| get_comparator(*t))
        .ok_or_else(|| {
            Status::invalid_argument(format!(
                "comparator index {} out of range (0..{})",
                index,
                ComparatorType::ALL.len()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{Column, SuperColumn};

    #[test]
    fn test_names_order_bytewise() {
        let cmp = get_comparator(ComparatorType::Name);
        assert_eq!(cmp.compare_names(b"a", b"b"), Ordering::Less);
        assert_eq!(cmp.compare_names(b"col10", b"col2"), Ordering::Less);
        assert_eq!(cmp.compare_names(b"", b"a"), Ordering::Less);
        assert_eq!(cmp.compare_names(b"x", b"x"), Ordering::Equal);
    }

    #[test]
    fn test_equal_names_newer_first() {
        let cmp = get_comparator(ComparatorType::Name);
        let older = ColumnEntry::from(Column::new("col", "v1", 1));
        let newer = ColumnEntry::from(Column::new("col", "v2", 2));
        assert_eq!(cmp.compare(&newer, &older), Ordering::Less);
        assert_eq!(cmp.compare(&older, &newer), Ordering::Greater);
        assert_eq!(cmp.compare(&older, &older.clone()), Ordering::Equal);
    }

    #[test]
    fn test_tie_break_does_not_overflow() {
        let cmp = get_comparator(ComparatorType::Name);
        let min = ColumnEntry::from(Column::new("col", "a", i64::MIN));
        let max = ColumnEntry::from(Column::new("col", "b", i64::MAX));
        assert_eq!(cmp.compare(&max, &min), Ordering::Less);
        assert_eq!(cmp.compare(&min, &max), Ordering::Greater);
    }

    #[test]
    fn test_names_dominate_timestamps() {
        let cmp = get_comparator(ComparatorType::Name);
        let a = ColumnEntry::from(Column::new("a", "", 1));
        let b = ColumnEntry::from(Column::new("b", "", 100));
        assert_eq!(cmp.compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_super_columns_with_equal_names_are_equal() {
        let cmp = get_comparator(ComparatorType::Name);
        let mut x = SuperColumn::new("sc1", ComparatorType::Name);
        x.add_column(Column::new("sub", "v", 7));
        let y = SuperColumn::new("sc1", ComparatorType::Name);
        assert_eq!(
            cmp.compare(&ColumnEntry::from(x), &ColumnEntry::from(y)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_registry() {
        let by_type = get_comparator(ComparatorType::Name);
        let by_index = get_comparator_by_index(0).unwrap();
        assert_eq!(by_index.comparator_type(), by_type.comparator_type());
        assert_eq!(ComparatorType::Name.comparator().comparator_type(), ComparatorType::Name);

        let err = get_comparator_by_index(1).unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
