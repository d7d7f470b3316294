use std::cmp::Ordering;
use std::fmt;

use crate::util::Slice;

/// A single named, timestamped value.
///
/// A tombstone records the deletion of a name at `timestamp`; its value is
/// empty. Columns are immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct Column {
    name: Slice,
    value: Slice,
    timestamp: i64,
    is_tombstone: bool,
}

impl Column {
    pub fn new(name: impl Into<Slice>, value: impl Into<Slice>, timestamp: i64) -> Self {
        Column {
            name: name.into(),
            value: value.into(),
            timestamp,
            is_tombstone: false,
        }
    }

    pub fn tombstone(name: impl Into<Slice>, timestamp: i64) -> Self {
        Column {
            name: name.into(),
            value: Slice::empty(),
            timestamp,
            is_tombstone: true,
        }
    }

    pub fn name(&self) -> &Slice {
        &self.name
    }

    pub fn value(&self) -> &Slice {
        &self.value
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn is_tombstone(&self) -> bool {
        self.is_tombstone
    }

    /// Approximate in-memory footprint, used for memtable accounting.
    pub fn size(&self) -> usize {
        self.name.size() + self.value.size() + 8 + 1
    }

    /// Keep whichever of two versions of the same name survives.
    ///
    /// The higher timestamp wins. On a tie a tombstone beats a live value, and
    /// between two live values the larger value wins, so the outcome does not
    /// depend on argument order.
    pub fn reconcile(self, other: Column) -> Column {
        debug_assert_eq!(self.name, other.name);
        match self.timestamp.cmp(&other.timestamp) {
            Ordering::Greater => self,
            Ordering::Less => other,
            Ordering::Equal => match (self.is_tombstone, other.is_tombstone) {
                (true, false) => self,
                (false, true) => other,
                _ if other.value > self.value => other,
                _ => self,
            },
        }
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_tombstone {
            write!(f, "{}@{}(deleted)", self.name, self.timestamp)
        } else {
            write!(f, "{}={}@{}", self.name, self.value, self.timestamp)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_higher_timestamp_wins() {
        let old = Column::new("col", "old", 1);
        let new = Column::new("col", "new", 2);
        assert_eq!(old.clone().reconcile(new.clone()), new);
        assert_eq!(new.clone().reconcile(old), new);
    }

    #[test]
    fn test_tombstone_wins_timestamp_tie() {
        let live = Column::new("col", "v", 5);
        let dead = Column::tombstone("col", 5);
        assert!(live.clone().reconcile(dead.clone()).is_tombstone());
        assert!(dead.reconcile(live).is_tombstone());
    }

    #[test]
    fn test_newer_live_value_beats_older_tombstone() {
        let dead = Column::tombstone("col", 1);
        let live = Column::new("col", "back", 2);
        let winner = dead.reconcile(live);
        assert!(!winner.is_tombstone());
        assert_eq!(winner.value(), &Slice::from("back"));
    }

    #[test]
    fn test_value_breaks_live_tie() {
        let a = Column::new("col", "apple", 3);
        let b = Column::new("col", "banana", 3);
        assert_eq!(a.clone().reconcile(b.clone()).value(), &Slice::from("banana"));
        assert_eq!(b.reconcile(a).value(), &Slice::from("banana"));
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", Column::new("col1", "val1", 1)), "col1=val1@1");
        assert_eq!(format!("{:?}", Column::tombstone("col4", 2)), "col4@2(deleted)");
    }
}
