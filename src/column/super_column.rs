use std::cmp::Ordering;
use std::fmt;

use crate::column::Column;
use crate::comparator::{ComparatorRef, ComparatorType};
use crate::util::Slice;

/// A named group of sub-columns, sorted by the family's comparator.
///
/// A super column can itself be deleted: `marked_for_delete_at` shadows every
/// child written at or before that timestamp.
#[derive(Clone, PartialEq, Eq)]
pub struct SuperColumn {
    name: Slice,
    children: Vec<Column>,
    marked_for_delete_at: Option<i64>,
    comparator: ComparatorType,
}

impl SuperColumn {
    pub fn new(name: impl Into<Slice>, comparator: ComparatorType) -> Self {
        SuperColumn {
            name: name.into(),
            children: Vec::new(),
            marked_for_delete_at: None,
            comparator,
        }
    }

    pub fn with_columns(
        name: impl Into<Slice>,
        comparator: ComparatorType,
        columns: impl IntoIterator<Item = Column>,
    ) -> Self {
        let mut sc = SuperColumn::new(name, comparator);
        for column in columns {
            sc.add_column(column);
        }
        sc
    }

    pub fn name(&self) -> &Slice {
        &self.name
    }

    pub fn comparator(&self) -> ComparatorRef {
        self.comparator.comparator()
    }

    pub fn comparator_type(&self) -> ComparatorType {
        self.comparator
    }

    /// Children in comparator order, tombstones included.
    pub fn sub_columns(&self) -> &[Column] {
        &self.children
    }

    pub fn sub_column_count(&self) -> usize {
        self.children.len()
    }

    pub fn live_sub_column_count(&self) -> usize {
        self.children.iter().filter(|c| !c.is_tombstone()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Newest child timestamp, `i64::MIN` when there are no children.
    pub fn timestamp(&self) -> i64 {
        self.children
            .iter()
            .map(Column::timestamp)
            .max()
            .unwrap_or(i64::MIN)
    }

    pub fn marked_for_delete_at(&self) -> Option<i64> {
        self.marked_for_delete_at
    }

    pub fn is_marked_for_delete(&self) -> bool {
        self.marked_for_delete_at.is_some()
    }

    /// Record a deletion at `timestamp`. Markers only move forward.
    pub fn mark_for_delete_at(&mut self, timestamp: i64) {
        self.marked_for_delete_at = Some(match self.marked_for_delete_at {
            Some(existing) => existing.max(timestamp),
            None => timestamp,
        });
    }

    fn search(&self, name: &[u8]) -> std::result::Result<usize, usize> {
        let cmp = self.comparator();
        self.children
            .binary_search_by(|c| cmp.compare_names(c.name().data(), name))
    }

    pub fn get_sub_column(&self, name: &[u8]) -> Option<&Column> {
        self.search(name).ok().map(|i| &self.children[i])
    }

    /// Insert a child, reconciling with an existing child of the same name.
    pub fn add_column(&mut self, column: Column) {
        match self.search(column.name().data()) {
            Ok(i) => {
                let existing = self.children[i].clone();
                self.children[i] = existing.reconcile(column);
            }
            Err(i) => self.children.insert(i, column),
        }
    }

    pub fn remove_sub_column(&mut self, name: &[u8]) -> Option<Column> {
        self.search(name).ok().map(|i| self.children.remove(i))
    }

    /// Fold another version of this super column into `self`: children are
    /// unioned with per-name reconciliation and the deletion marker is the
    /// later of the two.
    pub fn merge(&mut self, other: SuperColumn) {
        debug_assert_eq!(
            self.comparator().compare_names(self.name.data(), other.name.data()),
            Ordering::Equal
        );
        if let Some(ts) = other.marked_for_delete_at {
            self.mark_for_delete_at(ts);
        }
        if self.children.is_empty() {
            self.children = other.children;
            return;
        }
        for column in other.children {
            self.add_column(column);
        }
    }

    /// Same name and deletion marker, no children.
    pub fn clone_shallow(&self) -> SuperColumn {
        SuperColumn {
            name: self.name.clone(),
            children: Vec::new(),
            marked_for_delete_at: self.marked_for_delete_at,
            comparator: self.comparator,
        }
    }

    pub fn retain(&mut self, f: impl FnMut(&Column) -> bool) {
        self.children.retain(f);
    }

    /// Keep only the children at `positions`, which must be ascending.
    pub(crate) fn retain_positions(&mut self, positions: &[usize]) {
        let mut next = positions.iter().copied().peekable();
        let mut i = 0;
        self.children.retain(|_| {
            let keep = next.peek() == Some(&i);
            if keep {
                next.next();
            }
            i += 1;
            keep
        });
    }

    pub fn size(&self) -> usize {
        self.name.size() + 9 + self.children.iter().map(Column::size).sum::<usize>()
    }
}

impl fmt::Debug for SuperColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(ts) = self.marked_for_delete_at {
            write!(f, "(deleted@{ts})")?;
        }
        f.debug_list().entries(&self.children).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sc(name: &str) -> SuperColumn {
        SuperColumn::new(name, ComparatorType::Name)
    }

    #[test]
    fn test_children_stay_sorted() {
        let mut s = sc("sc1");
        s.add_column(Column::new("c", "3", 1));
        s.add_column(Column::new("a", "1", 1));
        s.add_column(Column::new("b", "2", 1));
        let names: Vec<_> = s.sub_columns().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_add_reconciles_same_name() {
        let mut s = sc("sc1");
        s.add_column(Column::new("a", "new", 5));
        s.add_column(Column::new("a", "old", 3));
        assert_eq!(s.sub_column_count(), 1);
        assert_eq!(s.get_sub_column(b"a").unwrap().value(), &Slice::from("new"));
    }

    #[test]
    fn test_timestamp_is_newest_child() {
        let mut s = sc("sc1");
        assert_eq!(s.timestamp(), i64::MIN);
        s.add_column(Column::new("a", "", 4));
        s.add_column(Column::tombstone("b", 9));
        assert_eq!(s.timestamp(), 9);
    }

    #[test]
    fn test_merge_unions_children_and_keeps_later_marker() {
        let mut left = SuperColumn::with_columns(
            "sc1",
            ComparatorType::Name,
            [Column::new("a", "1", 1), Column::new("b", "old", 1)],
        );
        left.mark_for_delete_at(3);

        let mut right = SuperColumn::with_columns(
            "sc1",
            ComparatorType::Name,
            [Column::new("b", "new", 2), Column::new("c", "3", 1)],
        );
        right.mark_for_delete_at(1);

        left.merge(right);
        assert_eq!(left.sub_column_count(), 3);
        assert_eq!(left.get_sub_column(b"b").unwrap().value(), &Slice::from("new"));
        assert_eq!(left.marked_for_delete_at(), Some(3));
    }

    #[test]
    fn test_retain_positions() {
        let mut s = SuperColumn::with_columns(
            "sc1",
            ComparatorType::Name,
            ["a", "b", "c", "d"].map(|n| Column::new(n, "", 1)),
        );
        s.retain_positions(&[1, 3]);
        let names: Vec<_> = s.sub_columns().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["b", "d"]);
    }

    #[test]
    fn test_clone_shallow() {
        let mut s = SuperColumn::with_columns("sc1", ComparatorType::Name, [Column::new("a", "", 1)]);
        s.mark_for_delete_at(2);
        let shell = s.clone_shallow();
        assert!(shell.is_empty());
        assert_eq!(shell.marked_for_delete_at(), Some(2));
        assert_eq!(shell.name(), s.name());
    }
}
