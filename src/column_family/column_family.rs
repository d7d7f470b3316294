use std::fmt;

use crate::column::{reconcile, Column, ColumnEntry, SuperColumn};
use crate::column_family::ColumnType;
use crate::comparator::{ComparatorRef, ComparatorType};
use crate::query::QueryPath;
use crate::util::{Result, Slice, Status};

/// The part of one row that belongs to one column family.
///
/// Entries are kept sorted by the family's comparator with unique names;
/// adding a name that is already present reconciles the two versions. This
/// is both the unit a write applies and the result of a read.
#[derive(Clone, PartialEq, Eq)]
pub struct ColumnFamily {
    table: String,
    name: String,
    column_type: ColumnType,
    comparator: ComparatorType,
    entries: Vec<ColumnEntry>,
    marked_for_delete_at: Option<i64>,
}

impl ColumnFamily {
    pub fn new(
        table: impl Into<String>,
        name: impl Into<String>,
        column_type: ColumnType,
        comparator: ComparatorType,
    ) -> Self {
        ColumnFamily {
            table: table.into(),
            name: name.into(),
            column_type,
            comparator,
            entries: Vec::new(),
            marked_for_delete_at: None,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn is_super(&self) -> bool {
        self.column_type == ColumnType::Super
    }

    pub fn comparator(&self) -> ComparatorRef {
        self.comparator.comparator()
    }

    pub fn comparator_type(&self) -> ComparatorType {
        self.comparator
    }

    /// Entries in comparator order, tombstones included.
    pub fn entries(&self) -> &[ColumnEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnEntry> {
        self.entries.iter()
    }

    pub fn column_names(&self) -> Vec<Slice> {
        self.entries.iter().map(|e| e.name().clone()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn search(&self, name: &[u8]) -> std::result::Result<usize, usize> {
        let cmp = self.comparator();
        self.entries
            .binary_search_by(|e| cmp.compare_names(e.name().data(), name))
    }

    pub fn get(&self, name: &[u8]) -> Option<&ColumnEntry> {
        self.search(name).ok().map(|i| &self.entries[i])
    }

    pub fn get_column(&self, name: &[u8]) -> Option<&Column> {
        self.get(name).and_then(ColumnEntry::as_column)
    }

    pub fn get_super_column(&self, name: &[u8]) -> Option<&SuperColumn> {
        self.get(name).and_then(ColumnEntry::as_super_column)
    }

    /// Whether `entry` has the kind this family stores.
    pub fn accepts(&self, entry: &ColumnEntry) -> bool {
        entry.is_super() == self.is_super()
    }

    /// Insert an entry, reconciling with an existing entry of the same name.
    pub fn add(&mut self, entry: impl Into<ColumnEntry>) {
        let entry = entry.into();
        debug_assert!(
            self.accepts(&entry),
            "{:?} entry added to {} family {}",
            entry,
            self.column_type,
            self.name
        );
        match self.search(entry.name().data()) {
            Ok(i) => {
                let existing = self.entries[i].clone();
                self.entries[i] = reconcile(existing, entry);
            }
            Err(i) => self.entries.insert(i, entry),
        }
    }

    pub fn remove(&mut self, name: &[u8]) -> Option<ColumnEntry> {
        self.search(name).ok().map(|i| self.entries.remove(i))
    }

    pub fn marked_for_delete_at(&self) -> Option<i64> {
        self.marked_for_delete_at
    }

    pub fn is_marked_for_delete(&self) -> bool {
        self.marked_for_delete_at.is_some()
    }

    /// Mark the whole row deleted at `timestamp`. Markers only move forward.
    pub fn delete(&mut self, timestamp: i64) {
        self.marked_for_delete_at = Some(match self.marked_for_delete_at {
            Some(existing) => existing.max(timestamp),
            None => timestamp,
        });
    }

    /// Fold `other` into `self`, entry by entry.
    pub fn merge(&mut self, other: ColumnFamily) {
        if let Some(ts) = other.marked_for_delete_at {
            self.delete(ts);
        }
        if self.entries.is_empty() {
            self.entries = other.entries;
            return;
        }
        for entry in other.entries {
            self.add(entry);
        }
    }

    /// Same family and deletion marker, no entries.
    pub fn clone_empty(&self) -> ColumnFamily {
        ColumnFamily {
            table: self.table.clone(),
            name: self.name.clone(),
            column_type: self.column_type,
            comparator: self.comparator,
            entries: Vec::new(),
            marked_for_delete_at: self.marked_for_delete_at,
        }
    }

    /// Replace every super column by `f` of it. Stops at the first error.
    pub(crate) fn map_super_columns(
        &mut self,
        mut f: impl FnMut(SuperColumn) -> Result<SuperColumn>,
    ) -> Result<()> {
        for entry in &mut self.entries {
            if let ColumnEntry::Super(sc) = entry {
                let shell = sc.clone_shallow();
                let taken = std::mem::replace(sc, shell);
                *sc = f(taken)?;
            }
        }
        Ok(())
    }

    fn check_path(&self, path: &QueryPath) -> Result<()> {
        if path.column_family != self.name {
            return Err(Status::invalid_argument(format!(
                "path {} does not address column family {}",
                path, self.name
            )));
        }
        if !self.is_super() && path.super_column_name.is_some() {
            return Err(Status::invalid_argument(format!(
                "{} is a standard column family, path {} names a super column",
                self.name, path
            )));
        }
        Ok(())
    }

    /// Write `value` at the column addressed by `path`.
    pub fn add_path(&mut self, path: &QueryPath, value: impl Into<Slice>, timestamp: i64) -> Result<()> {
        self.check_path(path)?;
        let Some(column_name) = &path.column_name else {
            return Err(Status::invalid_argument(format!("path {path} names no column")));
        };
        let column = Column::new(column_name.clone(), value, timestamp);
        match &path.super_column_name {
            Some(sc_name) => {
                let mut sc = SuperColumn::new(sc_name.clone(), self.comparator);
                sc.add_column(column);
                self.add(sc);
            }
            None if self.is_super() => {
                return Err(Status::invalid_argument(format!(
                    "{} is a super column family, path {} names no super column",
                    self.name, path
                )));
            }
            None => self.add(column),
        }
        Ok(())
    }

    /// Record a deletion of whatever `path` addresses: a column, a
    /// sub-column, a whole super column, or the whole row.
    pub fn delete_path(&mut self, path: &QueryPath, timestamp: i64) -> Result<()> {
        self.check_path(path)?;
        match (&path.super_column_name, &path.column_name) {
            (None, None) => self.delete(timestamp),
            (Some(sc_name), column_name) => {
                let mut sc = SuperColumn::new(sc_name.clone(), self.comparator);
                match column_name {
                    Some(name) => sc.add_column(Column::tombstone(name.clone(), timestamp)),
                    None => sc.mark_for_delete_at(timestamp),
                }
                self.add(sc);
            }
            (None, Some(_)) if self.is_super() => {
                return Err(Status::invalid_argument(format!(
                    "{} is a super column family, path {} names no super column",
                    self.name, path
                )));
            }
            (None, Some(name)) => self.add(Column::tombstone(name.clone(), timestamp)),
        }
        Ok(())
    }

    /// A copy with every entry that no reader can observe any more removed.
    ///
    /// A column goes when it is a tombstone written at or before
    /// `gc_before`, or when a row or super column deletion marker at or after
    /// its timestamp shadows it. A super column goes when no children remain
    /// and its own marker is not newer than `gc_before`. Applying this twice
    /// gives the same result as applying it once.
    pub fn remove_deleted(&self, gc_before: i64) -> ColumnFamily {
        let mut out = self.clone_empty();
        let row_marker = self.marked_for_delete_at;

        for entry in &self.entries {
            match entry {
                ColumnEntry::Column(c) => {
                    if !is_purgeable(c, row_marker, gc_before) {
                        out.entries.push(entry.clone());
                    }
                }
                ColumnEntry::Super(sc) => {
                    let shadow = max_marker(sc.marked_for_delete_at(), row_marker);
                    let mut kept = sc.clone();
                    kept.retain(|c| !is_purgeable(c, shadow, gc_before));
                    let marker_live = sc.marked_for_delete_at().is_some_and(|m| m > gc_before);
                    if !kept.is_empty() || marker_live {
                        out.entries.push(ColumnEntry::Super(kept));
                    }
                }
            }
        }
        out
    }

    /// Approximate in-memory footprint.
    pub fn size(&self) -> usize {
        self.entries.iter().map(ColumnEntry::size).sum::<usize>() + 9
    }
}

fn is_purgeable(column: &Column, shadow: Option<i64>, gc_before: i64) -> bool {
    (column.is_tombstone() && column.timestamp() <= gc_before)
        || shadow.is_some_and(|marker| column.timestamp() <= marker)
}

fn max_marker(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

impl fmt::Debug for ColumnFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ColumnFamily({}:{}", self.table, self.name)?;
        if let Some(ts) = self.marked_for_delete_at {
            write!(f, " deleted@{ts}")?;
        }
        write!(f, " ")?;
        f.debug_list().entries(&self.entries).finish()?;
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard() -> ColumnFamily {
        ColumnFamily::new("Table1", "Standard1", ColumnType::Standard, ComparatorType::Name)
    }

    fn super_family() -> ColumnFamily {
        ColumnFamily::new("Table1", "Super1", ColumnType::Super, ComparatorType::Name)
    }

    fn names(cf: &ColumnFamily) -> Vec<String> {
        cf.iter().map(|e| e.name().to_string()).collect()
    }

    #[test]
    fn test_add_keeps_sorted_unique_names() {
        let mut cf = standard();
        cf.add(Column::new("col3", "v", 1));
        cf.add(Column::new("col1", "v", 1));
        cf.add(Column::new("col2", "old", 1));
        cf.add(Column::new("col2", "new", 2));
        assert_eq!(names(&cf), ["col1", "col2", "col3"]);
        assert_eq!(cf.get_column(b"col2").unwrap().value(), &Slice::from("new"));
    }

    #[test]
    fn test_merge() {
        let mut a = standard();
        a.add(Column::new("col1", "a", 1));
        let mut b = standard();
        b.add(Column::new("col1", "b", 2));
        b.add(Column::new("col2", "b", 2));
        b.delete(1);
        a.merge(b);
        assert_eq!(a.column_count(), 2);
        assert_eq!(a.get_column(b"col1").unwrap().value(), &Slice::from("b"));
        assert_eq!(a.marked_for_delete_at(), Some(1));
    }

    #[test]
    fn test_delete_marker_only_moves_forward() {
        let mut cf = standard();
        cf.delete(5);
        cf.delete(3);
        assert_eq!(cf.marked_for_delete_at(), Some(5));
    }

    #[test]
    fn test_paths_on_standard_family() {
        let mut cf = standard();
        cf.add_path(&QueryPath::column("Standard1", "col1"), "val1", 1).unwrap();
        cf.delete_path(&QueryPath::column("Standard1", "col2"), 2).unwrap();
        cf.delete_path(&QueryPath::new("Standard1"), 3).unwrap();
        assert_eq!(names(&cf), ["col1", "col2"]);
        assert!(cf.get(b"col2").unwrap().is_tombstone());
        assert_eq!(cf.marked_for_delete_at(), Some(3));

        let err = cf
            .add_path(&QueryPath::sub_column("Standard1", "sc1", "col1"), "v", 1)
            .unwrap_err();
        assert!(err.is_invalid_argument());
        let err = cf.add_path(&QueryPath::column("Other", "col1"), "v", 1).unwrap_err();
        assert!(err.is_invalid_argument());
        let err = cf.add_path(&QueryPath::new("Standard1"), "v", 1).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_paths_on_super_family() {
        let mut cf = super_family();
        cf.add_path(&QueryPath::sub_column("Super1", "sc1", "sub1"), "v1", 1).unwrap();
        cf.add_path(&QueryPath::sub_column("Super1", "sc1", "sub2"), "v2", 1).unwrap();
        cf.delete_path(&QueryPath::sub_column("Super1", "sc1", "sub1"), 2).unwrap();
        cf.delete_path(&QueryPath::super_column("Super1", "sc2"), 4).unwrap();

        let sc1 = cf.get_super_column(b"sc1").unwrap();
        assert_eq!(sc1.sub_column_count(), 2);
        assert!(sc1.get_sub_column(b"sub1").unwrap().is_tombstone());
        assert_eq!(cf.get_super_column(b"sc2").unwrap().marked_for_delete_at(), Some(4));

        let err = cf.add_path(&QueryPath::column("Super1", "col"), "v", 1).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_remove_deleted_purges_tombstones() {
        let mut cf = standard();
        cf.add(Column::tombstone("col4", 2));
        cf.add(Column::new("col5", "val5", 1));
        let purged = cf.remove_deleted(i64::MAX);
        assert_eq!(names(&purged), ["col5"]);
        // input untouched
        assert_eq!(cf.column_count(), 2);
    }

    #[test]
    fn test_remove_deleted_keeps_young_tombstones() {
        let mut cf = standard();
        cf.add(Column::tombstone("col4", 10));
        assert_eq!(cf.remove_deleted(9).column_count(), 1);
        assert_eq!(cf.remove_deleted(10).column_count(), 0);
    }

    #[test]
    fn test_remove_deleted_applies_row_marker() {
        let mut cf = standard();
        cf.add(Column::new("old", "v", 1));
        cf.add(Column::new("new", "v", 3));
        cf.delete(2);
        let purged = cf.remove_deleted(0);
        assert_eq!(names(&purged), ["new"]);
        assert_eq!(purged.marked_for_delete_at(), Some(2));
    }

    #[test]
    fn test_remove_deleted_super_columns() {
        let mut cf = super_family();
        // child shadowed by its super column marker
        let mut sc1 = SuperColumn::new("sc1", ComparatorType::Name);
        sc1.add_column(Column::new("a", "v", 1));
        sc1.add_column(Column::new("b", "v", 5));
        sc1.mark_for_delete_at(2);
        cf.add(sc1);
        // only child is a tombstone
        let mut sc2 = SuperColumn::new("sc2", ComparatorType::Name);
        sc2.add_column(Column::tombstone("a", 1));
        cf.add(sc2);
        // empty, but its marker is newer than gc_before
        let mut sc3 = SuperColumn::new("sc3", ComparatorType::Name);
        sc3.mark_for_delete_at(100);
        cf.add(sc3);

        let purged = cf.remove_deleted(50);
        assert_eq!(names(&purged), ["sc1", "sc3"]);
        let sc1 = purged.get_super_column(b"sc1").unwrap();
        assert_eq!(sc1.sub_column_count(), 1);
        assert!(sc1.get_sub_column(b"b").is_some());

        assert!(cf.remove_deleted(i64::MAX).get(b"sc3").is_none());
    }

    #[test]
    fn test_remove_deleted_is_idempotent() {
        let mut cf = super_family();
        let mut sc = SuperColumn::new("sc1", ComparatorType::Name);
        sc.add_column(Column::tombstone("a", 1));
        sc.add_column(Column::new("b", "v", 2));
        sc.mark_for_delete_at(1);
        cf.add(sc);
        cf.delete(0);

        let once = cf.remove_deleted(1);
        assert_eq!(once.remove_deleted(1), once);
    }

    #[test]
    fn test_map_super_columns_propagates_errors() {
        let mut cf = super_family();
        cf.add(SuperColumn::with_columns("sc1", ComparatorType::Name, [Column::new("a", "v", 1)]));
        cf.add(SuperColumn::with_columns("sc2", ComparatorType::Name, [Column::new("a", "v", 1)]));

        let mut seen = 0;
        let err = cf
            .map_super_columns(|sc| {
                seen += 1;
                if sc.name() == &Slice::from("sc1") {
                    Err(Status::corruption("bad child"))
                } else {
                    Ok(sc)
                }
            })
            .unwrap_err();
        assert!(err.is_corruption());
        assert_eq!(seen, 1);

        cf.map_super_columns(|mut sc| {
            sc.retain(|_| false);
            Ok(sc)
        })
        .unwrap();
        assert!(cf.iter().all(|e| e.sub_columns().is_empty()));
    }

    #[test]
    fn test_debug() {
        let mut cf = standard();
        cf.add(Column::new("col1", "val1", 1));
        cf.delete(0);
        assert_eq!(format!("{cf:?}"), "ColumnFamily(Table1:Standard1 deleted@0 [col1=val1@1])");
    }
}
