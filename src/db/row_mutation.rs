use std::collections::BTreeMap;

use crate::column_family::{ColumnFamily, ColumnType};
use crate::comparator::ComparatorType;
use crate::db::Table;
use crate::query::QueryPath;
use crate::util::{Result, Slice, Status};

/// A batch of writes and deletions to one row of one table, grouped by
/// column family.
///
/// # Example
///
/// ```ignore
/// use widecol::{QueryPath, RowMutation};
///
/// let mut rm = RowMutation::new("Table1", "key1");
/// rm.add(&QueryPath::column("Standard1", "col1"), "val1", 1)?;
/// rm.add(&QueryPath::sub_column("Super1", "sc1", "sub1"), "val1", 1)?;
/// rm.delete(&QueryPath::column("Standard1", "col2"), 2)?;
/// rm.apply(&table)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMutation {
    table: String,
    key: Slice,
    modifications: BTreeMap<String, ColumnFamily>,
}

impl RowMutation {
    pub fn new(table: impl Into<String>, key: impl Into<Slice>) -> Self {
        RowMutation {
            table: table.into(),
            key: key.into(),
            modifications: BTreeMap::new(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn key(&self) -> &Slice {
        &self.key
    }

    /// Modified families ordered by name.
    pub fn column_families(&self) -> impl Iterator<Item = &ColumnFamily> {
        self.modifications.values()
    }

    pub fn is_empty(&self) -> bool {
        self.modifications.is_empty()
    }

    /// The pending modification of `family`, created with `column_type` if
    /// there is none yet.
    ///
    /// A modification that so far only deletes the whole row carries no
    /// entries, so it takes whichever type a later write needs.
    fn family_mut(&mut self, family: &str, column_type: Option<ColumnType>) -> Result<&mut ColumnFamily> {
        let table = self.table.clone();
        let cf = self
            .modifications
            .entry(family.to_string())
            .or_insert_with(|| {
                ColumnFamily::new(
                    table,
                    family,
                    column_type.unwrap_or_default(),
                    ComparatorType::default(),
                )
            });

        if let Some(column_type) = column_type
            && cf.column_type() != column_type
        {
            if !cf.is_empty() {
                return Err(Status::invalid_argument(format!(
                    "{} is modified both as a standard and as a super column family",
                    family
                )));
            }
            let mut retyped =
                ColumnFamily::new(self.table.clone(), family, column_type, cf.comparator_type());
            if let Some(ts) = cf.marked_for_delete_at() {
                retyped.delete(ts);
            }
            *cf = retyped;
        }
        Ok(cf)
    }

    fn column_type_of(path: &QueryPath) -> Option<ColumnType> {
        match (&path.super_column_name, &path.column_name) {
            (Some(_), _) => Some(ColumnType::Super),
            (None, Some(_)) => Some(ColumnType::Standard),
            (None, None) => None,
        }
    }

    /// Write `value` to the column or sub-column `path` names.
    pub fn add(&mut self, path: &QueryPath, value: impl Into<Slice>, timestamp: i64) -> Result<()> {
        let cf = self.family_mut(&path.column_family, Self::column_type_of(path))?;
        cf.add_path(path, value, timestamp)
    }

    /// Delete what `path` names: a column or sub-column (tombstone), a super
    /// column, or, when the path names only the family, the whole row.
    pub fn delete(&mut self, path: &QueryPath, timestamp: i64) -> Result<()> {
        let cf = self.family_mut(&path.column_family, Self::column_type_of(path))?;
        cf.delete_path(path, timestamp)
    }

    /// Fold a prepared family into this mutation.
    pub fn add_column_family(&mut self, cf: ColumnFamily) -> Result<()> {
        if cf.table_name() != self.table {
            return Err(Status::invalid_argument(format!(
                "column family of table {} added to a mutation of table {}",
                cf.table_name(),
                self.table
            )));
        }
        let column_type = (!cf.is_empty()).then_some(cf.column_type());
        let existing = self.family_mut(cf.name(), column_type)?;
        existing.merge(cf);
        Ok(())
    }

    pub fn apply(&self, table: &Table) -> Result<()> {
        table.apply(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_by_family() {
        let mut rm = RowMutation::new("Table1", "key1");
        rm.add(&QueryPath::column("Standard1", "col1"), "val1", 1).unwrap();
        rm.add(&QueryPath::column("Standard1", "col2"), "val2", 1).unwrap();
        rm.add(&QueryPath::sub_column("Super1", "sc1", "sub1"), "val1", 1)
            .unwrap();

        let families: Vec<_> = rm.column_families().map(|cf| cf.name().to_string()).collect();
        assert_eq!(families, ["Standard1", "Super1"]);
        let standard = rm.column_families().next().unwrap();
        assert_eq!(standard.column_count(), 2);
        assert!(!standard.is_super());
        assert!(rm.column_families().nth(1).unwrap().is_super());
    }

    #[test]
    fn test_row_deletion_then_super_write() {
        let mut rm = RowMutation::new("Table1", "key1");
        rm.delete(&QueryPath::new("Super1"), 3).unwrap();
        rm.add(&QueryPath::sub_column("Super1", "sc1", "sub1"), "v", 4)
            .unwrap();

        let cf = rm.column_families().next().unwrap();
        assert!(cf.is_super());
        assert_eq!(cf.marked_for_delete_at(), Some(3));
        assert_eq!(cf.column_count(), 1);
    }

    #[test]
    fn test_mixed_kinds_rejected() {
        let mut rm = RowMutation::new("Table1", "key1");
        rm.add(&QueryPath::column("Standard1", "col1"), "v", 1).unwrap();
        let err = rm
            .add(&QueryPath::sub_column("Standard1", "sc1", "sub1"), "v", 1)
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_delete_paths() {
        let mut rm = RowMutation::new("Table1", "key1");
        rm.delete(&QueryPath::column("Standard1", "col1"), 2).unwrap();
        rm.delete(&QueryPath::super_column("Super1", "sc1"), 2).unwrap();

        let mut families = rm.column_families();
        let standard = families.next().unwrap();
        assert!(standard.get(b"col1").unwrap().is_tombstone());
        let sc = families.next().unwrap().get_super_column(b"sc1").unwrap();
        assert_eq!(sc.marked_for_delete_at(), Some(2));
    }

    #[test]
    fn test_add_column_family() {
        let mut rm = RowMutation::new("Table1", "key1");
        let mut cf = ColumnFamily::new("Table1", "Standard1", ColumnType::Standard, ComparatorType::Name);
        cf.add(crate::column::Column::new("col1", "v", 1));
        rm.add_column_family(cf.clone()).unwrap();
        rm.add_column_family(cf).unwrap();
        assert_eq!(rm.column_families().next().unwrap().column_count(), 1);

        let other = ColumnFamily::new("Table2", "Standard1", ColumnType::Standard, ComparatorType::Name);
        assert!(rm.add_column_family(other).unwrap_err().is_invalid_argument());
    }
}
