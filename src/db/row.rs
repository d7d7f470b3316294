use std::collections::BTreeMap;
use std::fmt;

use crate::column_family::ColumnFamily;
use crate::util::Slice;

/// One row key with its data in each column family that has any.
#[derive(Clone, PartialEq, Eq)]
pub struct Row {
    key: Slice,
    column_families: BTreeMap<String, ColumnFamily>,
}

impl Row {
    pub fn new(key: impl Into<Slice>) -> Self {
        Row {
            key: key.into(),
            column_families: BTreeMap::new(),
        }
    }

    pub fn key(&self) -> &Slice {
        &self.key
    }

    /// Add `cf`, merging it into the family already present under its name.
    pub fn add_column_family(&mut self, cf: ColumnFamily) {
        match self.column_families.get_mut(cf.name()) {
            Some(existing) => existing.merge(cf),
            None => {
                self.column_families.insert(cf.name().to_string(), cf);
            }
        }
    }

    pub fn get_column_family(&self, name: &str) -> Option<&ColumnFamily> {
        self.column_families.get(name)
    }

    /// Families ordered by name.
    pub fn column_families(&self) -> impl Iterator<Item = &ColumnFamily> {
        self.column_families.values()
    }

    pub fn column_family_names(&self) -> Vec<&str> {
        self.column_families.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.column_families.is_empty()
    }

    /// The row with every family purged by `ColumnFamily::remove_deleted`;
    /// families left with nothing are dropped.
    pub fn remove_deleted(&self, gc_before: i64) -> Row {
        let mut out = Row::new(self.key.clone());
        for cf in self.column_families.values() {
            let cf = cf.remove_deleted(gc_before);
            if !cf.is_empty() {
                out.add_column_family(cf);
            }
        }
        out
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row({:?}", self.key)?;
        for cf in self.column_families.values() {
            write!(f, " {:?}", cf)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::column_family::ColumnType;
    use crate::comparator::ComparatorType;

    fn cf(name: &str, columns: &[(&str, i64)]) -> ColumnFamily {
        let mut cf = ColumnFamily::new("Table1", name, ColumnType::Standard, ComparatorType::Name);
        for (col, ts) in columns {
            cf.add(Column::new(*col, "v", *ts));
        }
        cf
    }

    #[test]
    fn test_add_merges_same_family() {
        let mut row = Row::new("key1");
        row.add_column_family(cf("Standard1", &[("col1", 1)]));
        row.add_column_family(cf("Standard1", &[("col1", 2), ("col2", 1)]));
        row.add_column_family(cf("Standard2", &[("col1", 1)]));

        assert_eq!(row.column_family_names(), ["Standard1", "Standard2"]);
        let merged = row.get_column_family("Standard1").unwrap();
        assert_eq!(merged.column_count(), 2);
        assert_eq!(merged.get(b"col1").unwrap().timestamp(), 2);
    }

    #[test]
    fn test_remove_deleted_drops_empty_families() {
        let mut row = Row::new("key1");
        let mut deleted = cf("Standard1", &[("col1", 1)]);
        deleted.delete(5);
        row.add_column_family(deleted);
        row.add_column_family(cf("Standard2", &[("col1", 1)]));

        let live = row.remove_deleted(i64::MAX);
        assert_eq!(live.column_family_names(), ["Standard2"]);
        assert_eq!(live.key(), &Slice::from("key1"));
    }
}
