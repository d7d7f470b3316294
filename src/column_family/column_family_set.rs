use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::column_family::ColumnFamilyStore;
use crate::util::{Result, Status};

/// The column family stores of one table, by name.
///
/// # Thread Safety
///
/// Lookups take the read lock; registering a store takes the write lock.
/// Stores are handed out as `Arc`s, so a caller keeps using a store without
/// holding any lock on the set.
#[derive(Default)]
pub struct ColumnFamilySet {
    stores: RwLock<HashMap<String, Arc<ColumnFamilyStore>>>,
}

impl ColumnFamilySet {
    pub fn new() -> Self {
        ColumnFamilySet::default()
    }

    pub fn insert(&self, store: ColumnFamilyStore) -> Result<Arc<ColumnFamilyStore>> {
        let mut stores = self.stores.write();
        if stores.contains_key(store.name()) {
            return Err(Status::invalid_argument(format!(
                "column family {} already exists",
                store.name()
            )));
        }
        let store = Arc::new(store);
        stores.insert(store.name().to_string(), Arc::clone(&store));
        Ok(store)
    }

    pub fn get(&self, name: &str) -> Option<Arc<ColumnFamilyStore>> {
        self.stores.read().get(name).cloned()
    }

    /// Like `get`, but an unknown name is an error.
    pub fn get_or_err(&self, name: &str) -> Result<Arc<ColumnFamilyStore>> {
        self.get(name)
            .ok_or_else(|| Status::invalid_argument(format!("unknown column family {name}")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stores.read().contains_key(name)
    }

    /// Family names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stores.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// All stores, ordered by name.
    pub fn stores(&self) -> Vec<Arc<ColumnFamilyStore>> {
        let mut stores: Vec<_> = self.stores.read().values().cloned().collect();
        stores.sort_by(|a, b| a.name().cmp(b.name()));
        stores
    }

    pub fn len(&self) -> usize {
        self.stores.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column_family::ColumnFamilyDescriptor;
    use crate::statistics::Statistics;
    use tempfile::TempDir;

    fn store(dir: &TempDir, descriptor: ColumnFamilyDescriptor) -> ColumnFamilyStore {
        ColumnFamilyStore::open("Table1", dir.path(), descriptor, Arc::new(Statistics::new()))
            .unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let dir = TempDir::new().unwrap();
        let set = ColumnFamilySet::new();
        assert!(set.is_empty());

        set.insert(store(&dir, ColumnFamilyDescriptor::super_column("Super1")))
            .unwrap();
        set.insert(store(&dir, ColumnFamilyDescriptor::standard("Standard1")))
            .unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.names(), ["Standard1", "Super1"]);
        assert!(set.get("Super1").unwrap().is_super());
        assert!(set.contains("Standard1"));
        assert!(set.get("Standard2").is_none());
        assert!(set.get_or_err("Standard2").unwrap_err().is_invalid_argument());
        let names: Vec<_> = set.stores().iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, ["Standard1", "Super1"]);
    }

    #[test]
    fn test_duplicate_name() {
        let dir = TempDir::new().unwrap();
        let set = ColumnFamilySet::new();
        set.insert(store(&dir, ColumnFamilyDescriptor::standard("Standard1")))
            .unwrap();
        let err = set
            .insert(store(&dir, ColumnFamilyDescriptor::standard("Standard1")))
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
