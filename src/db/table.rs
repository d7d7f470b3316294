use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::column_family::{ColumnFamily, ColumnFamilyDescriptor, ColumnFamilySet, ColumnFamilyStore};
use crate::db::{Row, RowMutation};
use crate::query::{QueryFilter, QueryPath};
use crate::statistics::Statistics;
use crate::util::{Result, Slice, Status};

#[derive(Debug, Clone)]
pub struct TableOptions {
    pub create_if_missing: bool,
    pub error_if_exists: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        TableOptions {
            create_if_missing: true,
            error_if_exists: false,
        }
    }
}

/// A named set of column families stored under one directory.
pub struct Table {
    name: String,
    dir: PathBuf,
    column_families: ColumnFamilySet,
    statistics: Arc<Statistics>,
}

impl Table {
    pub fn open(
        dir: impl AsRef<Path>,
        name: impl Into<String>,
        options: TableOptions,
        descriptors: Vec<ColumnFamilyDescriptor>,
    ) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let name = name.into();

        if dir.exists() {
            if options.error_if_exists {
                return Err(Status::invalid_argument(format!(
                    "table directory {} already exists",
                    dir.display()
                )));
            }
        } else if options.create_if_missing {
            fs::create_dir_all(&dir)?;
        } else {
            return Err(Status::invalid_argument(format!(
                "table directory {} does not exist",
                dir.display()
            )));
        }

        if descriptors.is_empty() {
            return Err(Status::invalid_argument(format!(
                "table {name} needs at least one column family"
            )));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = descriptors.iter().find(|d| !seen.insert(d.name.as_str())) {
            return Err(Status::invalid_argument(format!(
                "column family {} listed twice",
                dup.name
            )));
        }

        let statistics = Arc::new(Statistics::new());
        let column_families = ColumnFamilySet::new();
        for descriptor in descriptors {
            let store =
                ColumnFamilyStore::open(name.clone(), &dir, descriptor, Arc::clone(&statistics))?;
            column_families.insert(store)?;
        }

        info!(
            table = %name,
            dir = %dir.display(),
            column_families = column_families.len(),
            "opened table"
        );

        Ok(Table {
            name,
            dir,
            column_families,
            statistics,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn column_family_store(&self, family: &str) -> Result<Arc<ColumnFamilyStore>> {
        self.column_families.get_or_err(family)
    }

    /// Family names in sorted order.
    pub fn list_column_families(&self) -> Vec<String> {
        self.column_families.names()
    }

    pub fn statistics(&self) -> &Arc<Statistics> {
        &self.statistics
    }

    /// Apply every family of `mutation` to its store. Unknown families and
    /// entries of the wrong kind are rejected before anything is written.
    pub fn apply(&self, mutation: &RowMutation) -> Result<()> {
        if mutation.table_name() != self.name {
            return Err(Status::invalid_argument(format!(
                "mutation for table {} applied to {}",
                mutation.table_name(),
                self.name
            )));
        }
        let targets = mutation
            .column_families()
            .map(|cf| self.column_family_store(cf.name()).map(|store| (store, cf)))
            .collect::<Result<Vec<_>>>()?;
        for (store, cf) in &targets {
            store.validate(cf)?;
        }
        for (store, cf) in targets {
            store.apply(mutation.key(), cf.clone())?;
        }
        Ok(())
    }

    /// See [`ColumnFamilyStore::get_column_family`].
    pub fn get_column_family(
        &self,
        row_key: &Slice,
        path: &QueryPath,
        filter: &QueryFilter,
    ) -> Result<Option<ColumnFamily>> {
        self.column_family_store(&path.column_family)?
            .get_column_family(row_key, path, filter)
    }

    /// Every family's data for `row_key`, tombstones included.
    pub fn get_row(&self, row_key: &Slice) -> Result<Row> {
        let mut row = Row::new(row_key.clone());
        for store in self.column_families.stores() {
            if let Some(cf) = store.get_row(row_key)? {
                row.add_column_family(cf);
            }
        }
        Ok(row)
    }

    pub fn flush_all(&self) -> Result<()> {
        for store in self.column_families.stores() {
            store.flush()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("dir", &self.dir)
            .field("column_families", &self.column_families.names())
            .finish()
    }
}
