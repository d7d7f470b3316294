use serde::{Deserialize, Serialize};

use crate::column_family::ColumnFamilyOptions;

/// Name and options of a column family, used when opening a table.
///
/// # Example
///
/// ```ignore
/// use widecol::{ColumnFamilyDescriptor, Table, TableOptions};
///
/// let table = Table::open(
///     "data/Table1",
///     "Table1",
///     TableOptions::default(),
///     vec![
///         ColumnFamilyDescriptor::standard("Standard1"),
///         ColumnFamilyDescriptor::super_column("Super1"),
///     ],
/// )?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFamilyDescriptor {
    pub name: String,
    pub options: ColumnFamilyOptions,
}

impl ColumnFamilyDescriptor {
    pub fn new<S: Into<String>>(name: S, options: ColumnFamilyOptions) -> Self {
        ColumnFamilyDescriptor {
            name: name.into(),
            options,
        }
    }

    pub fn standard<S: Into<String>>(name: S) -> Self {
        Self::new(name, ColumnFamilyOptions::standard())
    }

    pub fn super_column<S: Into<String>>(name: S) -> Self {
        Self::new(name, ColumnFamilyOptions::super_column())
    }
}
