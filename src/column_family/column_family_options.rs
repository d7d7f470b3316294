use std::fmt;

use serde::{Deserialize, Serialize};

use crate::comparator::ComparatorType;
use crate::compression::CompressionType;
use crate::table::format::DEFAULT_BLOCK_SIZE;

/// Whether rows of a family hold plain columns or super columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColumnType {
    #[default]
    Standard,
    Super,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Standard => write!(f, "Standard"),
            ColumnType::Super => write!(f, "Super"),
        }
    }
}

/// Options for one column family.
///
/// # Example
///
/// ```ignore
/// use widecol::{ColumnFamilyOptions, ColumnType, CompressionType};
///
/// let options = ColumnFamilyOptions {
///     column_type: ColumnType::Super,
///     write_buffer_size: 8 * 1024 * 1024,
///     compression_type: CompressionType::Lz4,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnFamilyOptions {
    pub column_type: ColumnType,

    /// Orders column names (and sub-column names) within a row.
    pub comparator_type: ComparatorType,

    /// Approximate memtable size in bytes that triggers a flush to an SSTable.
    /// Default: 4MB
    pub write_buffer_size: usize,

    /// Compression type for SSTable blocks
    /// Default: Snappy
    pub compression_type: CompressionType,

    /// Bits per row key for the SSTable bloom filter (None = no filter).
    /// Default: Some(10), ~1% false positive rate
    pub filter_bits_per_key: Option<usize>,

    /// Target uncompressed size of an SSTable data block.
    pub block_size: usize,
}

impl ColumnFamilyOptions {
    pub fn standard() -> Self {
        ColumnFamilyOptions::default()
    }

    pub fn super_column() -> Self {
        ColumnFamilyOptions {
            column_type: ColumnType::Super,
            ..Default::default()
        }
    }
}

impl Default for ColumnFamilyOptions {
    fn default() -> Self {
        ColumnFamilyOptions {
            column_type: ColumnType::Standard,
            comparator_type: ComparatorType::Name,
            write_buffer_size: 4 * 1024 * 1024,
            compression_type: CompressionType::Snappy,
            filter_bits_per_key: Some(10),
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}
