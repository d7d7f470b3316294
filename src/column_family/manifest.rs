use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::column_family::ColumnFamilyOptions;
use crate::util::Result;

/// The durable state of one column family store: its options and the
/// SSTables it serves reads from, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub family: String,
    pub options: ColumnFamilyOptions,
    pub sstables: Vec<u64>,
    pub next_generation: u64,
}

impl Manifest {
    pub fn new(family: impl Into<String>, options: ColumnFamilyOptions) -> Self {
        Manifest {
            family: family.into(),
            options,
            sstables: Vec::new(),
            next_generation: 1,
        }
    }

    pub fn file_path(dir: &Path, family: &str) -> PathBuf {
        dir.join(format!("{family}-manifest.json"))
    }

    /// `None` when the family has never been flushed in `dir`.
    pub fn load(dir: &Path, family: &str) -> Result<Option<Self>> {
        let path = Self::file_path(dir, family);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let manifest: Manifest = serde_json::from_str(&content)?;
        Ok(Some(manifest))
    }

    /// Replace the manifest on disk atomically: write a temporary file, sync
    /// it, then rename it over the old one.
    pub fn save(&self, dir: &Path) -> Result<()> {
        let path = Self::file_path(dir, &self.family);
        let tmp = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(&tmp)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

pub fn sstable_path(dir: &Path, family: &str, generation: u64) -> PathBuf {
    dir.join(format!("{family}-{generation}-Data.db"))
}
