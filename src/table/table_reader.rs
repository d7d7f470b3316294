use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Buf;
use parking_lot::Mutex;

use crate::comparator::ComparatorType;
use crate::filter::FilterPolicy;
use crate::iterator::{RowSource, TableIterator};
use crate::query::QueryFilter;
use crate::table::block::Block;
use crate::table::format::{calculate_checksum, BlockHandle, Footer, FOOTER_SIZE};
use crate::table::row_format::SerializedRow;
use crate::util::{Result, Slice, Status};

/// Read-only view of one SSTable file.
///
/// The index and the membership filter are loaded at open; data blocks are
/// read from disk on every lookup. A reader is never mutated after open, so
/// it is shared between threads behind an `Arc`.
pub struct TableReader {
    path: PathBuf,
    file: Mutex<File>,
    file_size: u64,
    generation: u64,
    comparator: ComparatorType,
    index_block: Block,
    filter: Option<Vec<u8>>,
    filter_policy: Option<Arc<dyn FilterPolicy>>,
    force_filter_failures: AtomicBool,
}

impl TableReader {
    pub fn open(
        path: impl AsRef<Path>,
        generation: u64,
        comparator: ComparatorType,
        filter_policy: Option<Arc<dyn FilterPolicy>>,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path).map_err(|e| {
            Status::storage_unavailable(format!("open {}: {}", path.display(), e))
        })?;
        let file_size = file
            .metadata()
            .map_err(|e| Status::storage_unavailable(format!("stat {}: {}", path.display(), e)))?
            .len();
        if file_size < FOOTER_SIZE as u64 {
            return Err(Status::corruption(format!(
                "{} is too small to be an sstable",
                path.display()
            )));
        }

        let mut footer = [0u8; FOOTER_SIZE];
        read_at(&mut file, &path, file_size - FOOTER_SIZE as u64, &mut footer)?;
        let footer = Footer::decode(&footer)?;

        footer.index_handle.check_within(file_size)?;
        let index_block = Block::decode(&read_handle(&mut file, &path, footer.index_handle)?)?;

        // a table written without a filter, or opened without a policy,
        // answers "maybe" for every row
        let filter = match (&filter_policy, footer.filter_handle.is_null()) {
            (Some(_), false) => {
                footer.filter_handle.check_within(file_size)?;
                let raw = read_handle(&mut file, &path, footer.filter_handle)?;
                Some(verify_filter(raw)?)
            }
            _ => None,
        };

        Ok(TableReader {
            path,
            file: Mutex::new(file),
            file_size,
            generation,
            comparator,
            index_block,
            filter,
            filter_policy,
            force_filter_failures: AtomicBool::new(false),
        })
    }

    /// False only if the row is definitely not in this table.
    pub fn might_contain(&self, row_key: &[u8]) -> bool {
        if self.force_filter_failures.load(Ordering::Relaxed) {
            return true;
        }
        match (&self.filter, &self.filter_policy) {
            (Some(filter), Some(policy)) => policy.may_contain(filter, row_key),
            _ => true,
        }
    }

    /// Make `might_contain` answer true for every row, as if the filter
    /// produced nothing but false positives.
    pub fn force_filter_failures(&self) {
        self.force_filter_failures.store(true, Ordering::Relaxed);
    }

    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    /// The serialized row stored under `row_key`.
    pub fn get_row(&self, row_key: &Slice) -> Result<Option<SerializedRow>> {
        let Some((_, handle)) = self.index_block.seek(row_key.data())? else {
            return Ok(None);
        };
        let handle = BlockHandle::decode(handle.data())?;
        handle.check_within(self.file_size)?;

        let raw = {
            let mut file = self.file.lock();
            read_handle(&mut file, &self.path, handle)?
        };
        let block = Block::decode(&raw)?;
        block
            .get(row_key.data())?
            .map(|row| SerializedRow::parse(row, self.comparator))
            .transpose()
    }

    /// The entries of the row selected by `filter`, decoded lazily in filter
    /// order.
    pub fn read_range(&self, row_key: &Slice, filter: &QueryFilter) -> Result<Option<RowSource>> {
        let Some(row) = self.get_row(row_key)? else {
            return Ok(None);
        };
        let selection = filter.select(row.len(), self.comparator.comparator(), |i| row.name_at(i))?;
        Ok(Some(RowSource::new(
            row.marked_for_delete_at(),
            TableIterator::new(row, selection),
        )))
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }
}

impl std::fmt::Debug for TableReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableReader")
            .field("path", &self.path)
            .field("generation", &self.generation)
            .field("file_size", &self.file_size)
            .finish()
    }
}

fn read_at(file: &mut File, path: &Path, offset: u64, buf: &mut [u8]) -> Result<()> {
    file.seek(SeekFrom::Start(offset))
        .and_then(|_| file.read_exact(buf))
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => {
                Status::corruption(format!("{} truncated at {}", path.display(), offset))
            }
            _ => Status::storage_unavailable(format!("read {}: {}", path.display(), e)),
        })
}

fn read_handle(file: &mut File, path: &Path, handle: BlockHandle) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; handle.size as usize];
    read_at(file, path, handle.offset, &mut buf)?;
    Ok(buf)
}

fn verify_filter(mut raw: Vec<u8>) -> Result<Vec<u8>> {
    if raw.len() < 4 {
        return Err(Status::corruption("filter block shorter than its checksum"));
    }
    let expected = (&raw[raw.len() - 4..]).get_u32_le();
    raw.truncate(raw.len() - 4);
    if calculate_checksum(&[raw.as_slice()]) != expected {
        return Err(Status::corruption("filter block checksum mismatch"));
    }
    Ok(raw)
}
