use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::BufMut;

use crate::compression::CompressionType;
use crate::filter::FilterPolicy;
use crate::table::block_builder::BlockBuilder;
use crate::table::format::{calculate_checksum, BlockHandle, Footer, DEFAULT_BLOCK_SIZE};
use crate::util::{Result, Slice, Status};

/// Knobs for writing one SSTable.
#[derive(Clone)]
pub struct TableBuilderOptions {
    pub block_size: usize,
    pub compression: CompressionType,
    pub filter_policy: Option<Arc<dyn FilterPolicy>>,
}

impl Default for TableBuilderOptions {
    fn default() -> Self {
        TableBuilderOptions {
            block_size: DEFAULT_BLOCK_SIZE,
            compression: CompressionType::Snappy,
            filter_policy: None,
        }
    }
}

/// Summary of a finished SSTable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableProperties {
    pub num_rows: u64,
    pub file_size: u64,
    pub smallest_key: Option<Slice>,
    pub largest_key: Option<Slice>,
}

/// Writes rows, in strictly increasing key order, into a new SSTable file.
pub struct TableBuilder {
    path: PathBuf,
    file: BufWriter<File>,
    options: TableBuilderOptions,
    offset: u64,
    data_block: BlockBuilder,
    index_block: BlockBuilder,
    row_keys: Vec<Vec<u8>>,
    smallest_key: Option<Slice>,
}

impl TableBuilder {
    pub fn create(path: impl AsRef<Path>, options: TableBuilderOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| {
            Status::storage_unavailable(format!("create {}: {}", path.display(), e))
        })?;
        Ok(TableBuilder {
            path,
            file: BufWriter::new(file),
            options,
            offset: 0,
            data_block: BlockBuilder::default(),
            // every index entry is a restart point: the index is searched, never scanned
            index_block: BlockBuilder::new(1),
            row_keys: Vec::new(),
            smallest_key: None,
        })
    }

    pub fn add(&mut self, row_key: &[u8], row: &[u8]) -> Result<()> {
        if let Some(last) = self.row_keys.last()
            && row_key <= last.as_slice()
        {
            return Err(Status::invalid_argument(format!(
                "row keys must be added in increasing order: {:?} after {:?}",
                Slice::copy_from(row_key),
                Slice::copy_from(last)
            )));
        }

        if self.smallest_key.is_none() {
            self.smallest_key = Some(Slice::copy_from(row_key));
        }
        self.row_keys.push(row_key.to_vec());
        self.data_block.add(row_key, row);

        if self.data_block.current_size_estimate() >= self.options.block_size {
            self.flush_data_block()?;
        }
        Ok(())
    }

    pub fn num_rows(&self) -> u64 {
        self.row_keys.len() as u64
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<BlockHandle> {
        self.file.write_all(data).map_err(|e| {
            Status::storage_unavailable(format!("write {}: {}", self.path.display(), e))
        })?;
        let handle = BlockHandle::new(self.offset, data.len() as u64);
        self.offset += data.len() as u64;
        Ok(handle)
    }

    fn flush_data_block(&mut self) -> Result<()> {
        if self.data_block.is_empty() {
            return Ok(());
        }
        let last_key = self.data_block.last_key().to_vec();
        let block = self.data_block.finish(self.options.compression)?;
        let handle = self.write_raw(&block)?;
        self.index_block.add(&last_key, &handle.encode());
        Ok(())
    }

    /// Write the remaining blocks and footer, then sync the file.
    pub fn finish(mut self) -> Result<TableProperties> {
        self.flush_data_block()?;

        let filter_handle = match self.options.filter_policy.clone() {
            Some(policy) => {
                let keys: Vec<&[u8]> = self.row_keys.iter().map(Vec::as_slice).collect();
                let mut filter = policy.create_filter(&keys);
                let crc = calculate_checksum(&[filter.as_slice()]);
                filter.put_u32_le(crc);
                self.write_raw(&filter)?
            }
            None => BlockHandle::default(),
        };

        let index = self.index_block.finish(CompressionType::None)?;
        let index_handle = self.write_raw(&index)?;

        let footer = Footer {
            filter_handle,
            index_handle,
        };
        self.write_raw(&footer.encode())?;

        let path = self.path.clone();
        let file = self
            .file
            .into_inner()
            .map_err(|e| Status::storage_unavailable(format!("flush {}: {}", path.display(), e)))?;
        file.sync_all()
            .map_err(|e| Status::storage_unavailable(format!("sync {}: {}", path.display(), e)))?;

        Ok(TableProperties {
            num_rows: self.row_keys.len() as u64,
            file_size: self.offset,
            smallest_key: self.smallest_key,
            largest_key: self.row_keys.last().map(|k| Slice::copy_from(k)),
        })
    }
}
