use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::column::ColumnEntry;
use crate::column_family::manifest::{sstable_path, Manifest};
use crate::column_family::{ColumnFamily, ColumnFamilyDescriptor, ColumnFamilyOptions, ColumnType};
use crate::filter::{BloomFilterPolicy, FilterPolicy};
use crate::iterator::{MergingIterator, RowSource};
use crate::memtable::MemTable;
use crate::query::{QueryFilter, QueryPath};
use crate::statistics::Statistics;
use crate::table::{encode_row, TableBuilder, TableBuilderOptions, TableProperties, TableReader};
use crate::util::{Result, Slice, Status};

/// Everything a read can see, as of one instant.
///
/// A view is never modified once published; writers to the store's state
/// build a new view and swap it in.
struct StoreView {
    memtable: Arc<MemTable>,
    /// Memtables handed to a flush that has not yet published its SSTable.
    flushing: Vec<Arc<MemTable>>,
    /// Oldest first.
    sstables: Vec<Arc<TableReader>>,
}

/// One column family of one table: a memtable plus the SSTables it has been
/// flushed to, with the read path that merges them.
///
/// # Reads
///
/// ```text
/// get_column_family(row, path, filter)
///     ├─→ snapshot the current StoreView
///     ├─→ memtable + flushing memtables: read_range
///     ├─→ SSTables: might_contain → read_range (in parallel when several)
///     ├─→ MergingIterator (reconcile equal names) → take(count)
///     └─→ trim super column children when the path names a super column
/// ```
///
/// # Flush
///
/// 1. Under the view write lock, move the memtable to `flushing` and install
///    an empty one.
/// 2. Without the lock, write the flushing memtable to a new SSTable.
/// 3. Record the SSTable in the manifest, then under the view write lock
///    replace the flushing memtable by the SSTable.
///
/// Every published view holds each flushed row exactly once, either in a
/// memtable or in an SSTable. Writers insert while holding the view read
/// lock, so step 1 waits for inserts already in progress.
pub struct ColumnFamilyStore {
    table_name: String,
    name: String,
    dir: PathBuf,
    options: ColumnFamilyOptions,
    filter_policy: Option<Arc<dyn FilterPolicy>>,
    view: RwLock<Arc<StoreView>>,
    /// Also serializes flushes.
    manifest: Mutex<Manifest>,
    stats: Arc<Statistics>,
}

impl ColumnFamilyStore {
    /// Open the store, loading any SSTables a previous flush left in `dir`.
    pub fn open(
        table_name: impl Into<String>,
        dir: impl AsRef<Path>,
        descriptor: ColumnFamilyDescriptor,
        stats: Arc<Statistics>,
    ) -> Result<Self> {
        let table_name = table_name.into();
        let dir = dir.as_ref().to_path_buf();
        let ColumnFamilyDescriptor { name, options } = descriptor;
        fs::create_dir_all(&dir)?;

        let manifest = match Manifest::load(&dir, &name)? {
            Some(mut manifest) => {
                if manifest.options.column_type != options.column_type
                    || manifest.options.comparator_type != options.comparator_type
                {
                    return Err(Status::invalid_argument(format!(
                        "{} was created as a {} family with {} names, opened as {} with {}",
                        name,
                        manifest.options.column_type,
                        manifest.options.comparator_type,
                        options.column_type,
                        options.comparator_type
                    )));
                }
                manifest.options = options.clone();
                manifest
            }
            None => Manifest::new(name.clone(), options.clone()),
        };

        let filter_policy = options
            .filter_bits_per_key
            .map(|bits| Arc::new(BloomFilterPolicy::new(bits)) as Arc<dyn FilterPolicy>);

        let sstables = manifest
            .sstables
            .iter()
            .map(|&generation| {
                TableReader::open(
                    sstable_path(&dir, &name, generation),
                    generation,
                    options.comparator_type,
                    filter_policy.clone(),
                )
                .map(Arc::new)
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            table = %table_name,
            family = %name,
            column_type = %options.column_type,
            sstables = sstables.len(),
            "opened column family store"
        );

        let memtable = Arc::new(MemTable::new(
            table_name.clone(),
            name.clone(),
            options.column_type,
            options.comparator_type,
        ));

        Ok(ColumnFamilyStore {
            table_name,
            name,
            dir,
            options,
            filter_policy,
            view: RwLock::new(Arc::new(StoreView {
                memtable,
                flushing: Vec::new(),
                sstables,
            })),
            manifest: Mutex::new(manifest),
            stats,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn options(&self) -> &ColumnFamilyOptions {
        &self.options
    }

    pub fn column_type(&self) -> ColumnType {
        self.options.column_type
    }

    pub fn is_super(&self) -> bool {
        self.options.column_type == ColumnType::Super
    }

    fn snapshot(&self) -> Arc<StoreView> {
        self.view.read().clone()
    }

    /// The SSTables reads currently consult, oldest first.
    pub fn sstables(&self) -> Vec<Arc<TableReader>> {
        self.snapshot().sstables.clone()
    }

    /// Approximate bytes held by the active memtable.
    pub fn memtable_size(&self) -> usize {
        self.snapshot().memtable.approximate_memory_usage()
    }

    fn empty_column_family(&self) -> ColumnFamily {
        ColumnFamily::new(
            self.table_name.clone(),
            self.name.clone(),
            self.options.column_type,
            self.options.comparator_type,
        )
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

    fn check_entry(&self, entry: &ColumnEntry) -> Result<()> {
        if entry.is_super() != self.is_super() {
            return Err(Status::invalid_argument(format!(
                "{:?} does not belong in {} family {}",
                entry,
                self.column_type(),
                self.name
            )));
        }
        Ok(())
    }

    // Write path

    /// Insert one top-level entry into `row_key`, reconciling with what the
    /// memtable already holds under that name.
    pub fn insert_or_merge(&self, row_key: &Slice, entry: impl Into<ColumnEntry>) -> Result<()> {
        let entry = entry.into();
        self.check_entry(&entry)?;
        {
            let view = self.view.read();
            view.memtable.insert_or_merge(row_key, entry);
        }
        self.stats.record_write(1);
        self.maybe_flush();
        Ok(())
    }

    /// Check that `cf` can be applied to this store: it must name this
    /// family and hold only entries of the family's kind.
    pub fn validate(&self, cf: &ColumnFamily) -> Result<()> {
        if cf.name() != self.name {
            return Err(Status::invalid_argument(format!(
                "mutation for column family {} applied to {}",
                cf.name(),
                self.name
            )));
        }
        // the container may be typed either way when it only carries a marker
        cf.entries().iter().try_for_each(|entry| self.check_entry(entry))
    }

    /// Apply every entry and the deletion marker of `cf` to `row_key`.
    ///
    /// Once validation passes the write is in the memtable and this returns
    /// `Ok`, even if the flush it triggers fails; that memtable stays
    /// readable and the next flush retries it.
    pub fn apply(&self, row_key: &Slice, cf: ColumnFamily) -> Result<()> {
        self.validate(&cf)?;
        let columns = cf.column_count() as u64;
        {
            let view = self.view.read();
            view.memtable.apply(row_key, cf);
        }
        self.stats.record_write(columns);
        self.maybe_flush();
        Ok(())
    }

    /// Delete whatever `path` addresses in `row_key` at `timestamp`.
    pub fn delete(&self, row_key: &Slice, path: &QueryPath, timestamp: i64) -> Result<()> {
        self.check_path(path)?;
        let mut cf = self.empty_column_family();
        cf.delete_path(path, timestamp)?;
        self.apply(row_key, cf)
    }

    // Read path

    /// Read the part of `row_key` that `filter` selects.
    ///
    /// When `path` names a super column, only that super column is read and
    /// `filter` picks its children; otherwise `filter` picks top-level
    /// entries. Tombstones and deletion markers are part of the result: pass
    /// it to [`ColumnFamilyStore::remove_deleted`] to drop what they shadow.
    /// Returns `None` when nothing matches.
    pub fn get_column_family(
        &self,
        row_key: &Slice,
        path: &QueryPath,
        filter: &QueryFilter,
    ) -> Result<Option<ColumnFamily>> {
        self.check_path(path)?;
        let result = self.read(row_key, path, filter);
        match &result {
            Ok(cf) => self
                .stats
                .record_read(cf.as_ref().map_or(0, |cf| cf.column_count() as u64)),
            Err(e) => {
                self.stats.record_error();
                warn!(family = %self.name, row = ?row_key, error = %e, "read failed");
            }
        }
        result
    }

    /// `get_column_family` with a slice filter.
    pub fn get_column_family_slice(
        &self,
        row_key: &Slice,
        path: &QueryPath,
        start: impl Into<Slice>,
        finish: impl Into<Slice>,
        reversed: bool,
        count: usize,
    ) -> Result<Option<ColumnFamily>> {
        let filter = QueryFilter::slice(start, finish, reversed, count);
        self.get_column_family(row_key, path, &filter)
    }

    /// The whole row as currently stored.
    pub fn get_row(&self, row_key: &Slice) -> Result<Option<ColumnFamily>> {
        self.get_column_family(row_key, &QueryPath::new(self.name.clone()), &QueryFilter::Identity)
    }

    fn read(
        &self,
        row_key: &Slice,
        path: &QueryPath,
        filter: &QueryFilter,
    ) -> Result<Option<ColumnFamily>> {
        let comparator = self.options.comparator_type.comparator();
        if filter.is_inverted(comparator) {
            return Ok(None);
        }

        let super_column = path.super_column_name.clone();
        let top_filter = match &super_column {
            Some(name) => QueryFilter::names([name.clone()]),
            None => filter.clone(),
        };

        let view = self.snapshot();
        let mut sources: Vec<RowSource> = Vec::new();

        for memtable in std::iter::once(&view.memtable).chain(view.flushing.iter()) {
            if let Some(source) = memtable.read_range(row_key, &top_filter)? {
                self.stats.record_memtable_read();
                sources.push(source);
            }
        }

        let candidates: Vec<&Arc<TableReader>> = view
            .sstables
            .iter()
            .filter(|table| {
                let maybe = table.might_contain(row_key.data());
                self.stats.record_bloom_filter_check(!maybe);
                if !maybe {
                    debug!(family = %self.name, generation = table.generation(), "sstable skipped by filter");
                }
                maybe
            })
            .collect();

        let lookup = |table: &&Arc<TableReader>| {
            let found = table.read_range(row_key, &top_filter);
            if let Ok(found) = &found {
                self.stats.record_sstable_lookup(found.is_some());
            }
            found
        };
        let found: Vec<Option<RowSource>> = if candidates.len() > 1 {
            candidates.par_iter().map(lookup).collect::<Result<_>>()?
        } else {
            candidates.iter().map(lookup).collect::<Result<_>>()?
        };
        sources.extend(found.into_iter().flatten());

        if sources.is_empty() {
            return Ok(None);
        }

        let child_filter = super_column.is_some().then_some(filter);
        self.merge_sources(sources, &top_filter, child_filter)
    }

    /// Fuse the per-source iterators into one container: reconcile equal
    /// names, stop after `top_filter.count()` entries, then trim the
    /// children of super columns with `child_filter`. Any source error
    /// fails the whole read.
    fn merge_sources(
        &self,
        sources: Vec<RowSource>,
        top_filter: &QueryFilter,
        child_filter: Option<&QueryFilter>,
    ) -> Result<Option<ColumnFamily>> {
        let comparator = self.options.comparator_type.comparator();
        let mut cf = self.empty_column_family();
        let mut children = Vec::with_capacity(sources.len());
        for source in sources {
            if let Some(marker) = source.marked_for_delete_at {
                cf.delete(marker);
            }
            children.push(source.columns);
        }

        let merged = MergingIterator::new(children, comparator, top_filter.is_reversed());
        let mut entries = merged
            .take(top_filter.count())
            .collect::<Result<Vec<_>>>()?;
        if top_filter.is_reversed() {
            entries.reverse();
        }
        for entry in entries {
            cf.add(entry);
        }

        if let Some(filter) = child_filter {
            cf.map_super_columns(|sc| filter.filter_super_column(sc))?;
        }

        if cf.is_empty() {
            return Ok(None);
        }
        Ok(Some(cf))
    }

    /// A copy of `cf` without the entries its tombstones and deletion
    /// markers shadow; tombstones written after `gc_before` are kept.
    pub fn remove_deleted(cf: &ColumnFamily, gc_before: i64) -> ColumnFamily {
        cf.remove_deleted(gc_before)
    }

    // Flush

    /// Write the memtable, and any memtable an earlier flush failed to
    /// write, to new SSTables.
    pub fn flush(&self) -> Result<()> {
        let mut manifest = self.manifest.lock();
        self.flush_locked(&mut manifest)
    }

    /// Flush when the memtable is over `write_buffer_size`. A failure has
    /// already been counted and logged by the flush; the memtable stays in
    /// `flushing` for the next attempt.
    fn maybe_flush(&self) {
        if self.memtable_size() < self.options.write_buffer_size {
            return;
        }
        let mut manifest = self.manifest.lock();
        // a concurrent writer may have flushed while we waited
        if self.memtable_size() < self.options.write_buffer_size {
            return;
        }
        debug!(family = %self.name, size = self.memtable_size(), "memtable full");
        if let Err(e) = self.flush_locked(&mut manifest) {
            debug!(family = %self.name, error = %e, "automatic flush deferred");
        }
    }

    fn flush_locked(&self, manifest: &mut Manifest) -> Result<()> {
        let pending = {
            let mut view = self.view.write();
            if !view.memtable.is_empty() {
                let mut flushing = view.flushing.clone();
                flushing.push(Arc::clone(&view.memtable));
                *view = Arc::new(StoreView {
                    memtable: Arc::new(MemTable::new(
                        self.table_name.clone(),
                        self.name.clone(),
                        self.options.column_type,
                        self.options.comparator_type,
                    )),
                    flushing,
                    sstables: view.sstables.clone(),
                });
            }
            view.flushing.clone()
        };

        for memtable in pending {
            self.flush_memtable(manifest, &memtable)?;
        }
        Ok(())
    }

    fn flush_memtable(&self, manifest: &mut Manifest, memtable: &Arc<MemTable>) -> Result<()> {
        let generation = manifest.next_generation;
        let path = sstable_path(&self.dir, &self.name, generation);

        let (reader, props) = match self.write_sstable(&path, generation, memtable) {
            Ok(written) => written,
            Err(e) => {
                self.stats.record_error();
                warn!(family = %self.name, path = %path.display(), error = %e, "flush failed");
                if let Err(e) = fs::remove_file(&path) {
                    debug!(path = %path.display(), error = %e, "no partial sstable to remove");
                }
                return Err(e);
            }
        };

        manifest.next_generation += 1;
        manifest.sstables.push(generation);
        if let Err(e) = manifest.save(&self.dir) {
            manifest.sstables.pop();
            self.stats.record_error();
            warn!(family = %self.name, error = %e, "failed to record flushed sstable");
            return Err(e);
        }

        {
            let mut view = self.view.write();
            let mut sstables = view.sstables.clone();
            sstables.push(Arc::new(reader));
            *view = Arc::new(StoreView {
                memtable: Arc::clone(&view.memtable),
                flushing: view
                    .flushing
                    .iter()
                    .filter(|m| !Arc::ptr_eq(m, memtable))
                    .cloned()
                    .collect(),
                sstables,
            });
        }

        self.stats.record_flush(props.file_size);
        info!(
            family = %self.name,
            generation,
            rows = props.num_rows,
            bytes = props.file_size,
            "flushed memtable"
        );
        Ok(())
    }

    fn write_sstable(
        &self,
        path: &Path,
        generation: u64,
        memtable: &MemTable,
    ) -> Result<(TableReader, TableProperties)> {
        let options = TableBuilderOptions {
            block_size: self.options.block_size,
            compression: self.options.compression_type,
            filter_policy: self.filter_policy.clone(),
        };
        let mut builder = TableBuilder::create(path, options)?;
        for (row_key, row) in memtable.snapshot_rows() {
            builder.add(row_key.data(), &encode_row(&row))?;
        }
        let props = builder.finish()?;

        let reader = TableReader::open(
            path,
            generation,
            self.options.comparator_type,
            self.filter_policy.clone(),
        )?;
        Ok((reader, props))
    }
}

impl std::fmt::Debug for ColumnFamilyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let view = self.snapshot();
        f.debug_struct("ColumnFamilyStore")
            .field("table", &self.table_name)
            .field("name", &self.name)
            .field("column_type", &self.options.column_type)
            .field("memtable_rows", &view.memtable.len())
            .field("flushing", &view.flushing.len())
            .field("sstables", &view.sstables.len())
            .finish()
    }
}
