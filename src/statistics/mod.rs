use std::sync::atomic::{AtomicU64, Ordering};

/// Read-path statistics shared by every column family of a table.
///
/// Plain atomic counters, updated without locks.
#[derive(Debug, Default)]
pub struct Statistics {
    // Queries
    pub num_reads: AtomicU64,
    pub num_empty_reads: AtomicU64,
    pub columns_returned: AtomicU64,

    // Sources consulted
    pub memtable_reads: AtomicU64,
    pub sstable_lookups: AtomicU64,
    pub sstable_hits: AtomicU64,

    // Bloom filter
    pub bloom_filter_checked: AtomicU64,
    pub bloom_filter_useful: AtomicU64,

    // Writes and flushes
    pub columns_written: AtomicU64,
    pub num_memtable_flushes: AtomicU64,
    pub bytes_flushed: AtomicU64,

    pub num_errors: AtomicU64,
}

impl Statistics {
    pub fn new() -> Self {
        Statistics::default()
    }

    #[inline]
    pub fn record_read(&self, columns: u64) {
        self.num_reads.fetch_add(1, Ordering::Relaxed);
        if columns == 0 {
            self.num_empty_reads.fetch_add(1, Ordering::Relaxed);
        }
        self.columns_returned.fetch_add(columns, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_memtable_read(&self) {
        self.memtable_reads.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_sstable_lookup(&self, hit: bool) {
        self.sstable_lookups.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.sstable_hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// `useful` means the filter ruled the table out.
    #[inline]
    pub fn record_bloom_filter_check(&self, useful: bool) {
        self.bloom_filter_checked.fetch_add(1, Ordering::Relaxed);
        if useful {
            self.bloom_filter_useful.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_write(&self, columns: u64) {
        self.columns_written.fetch_add(columns, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_flush(&self, bytes: u64) {
        self.num_memtable_flushes.fetch_add(1, Ordering::Relaxed);
        self.bytes_flushed.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_error(&self) {
        self.num_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn num_reads(&self) -> u64 {
        self.num_reads.load(Ordering::Relaxed)
    }

    pub fn num_memtable_flushes(&self) -> u64 {
        self.num_memtable_flushes.load(Ordering::Relaxed)
    }

    pub fn sstable_lookups(&self) -> u64 {
        self.sstable_lookups.load(Ordering::Relaxed)
    }

    pub fn num_errors(&self) -> u64 {
        self.num_errors.load(Ordering::Relaxed)
    }

    pub fn sstable_hit_rate(&self) -> f64 {
        let hits = self.sstable_hits.load(Ordering::Relaxed) as f64;
        let lookups = self.sstable_lookups.load(Ordering::Relaxed) as f64;
        if lookups > 0.0 { hits / lookups } else { 0.0 }
    }

    pub fn bloom_filter_effectiveness(&self) -> f64 {
        let useful = self.bloom_filter_useful.load(Ordering::Relaxed) as f64;
        let checked = self.bloom_filter_checked.load(Ordering::Relaxed) as f64;
        if checked > 0.0 { useful / checked } else { 0.0 }
    }

    /// Reset all statistics to zero
    pub fn reset(&self) {
        for counter in [
            &self.num_reads,
            &self.num_empty_reads,
            &self.columns_returned,
            &self.memtable_reads,
            &self.sstable_lookups,
            &self.sstable_hits,
            &self.bloom_filter_checked,
            &self.bloom_filter_useful,
            &self.columns_written,
            &self.num_memtable_flushes,
            &self.bytes_flushed,
            &self.num_errors,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    pub fn report(&self) -> String {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        format!(
            "Read Path Statistics:\n\
            \n\
            Queries:\n\
            - Reads:            {}\n\
            - Empty reads:      {}\n\
            - Columns returned: {}\n\
            \n\
            Sources:\n\
            - Memtable reads:   {}\n\
            - SSTable lookups:  {}\n\
            - SSTable hit rate: {:.2}%\n\
            \n\
            Bloom Filter:\n\
            - Checked:          {}\n\
            - Useful:           {}\n\
            - Effectiveness:    {:.2}%\n\
            \n\
            Writes:\n\
            - Columns written:  {}\n\
            - Flushes:          {}\n\
            - Bytes flushed:    {} ({:.2} MB)\n\
            \n\
            Errors:             {}",
            load(&self.num_reads),
            load(&self.num_empty_reads),
            load(&self.columns_returned),
            load(&self.memtable_reads),
            load(&self.sstable_lookups),
            self.sstable_hit_rate() * 100.0,
            load(&self.bloom_filter_checked),
            load(&self.bloom_filter_useful),
            self.bloom_filter_effectiveness() * 100.0,
            load(&self.columns_written),
            load(&self.num_memtable_flushes),
            load(&self.bytes_flushed),
            load(&self.bytes_flushed) as f64 / 1024.0 / 1024.0,
            load(&self.num_errors),
        )
    }
}
