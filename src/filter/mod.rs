pub mod bloom;

pub use bloom::BloomFilterPolicy;

/// Approximate membership over the row keys of one SSTable.
///
/// A filter may report false positives but never false negatives: when
/// `may_contain` returns false the key is definitely not in the table.
pub trait FilterPolicy: Send + Sync {
    fn name(&self) -> &str;

    /// Build a filter over `keys`.
    fn create_filter(&self, keys: &[&[u8]]) -> Vec<u8>;

    fn may_contain(&self, filter: &[u8], key: &[u8]) -> bool;
}
