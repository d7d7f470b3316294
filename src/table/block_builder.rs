use bytes::BufMut;

use crate::compression::CompressionType;
use crate::table::format::{calculate_checksum, DEFAULT_RESTART_INTERVAL};
use crate::util::coding::put_varint;
use crate::util::Result;

/// Builds one block of sorted key/value entries.
///
/// Keys are prefix-compressed against the previous key, with a full key
/// every `restart_interval` entries so readers can binary search.
pub struct BlockBuilder {
    buffer: Vec<u8>,
    restarts: Vec<u32>,
    counter: usize,
    restart_interval: usize,
    last_key: Vec<u8>,
    num_entries: usize,
}

impl BlockBuilder {
    pub fn new(restart_interval: usize) -> Self {
        BlockBuilder {
            buffer: Vec::new(),
            restarts: vec![0],
            counter: 0,
            restart_interval: restart_interval.max(1),
            last_key: Vec::new(),
            num_entries: 0,
        }
    }

    /// Add an entry. Keys must arrive in strictly increasing order.
    pub fn add(&mut self, key: &[u8], value: &[u8]) {
        debug_assert!(
            self.num_entries == 0 || key > self.last_key.as_slice(),
            "block keys out of order"
        );

        let shared = if self.counter < self.restart_interval {
            self.last_key
                .iter()
                .zip(key)
                .take_while(|(a, b)| a == b)
                .count()
        } else {
            self.restarts.push(self.buffer.len() as u32);
            self.counter = 0;
            0
        };

        put_varint(&mut self.buffer, shared as u64);
        put_varint(&mut self.buffer, (key.len() - shared) as u64);
        put_varint(&mut self.buffer, value.len() as u64);
        self.buffer.put_slice(&key[shared..]);
        self.buffer.put_slice(value);

        self.last_key.clear();
        self.last_key.extend_from_slice(key);
        self.counter += 1;
        self.num_entries += 1;
    }

    /// Size of the uncompressed block if finished now.
    pub fn current_size_estimate(&self) -> usize {
        self.buffer.len() + self.restarts.len() * 4 + 4
    }

    pub fn is_empty(&self) -> bool {
        self.num_entries == 0
    }

    pub fn last_key(&self) -> &[u8] {
        &self.last_key
    }

    /// Seal the block, compress its payload and append the trailer. The
    /// builder is reset and can be reused for the next block.
    ///
    /// Compression is skipped when it does not save at least 1/8 of the
    /// payload.
    pub fn finish(&mut self, compression: CompressionType) -> Result<Vec<u8>> {
        let mut payload = std::mem::take(&mut self.buffer);
        for restart in &self.restarts {
            payload.put_u32_le(*restart);
        }
        payload.put_u32_le(self.restarts.len() as u32);

        let (mut block, kind) = match compression {
            CompressionType::None => (payload, CompressionType::None),
            codec => {
                let compressed = codec.compress(&payload)?;
                if compressed.len() < payload.len() - payload.len() / 8 {
                    (compressed, codec)
                } else {
                    (payload, CompressionType::None)
                }
            }
        };

        let kind = kind as u8;
        let crc = calculate_checksum(&[block.as_slice(), &[kind]]);
        block.put_u8(kind);
        block.put_u32_le(crc);

        self.reset();
        Ok(block)
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.restarts.clear();
        self.restarts.push(0);
        self.counter = 0;
        self.last_key.clear();
        self.num_entries = 0;
    }
}

impl Default for BlockBuilder {
    fn default() -> Self {
        BlockBuilder::new(DEFAULT_RESTART_INTERVAL)
    }
}
