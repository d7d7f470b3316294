use super::FilterPolicy;

/// Bloom filter over row keys.
///
/// Uses double hashing: hash `i` tests bit `h1 + i * h2`. The hash count is
/// stored in the last byte of the filter so readers do not need to know the
/// bits-per-key the writer used. 10 bits per key gives roughly a 1% false
/// positive rate.
#[derive(Debug, Clone)]
pub struct BloomFilterPolicy {
    bits_per_key: usize,
    num_hashes: usize,
}

const MAX_HASHES: usize = 30;

impl BloomFilterPolicy {
    pub fn new(bits_per_key: usize) -> Self {
        // ln(2) * m / n hashes minimises the false positive rate
        let num_hashes = ((bits_per_key as f64) * std::f64::consts::LN_2) as usize;
        BloomFilterPolicy {
            bits_per_key,
            num_hashes: num_hashes.clamp(1, MAX_HASHES),
        }
    }

    pub fn bits_per_key(&self) -> usize {
        self.bits_per_key
    }

    /// FNV-1a, split into two 32-bit halves for double hashing.
    fn hash_pair(key: &[u8]) -> (u32, u32) {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        for &b in key {
            h ^= u64::from(b);
            h = h.wrapping_mul(0x0000_0100_0000_01b3);
        }
        // finalizer so that short keys spread over both halves
        h ^= h >> 33;
        h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
        h ^= h >> 33;
        (h as u32, ((h >> 32) as u32) | 1)
    }
}

impl Default for BloomFilterPolicy {
    fn default() -> Self {
        BloomFilterPolicy::new(10)
    }
}

impl FilterPolicy for BloomFilterPolicy {
    fn name(&self) -> &str {
        "widecol.BloomFilter"
    }

    fn create_filter(&self, keys: &[&[u8]]) -> Vec<u8> {
        let bits = (keys.len() * self.bits_per_key).max(64);
        let bytes = bits.div_ceil(8);
        let bits = bytes * 8;

        let mut filter = vec![0u8; bytes + 1];
        filter[bytes] = self.num_hashes as u8;

        for key in keys {
            let (h1, h2) = Self::hash_pair(key);
            let mut h = h1;
            for _ in 0..self.num_hashes {
                let bit = h as usize % bits;
                filter[bit / 8] |= 1 << (bit % 8);
                h = h.wrapping_add(h2);
            }
        }

        filter
    }

    fn may_contain(&self, filter: &[u8], key: &[u8]) -> bool {
        let Some((&num_hashes, bitmap)) = filter.split_last() else {
            return false;
        };
        if bitmap.is_empty() {
            return false;
        }
        let num_hashes = num_hashes as usize;
        if num_hashes == 0 || num_hashes > MAX_HASHES {
            // written by an unknown policy; never hide a key
            return true;
        }

        let bits = bitmap.len() * 8;
        let (h1, h2) = Self::hash_pair(key);
        let mut h = h1;
        for _ in 0..num_hashes {
            let bit = h as usize % bits;
            if bitmap[bit / 8] & (1 << (bit % 8)) == 0 {
                return false;
            }
            h = h.wrapping_add(h2);
        }
        true
    }
}
