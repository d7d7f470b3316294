//! SSTable file format
//!
//! One SSTable holds the rows of one column family, sorted by row key.
//!
//! File layout:
//! - Data Block 1 .. Data Block N   (row key -> serialized row)
//! - Filter Block (optional)        (bloom filter over every row key)
//! - Index Block                    (last row key of a block -> BlockHandle)
//! - Footer (40 bytes)
//!
//! Block format:
//! - Payload, possibly compressed:
//!   - Entry 1 .. Entry N
//!   - Restart[0] .. Restart[R-1] (4 bytes each)
//!   - Num Restarts (4 bytes)
//! - Compression Type (1 byte)
//! - CRC32 of payload and type (4 bytes)
//!
//! Entry format (row keys share prefixes with the previous entry):
//! - Shared Key Len (varint)
//! - Unshared Key Len (varint)
//! - Value Len (varint)
//! - Unshared Key (bytes)
//! - Value (bytes)
//!
//! Filter Block format:
//! - Filter bytes
//! - CRC32 (4 bytes)
//!
//! Footer format (40 bytes):
//! - Filter Block Handle (offset: 8 bytes, size: 8 bytes; size 0 = no filter)
//! - Index Block Handle (offset: 8 bytes, size: 8 bytes)
//! - Magic Number (8 bytes)

use bytes::{Buf, BufMut};
use crc32fast::Hasher;

use crate::util::{Result, Status};

pub const DEFAULT_BLOCK_SIZE: usize = 4 * 1024;

/// Entries between restart points.
pub const DEFAULT_RESTART_INTERVAL: usize = 16;

/// Compression type byte + CRC32.
pub const BLOCK_TRAILER_SIZE: usize = 5;

pub const FOOTER_SIZE: usize = 40;

pub const MAGIC_NUMBER: u64 = 0x57c0_1f4a_d15c_7ab1;

/// Offset and size of a block within the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockHandle {
    pub offset: u64,
    pub size: u64,
}

impl BlockHandle {
    pub const ENCODED_LEN: usize = 16;

    pub const fn new(offset: u64, size: u64) -> Self {
        BlockHandle { offset, size }
    }

    pub fn is_null(&self) -> bool {
        self.size == 0
    }

    pub fn encode_to(&self, buf: &mut impl BufMut) {
        buf.put_u64_le(self.offset);
        buf.put_u64_le(self.size);
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::ENCODED_LEN);
        self.encode_to(&mut buf);
        buf
    }

    pub fn decode(mut data: &[u8]) -> Result<Self> {
        if data.len() < Self::ENCODED_LEN {
            return Err(Status::corruption("truncated block handle"));
        }
        let offset = data.get_u64_le();
        let size = data.get_u64_le();
        Ok(BlockHandle { offset, size })
    }

    /// Reject handles pointing past the end of a file of `file_size` bytes.
    pub fn check_within(&self, file_size: u64) -> Result<()> {
        match self.offset.checked_add(self.size) {
            Some(end) if end <= file_size => Ok(()),
            _ => Err(Status::corruption(format!(
                "block handle {}+{} beyond file size {}",
                self.offset, self.size, file_size
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    pub filter_handle: BlockHandle,
    pub index_handle: BlockHandle,
}

impl Footer {
    pub fn encode(&self) -> [u8; FOOTER_SIZE] {
        let mut buf = Vec::with_capacity(FOOTER_SIZE);
        self.filter_handle.encode_to(&mut buf);
        self.index_handle.encode_to(&mut buf);
        buf.put_u64_le(MAGIC_NUMBER);

        let mut out = [0u8; FOOTER_SIZE];
        out.copy_from_slice(&buf);
        out
    }

    pub fn decode(data: &[u8; FOOTER_SIZE]) -> Result<Self> {
        let mut magic = &data[32..40];
        if magic.get_u64_le() != MAGIC_NUMBER {
            return Err(Status::corruption("bad sstable magic number"));
        }
        Ok(Footer {
            filter_handle: BlockHandle::decode(&data[0..16])?,
            index_handle: BlockHandle::decode(&data[16..32])?,
        })
    }
}

pub fn calculate_checksum(parts: &[&[u8]]) -> u32 {
    let mut hasher = Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footer() {
        let footer = Footer {
            filter_handle: BlockHandle::new(4096, 130),
            index_handle: BlockHandle::new(4226, 64),
        };
        let encoded = footer.encode();
        assert_eq!(Footer::decode(&encoded).unwrap(), footer);
    }

    #[test]
    fn test_footer_bad_magic() {
        let mut encoded = Footer {
            filter_handle: BlockHandle::default(),
            index_handle: BlockHandle::new(0, 10),
        }
        .encode();
        encoded[39] ^= 0xff;
        assert!(Footer::decode(&encoded).unwrap_err().is_corruption());
    }

    #[test]
    fn test_handle_bounds() {
        assert!(BlockHandle::new(10, 20).check_within(30).is_ok());
        assert!(BlockHandle::new(10, 21).check_within(30).is_err());
        assert!(BlockHandle::new(u64::MAX, 2).check_within(30).is_err());
        assert!(BlockHandle::decode(&[0u8; 8]).is_err());
    }

    #[test]
    fn test_checksum_over_parts() {
        assert_eq!(
            calculate_checksum(&[b"abc".as_slice(), b"def".as_slice()]),
            calculate_checksum(&[b"abcdef".as_slice()])
        );
    }
}
