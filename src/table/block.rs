use bytes::{Buf, Bytes};

use crate::compression::CompressionType;
use crate::table::format::{calculate_checksum, BLOCK_TRAILER_SIZE};
use crate::util::coding::decode_varint;
use crate::util::{Result, Slice, Status};

/// A decoded, checksum-verified block.
#[derive(Debug, Clone)]
pub struct Block {
    data: Bytes,
    restarts_offset: usize,
    num_restarts: usize,
}

impl Block {
    /// Verify the trailer of a raw on-disk block and decompress its payload.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        if raw.len() < BLOCK_TRAILER_SIZE {
            return Err(Status::corruption("block shorter than its trailer"));
        }
        let (body, mut crc_bytes) = raw.split_at(raw.len() - 4);
        let expected = crc_bytes.get_u32_le();
        let actual = calculate_checksum(&[body]);
        if actual != expected {
            return Err(Status::corruption(format!(
                "block checksum mismatch: expected {expected:#010x}, got {actual:#010x}"
            )));
        }

        let (payload, kind) = body.split_at(body.len() - 1);
        let compression = CompressionType::from_u8(kind[0])
            .ok_or_else(|| Status::corruption(format!("unknown block compression {}", kind[0])))?;
        let data = Bytes::from(compression.decompress(payload)?);
        Self::from_payload(data)
    }

    fn from_payload(data: Bytes) -> Result<Self> {
        if data.len() < 4 {
            return Err(Status::corruption("block payload too short"));
        }
        let num_restarts = (&data[data.len() - 4..]).get_u32_le() as usize;
        let restarts_len = num_restarts
            .checked_mul(4)
            .and_then(|n| n.checked_add(4))
            .filter(|n| *n <= data.len())
            .ok_or_else(|| Status::corruption("bad restart count in block"))?;
        if num_restarts == 0 {
            return Err(Status::corruption("block without restart points"));
        }
        Ok(Block {
            restarts_offset: data.len() - restarts_len,
            num_restarts,
            data,
        })
    }

    fn restart_point(&self, index: usize) -> usize {
        let at = self.restarts_offset + index * 4;
        (&self.data[at..at + 4]).get_u32_le() as usize
    }

    pub fn iter(&self) -> BlockIter {
        BlockIter {
            data: self.data.clone(),
            limit: self.restarts_offset,
            offset: 0,
            key: Vec::new(),
            failed: false,
        }
    }

    /// First entry whose key is `>= target`.
    pub fn seek(&self, target: &[u8]) -> Result<Option<(Slice, Slice)>> {
        // last restart whose key is < target
        let (mut lo, mut hi) = (0, self.num_restarts - 1);
        while lo < hi {
            let mid = (lo + hi).div_ceil(2);
            let mut cursor = self.iter();
            cursor.offset = self.restart_point(mid);
            match cursor.parse_next()? {
                Some((key, _)) if key.data() < target => lo = mid,
                _ => hi = mid - 1,
            }
        }

        let mut iter = self.iter();
        iter.offset = self.restart_point(lo);
        while let Some((key, value)) = iter.parse_next()? {
            if key.data() >= target {
                return Ok(Some((key, value)));
            }
        }
        Ok(None)
    }

    /// Value stored under exactly `key`.
    pub fn get(&self, key: &[u8]) -> Result<Option<Slice>> {
        Ok(self
            .seek(key)?
            .filter(|(found, _)| found.data() == key)
            .map(|(_, value)| value))
    }
}

/// Forward iterator over the entries of a block.
pub struct BlockIter {
    data: Bytes,
    limit: usize,
    offset: usize,
    key: Vec<u8>,
    failed: bool,
}

impl BlockIter {
    fn parse_next(&mut self) -> Result<Option<(Slice, Slice)>> {
        if self.offset >= self.limit {
            return Ok(None);
        }
        let entries = &self.data[..self.limit];
        let mut pos = self.offset;
        let read_varint = |pos: &mut usize| -> Result<usize> {
            let (v, n) = decode_varint(&entries[*pos..])
                .ok_or_else(|| Status::corruption("bad varint in block entry"))?;
            *pos += n;
            Ok(v as usize)
        };
        let shared = read_varint(&mut pos)?;
        let unshared = read_varint(&mut pos)?;
        let value_len = read_varint(&mut pos)?;

        let key_end = pos
            .checked_add(unshared)
            .filter(|end| *end <= self.limit)
            .ok_or_else(|| Status::corruption("block entry key overruns block"))?;
        let value_end = key_end
            .checked_add(value_len)
            .filter(|end| *end <= self.limit)
            .ok_or_else(|| Status::corruption("block entry value overruns block"))?;
        if shared > self.key.len() {
            return Err(Status::corruption("block entry shares more than previous key"));
        }

        self.key.truncate(shared);
        self.key.extend_from_slice(&entries[pos..key_end]);
        self.offset = value_end;
        Ok(Some((
            Slice::copy_from(&self.key),
            Slice::from(self.data.slice(key_end..value_end)),
        )))
    }
}

impl Iterator for BlockIter {
    type Item = Result<(Slice, Slice)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.parse_next() {
            Ok(entry) => entry.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
