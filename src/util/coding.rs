use bytes::{Buf, BufMut, Bytes};

use crate::util::{Result, Slice, Status};

/// Append `value` as a LEB128 varint.
pub fn put_varint(buf: &mut impl BufMut, mut value: u64) {
    while value >= 0x80 {
        buf.put_u8((value as u8) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Append a varint length prefix followed by `data`.
pub fn put_length_prefixed(buf: &mut impl BufMut, data: &[u8]) {
    put_varint(buf, data.len() as u64);
    buf.put_slice(data);
}

/// Decode a varint from the front of `data`, returning the value and the
/// number of bytes consumed.
pub fn decode_varint(data: &[u8]) -> Option<(u64, usize)> {
    let mut result = 0u64;
    for (i, &byte) in data.iter().enumerate().take(10) {
        result |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Some((result, i + 1));
        }
    }
    None
}

/// Bounds-checked cursor over an owned buffer.
///
/// Every read fails with `Corruption` instead of panicking when the buffer is
/// shorter than the encoding claims. Byte strings are handed out as zero-copy
/// sub-slices.
pub struct Decoder {
    buf: Bytes,
    what: &'static str,
}

impl Decoder {
    pub fn new(buf: Bytes, what: &'static str) -> Self {
        Decoder { buf, what }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }

    fn ensure(&self, n: usize) -> Result<()> {
        if self.buf.remaining() < n {
            return Err(Status::corruption(format!(
                "truncated {}: need {} bytes, have {}",
                self.what,
                n,
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    pub fn get_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn get_u32_le(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn get_i64(&mut self) -> Result<i64> {
        self.ensure(8)?;
        Ok(self.buf.get_i64())
    }

    pub fn get_varint(&mut self) -> Result<u64> {
        let (value, len) = decode_varint(self.buf.chunk())
            .ok_or_else(|| Status::corruption(format!("bad varint in {}", self.what)))?;
        self.buf.advance(len);
        Ok(value)
    }

    pub fn get_length(&mut self) -> Result<usize> {
        let len = self.get_varint()?;
        usize::try_from(len)
            .map_err(|_| Status::corruption(format!("length overflow in {}", self.what)))
    }

    pub fn get_slice(&mut self, len: usize) -> Result<Slice> {
        self.ensure(len)?;
        Ok(Slice::from(self.buf.split_to(len)))
    }

    pub fn get_length_prefixed(&mut self) -> Result<Slice> {
        let len = self.get_length()?;
        self.get_slice(len)
    }
}
