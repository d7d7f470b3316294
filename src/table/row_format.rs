//! On-disk layout of one row.
//!
//! A row is stored as the value of its row key in a data block:
//!
//! ```text
//! [entry 0] .. [entry N-1]        column or super column encodings
//! [offset 0] .. [offset N-1]      u32 LE, start of each entry
//! [N]                             u32 LE
//! [marker flag][marked_for_delete_at]  u8 + i64 BE
//! [flags]                         u8, bit 0 = super column family
//! ```
//!
//! The offset table lets a reader binary search the row by name and decode
//! only the entries a query selects, in either direction.

use bytes::{BufMut, Bytes};

use crate::column::serializer::{decode_entry, decode_name, encode_entry, get_marker, put_marker};
use crate::column::ColumnEntry;
use crate::column_family::ColumnFamily;
use crate::comparator::ComparatorType;
use crate::util::coding::Decoder;
use crate::util::{Result, Slice, Status};

const FLAG_SUPER: u8 = 0x01;
const ROW_TRAILER_SIZE: usize = 4 + 1 + 8 + 1;

pub fn encode_row(cf: &ColumnFamily) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut offsets = Vec::with_capacity(cf.column_count());
    for entry in cf.entries() {
        offsets.push(buf.len() as u32);
        encode_entry(&mut buf, entry);
    }
    for offset in &offsets {
        buf.put_u32_le(*offset);
    }
    buf.put_u32_le(offsets.len() as u32);
    put_marker(&mut buf, cf.marked_for_delete_at());
    buf.put_u8(if cf.is_super() { FLAG_SUPER } else { 0 });
    buf
}

/// A row read from an SSTable, decoded lazily entry by entry.
#[derive(Debug, Clone)]
pub struct SerializedRow {
    data: Bytes,
    count: usize,
    offsets_start: usize,
    is_super: bool,
    marked_for_delete_at: Option<i64>,
    comparator: ComparatorType,
}

impl SerializedRow {
    pub fn parse(row: Slice, comparator: ComparatorType) -> Result<Self> {
        let data = row.bytes().clone();
        if data.len() < ROW_TRAILER_SIZE {
            return Err(Status::corruption("row shorter than its trailer"));
        }
        let mut trailer = Decoder::new(data.slice(data.len() - ROW_TRAILER_SIZE..), "row trailer");
        let count = trailer.get_u32_le()? as usize;
        let marked_for_delete_at = get_marker(&mut trailer)?;
        let flags = trailer.get_u8()?;
        if flags & !FLAG_SUPER != 0 {
            return Err(Status::corruption(format!("unknown row flags {flags:#x}")));
        }

        let offsets_start = count
            .checked_mul(4)
            .and_then(|n| (data.len() - ROW_TRAILER_SIZE).checked_sub(n))
            .ok_or_else(|| Status::corruption(format!("row claims {count} entries")))?;

        Ok(SerializedRow {
            data,
            count,
            offsets_start,
            is_super: flags & FLAG_SUPER != 0,
            marked_for_delete_at,
            comparator,
        })
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_super(&self) -> bool {
        self.is_super
    }

    pub fn marked_for_delete_at(&self) -> Option<i64> {
        self.marked_for_delete_at
    }

    fn offset(&self, index: usize) -> usize {
        let at = self.offsets_start + index * 4;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.data[at..at + 4]);
        u32::from_le_bytes(raw) as usize
    }

    fn entry_decoder(&self, index: usize) -> Result<Decoder> {
        if index >= self.count {
            return Err(Status::corruption(format!(
                "entry {index} out of range for row of {}",
                self.count
            )));
        }
        let start = self.offset(index);
        let end = if index + 1 < self.count {
            self.offset(index + 1)
        } else {
            self.offsets_start
        };
        if start > end || end > self.offsets_start {
            return Err(Status::corruption(format!("bad offset for row entry {index}")));
        }
        Ok(Decoder::new(self.data.slice(start..end), "row entry"))
    }

    pub fn name_at(&self, index: usize) -> Result<Slice> {
        decode_name(&mut self.entry_decoder(index)?)
    }

    pub fn entry_at(&self, index: usize) -> Result<ColumnEntry> {
        let mut decoder = self.entry_decoder(index)?;
        let entry = decode_entry(&mut decoder, self.is_super, self.comparator)?;
        if !decoder.is_empty() {
            return Err(Status::corruption(format!(
                "{} trailing bytes after row entry {index}",
                decoder.remaining()
            )));
        }
        Ok(entry)
    }

    /// Decode the whole row.
    pub fn to_column_family(&self, table: &str, family: &str) -> Result<ColumnFamily> {
        let column_type = if self.is_super {
            crate::column_family::ColumnType::Super
        } else {
            crate::column_family::ColumnType::Standard
        };
        let mut cf = ColumnFamily::new(table, family, column_type, self.comparator);
        if let Some(ts) = self.marked_for_delete_at {
            cf.delete(ts);
        }
        for i in 0..self.count {
            cf.add(self.entry_at(i)?);
        }
        Ok(cf)
    }
}
