//! Binary encoding of columns and super columns.
//!
//! Column:
//! - name (varint length + bytes)
//! - flags (1 byte, bit 0 = tombstone)
//! - timestamp (8 bytes, big endian, signed)
//! - value (varint length + bytes)
//!
//! Super column:
//! - name (varint length + bytes)
//! - marker flag (1 byte) + marked_for_delete_at (8 bytes)
//! - child count (varint)
//! - children, each encoded as a column
//!
//! Both layouts start with the name so that a reader can binary search a row
//! by decoding names alone.

use bytes::BufMut;

use crate::column::{Column, ColumnEntry, SuperColumn};
use crate::comparator::ComparatorType;
use crate::util::coding::{put_length_prefixed, put_varint, Decoder};
use crate::util::{Result, Slice, Status};

const FLAG_TOMBSTONE: u8 = 0x01;

pub fn encode_column(buf: &mut impl BufMut, column: &Column) {
    put_length_prefixed(buf, column.name().data());
    buf.put_u8(if column.is_tombstone() { FLAG_TOMBSTONE } else { 0 });
    buf.put_i64(column.timestamp());
    put_length_prefixed(buf, column.value().data());
}

pub fn decode_column(decoder: &mut Decoder) -> Result<Column> {
    let name = decoder.get_length_prefixed()?;
    let flags = decoder.get_u8()?;
    if flags & !FLAG_TOMBSTONE != 0 {
        return Err(Status::corruption(format!(
            "unknown column flags {flags:#x} for {name}"
        )));
    }
    let timestamp = decoder.get_i64()?;
    let value = decoder.get_length_prefixed()?;
    if flags & FLAG_TOMBSTONE != 0 {
        Ok(Column::tombstone(name, timestamp))
    } else {
        Ok(Column::new(name, value, timestamp))
    }
}

pub(crate) fn put_marker(buf: &mut impl BufMut, marker: Option<i64>) {
    buf.put_u8(u8::from(marker.is_some()));
    buf.put_i64(marker.unwrap_or(i64::MIN));
}

pub(crate) fn get_marker(decoder: &mut Decoder) -> Result<Option<i64>> {
    let present = decoder.get_u8()?;
    let timestamp = decoder.get_i64()?;
    match present {
        0 => Ok(None),
        1 => Ok(Some(timestamp)),
        other => Err(Status::corruption(format!("bad deletion marker flag {other}"))),
    }
}

pub fn encode_super_column(buf: &mut impl BufMut, sc: &SuperColumn) {
    put_length_prefixed(buf, sc.name().data());
    put_marker(buf, sc.marked_for_delete_at());
    put_varint(buf, sc.sub_column_count() as u64);
    for column in sc.sub_columns() {
        encode_column(buf, column);
    }
}

pub fn decode_super_column(decoder: &mut Decoder, comparator: ComparatorType) -> Result<SuperColumn> {
    let name = decoder.get_length_prefixed()?;
    let marker = get_marker(decoder)?;
    let count = decoder.get_length()?;
    let mut sc = SuperColumn::new(name, comparator);
    if let Some(ts) = marker {
        sc.mark_for_delete_at(ts);
    }
    for _ in 0..count {
        sc.add_column(decode_column(decoder)?);
    }
    Ok(sc)
}

pub fn encode_entry(buf: &mut impl BufMut, entry: &ColumnEntry) {
    match entry {
        ColumnEntry::Column(c) => encode_column(buf, c),
        ColumnEntry::Super(sc) => encode_super_column(buf, sc),
    }
}

pub fn decode_entry(
    decoder: &mut Decoder,
    is_super: bool,
    comparator: ComparatorType,
) -> Result<ColumnEntry> {
    if is_super {
        decode_super_column(decoder, comparator).map(ColumnEntry::Super)
    } else {
        decode_column(decoder).map(ColumnEntry::Column)
    }
}

/// Decode only the leading name of an encoded entry.
pub fn decode_name(decoder: &mut Decoder) -> Result<Slice> {
    decoder.get_length_prefixed()
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;

    fn decoder(buf: BytesMut) -> Decoder {
        Decoder::new(buf.freeze(), "entry")
    }

    #[test]
    fn test_tombstone_flag_survives() {
        let mut buf = BytesMut::new();
        encode_column(&mut buf, &Column::tombstone("col4", 2));
        encode_column(&mut buf, &Column::new("col5", "val5", i64::MIN));

        let mut dec = decoder(buf);
        let dead = decode_column(&mut dec).unwrap();
        assert!(dead.is_tombstone());
        assert_eq!(dead.timestamp(), 2);
        let live = decode_column(&mut dec).unwrap();
        assert!(!live.is_tombstone());
        assert_eq!(live.value(), &Slice::from("val5"));
        assert_eq!(live.timestamp(), i64::MIN);
        assert!(dec.is_empty());
    }

    #[test]
    fn test_super_column_with_marker() {
        let mut sc = SuperColumn::with_columns(
            "sc1",
            ComparatorType::Name,
            [Column::new("sub1", "v", 1), Column::tombstone("sub2", 3)],
        );
        sc.mark_for_delete_at(2);

        let mut buf = BytesMut::new();
        encode_super_column(&mut buf, &sc);
        let decoded = decode_super_column(&mut decoder(buf), ComparatorType::Name).unwrap();
        assert_eq!(decoded, sc);
    }

    #[test]
    fn test_decode_name_only() {
        let mut buf = BytesMut::new();
        encode_entry(&mut buf, &Column::new("name", "a long value", 9).into());
        assert_eq!(decode_name(&mut decoder(buf)).unwrap(), Slice::from("name"));
    }

    #[test]
    fn test_unknown_flags_rejected() {
        let mut buf = BytesMut::new();
        encode_column(&mut buf, &Column::new("c", "v", 1));
        buf[2] = 0x80;
        let err = decode_column(&mut decoder(buf)).unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_truncated_super_column() {
        let sc = SuperColumn::with_columns("sc", ComparatorType::Name, [Column::new("a", "b", 1)]);
        let mut buf = BytesMut::new();
        encode_super_column(&mut buf, &sc);
        buf.truncate(buf.len() - 2);
        let err = decode_super_column(&mut decoder(buf), ComparatorType::Name).unwrap_err();
        assert!(err.is_corruption());
    }
}
