#![no_main]

use libfuzzer_sys::fuzz_target;
use widecol::table::{Block, SerializedRow};
use widecol::{ComparatorType, Slice};

// Arbitrary bytes handed to the row and block decoders must be rejected
// with an error, never a panic or an out-of-bounds read.
fuzz_target!(|data: &[u8]| {
    for comparator in ComparatorType::ALL {
        if let Ok(row) = SerializedRow::parse(Slice::from(data), comparator) {
            let _ = row.marked_for_delete_at();
            for i in 0..row.len() {
                let _ = row.name_at(i);
                let _ = row.entry_at(i);
            }
            let _ = row.to_column_family("Table1", "Standard1");
        }
    }

    if let Ok(block) = Block::decode(data) {
        for item in block.iter() {
            if item.is_err() {
                break;
            }
        }
        let _ = block.seek(data);
    }
});
