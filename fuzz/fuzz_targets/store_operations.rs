#![no_main]

use libfuzzer_sys::fuzz_target;
use widecol::{
    Column, ColumnFamilyDescriptor, ColumnFamilyOptions, ColumnFamilyStore, QueryPath, Slice,
    Statistics,
};

// Arbitrary writes, deletions, flushes and slices against one row. Reads must
// come back sorted with unique names and respect the requested count.
fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let test_dir = format!("/tmp/widecol_fuzz_ops_{}", std::process::id());
    let _ = std::fs::remove_dir_all(&test_dir);

    let options = ColumnFamilyOptions {
        write_buffer_size: 2048,
        ..Default::default()
    };
    let store = match ColumnFamilyStore::open(
        "Table1",
        &test_dir,
        ColumnFamilyDescriptor::new("Standard1", options),
        std::sync::Arc::new(Statistics::new()),
    ) {
        Ok(store) => store,
        Err(_) => {
            let _ = std::fs::remove_dir_all(&test_dir);
            return;
        }
    };

    let key = Slice::from("row");
    let path = QueryPath::new("Standard1");
    for chunk in data.chunks(4) {
        let [op, name, ts, extra] = match *chunk {
            [a, b, c, d] => [a, b, c, d],
            _ => break,
        };
        let name = vec![b'a' + name % 16];
        let ts = ts as i64;
        match op % 4 {
            0 => {
                let _ = store.insert_or_merge(&key, Column::new(name, vec![extra], ts));
            }
            1 => {
                let _ = store.delete(&key, &QueryPath::column("Standard1", name), ts);
            }
            2 => {
                let _ = store.flush();
            }
            _ => {
                let finish = vec![b'a' + extra % 16];
                let count = (extra % 8) as usize + 1;
                let reversed = extra & 0x80 != 0;
                if let Ok(Some(cf)) =
                    store.get_column_family_slice(&key, &path, name, finish, reversed, count)
                {
                    assert!(cf.column_count() <= count);
                    let names = cf.column_names();
                    assert!(names.windows(2).all(|w| w[0] < w[1]));
                }
            }
        }
    }

    let _ = std::fs::remove_dir_all(&test_dir);
});
