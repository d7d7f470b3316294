use std::fs;

use tempfile::TempDir;
use widecol::{
    ColumnFamilyDescriptor, ColumnFamilyOptions, ColumnType, CompressionType, QueryFilter,
    QueryPath, RowMutation, Slice, Table, TableOptions,
};

fn descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::standard("Standard1"),
        ColumnFamilyDescriptor::super_column("Super1"),
    ]
}

fn open(dir: &TempDir, descriptors: Vec<ColumnFamilyDescriptor>) -> Table {
    Table::open(dir.path(), "Table1", TableOptions::default(), descriptors).unwrap()
}

fn write_rows(table: &Table, rows: usize) {
    for i in 0..rows {
        let mut rm = RowMutation::new("Table1", format!("key{i}"));
        rm.add(&QueryPath::column("Standard1", "col1"), format!("val{i}"), 1)
            .unwrap();
        rm.add(&QueryPath::sub_column("Super1", "sc1", "sub1"), format!("val{i}"), 1)
            .unwrap();
        rm.apply(table).unwrap();
    }
}

#[test]
fn test_flushed_rows_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let table = open(&dir, descriptors());
        write_rows(&table, 50);
        table.flush_all().unwrap();

        let mut rm = RowMutation::new("Table1", "key0");
        rm.delete(&QueryPath::column("Standard1", "col1"), 2).unwrap();
        rm.apply(&table).unwrap();
        table.flush_all().unwrap();
    }

    let table = open(&dir, descriptors());
    let store = table.column_family_store("Standard1").unwrap();
    assert_eq!(store.sstables().len(), 2);

    for i in 1..50 {
        let key = Slice::from(format!("key{i}"));
        let row = table.get_row(&key).unwrap();
        let cf = row.get_column_family("Standard1").unwrap();
        assert_eq!(cf.get_column(b"col1").unwrap().value(), &Slice::from(format!("val{i}")));
        let sc = row.get_column_family("Super1").unwrap().get_super_column(b"sc1").unwrap();
        assert_eq!(sc.sub_column_count(), 1);
    }

    // the tombstone flushed after the value still shadows it
    let cf = table
        .get_column_family(&Slice::from("key0"), &QueryPath::new("Standard1"), &QueryFilter::Identity)
        .unwrap()
        .unwrap();
    assert!(cf.get_column(b"col1").unwrap().is_tombstone());
    assert!(cf.remove_deleted(i64::MAX).is_empty());
}

#[test]
fn test_generations_continue_after_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let table = open(&dir, descriptors());
        write_rows(&table, 5);
        table.flush_all().unwrap();
    }
    let table = open(&dir, descriptors());
    write_rows(&table, 5);
    table.flush_all().unwrap();

    let store = table.column_family_store("Standard1").unwrap();
    let generations: Vec<u64> = store.sstables().iter().map(|t| t.generation()).collect();
    assert_eq!(generations, [1, 2]);
}

#[test]
fn test_unflushed_rows_are_not_durable() {
    let dir = TempDir::new().unwrap();
    {
        let table = open(&dir, descriptors());
        write_rows(&table, 3);
    }
    let table = open(&dir, descriptors());
    assert!(table.get_row(&Slice::from("key0")).unwrap().is_empty());
}

#[test]
fn test_automatic_flush_persists() {
    let dir = TempDir::new().unwrap();
    let options = ColumnFamilyOptions {
        write_buffer_size: 4 * 1024,
        compression_type: CompressionType::Lz4,
        ..Default::default()
    };
    {
        let table = open(&dir, vec![ColumnFamilyDescriptor::new("Standard1", options.clone())]);
        for i in 0..500 {
            let mut rm = RowMutation::new("Table1", format!("key{i:04}"));
            rm.add(&QueryPath::column("Standard1", "col1"), "x".repeat(64), 1)
                .unwrap();
            rm.apply(&table).unwrap();
        }
        let store = table.column_family_store("Standard1").unwrap();
        assert!(!store.sstables().is_empty());
        assert!(table.statistics().num_memtable_flushes() > 0);
        table.flush_all().unwrap();
    }

    let table = open(&dir, vec![ColumnFamilyDescriptor::new("Standard1", options)]);
    for i in 0..500 {
        let row = table.get_row(&Slice::from(format!("key{i:04}"))).unwrap();
        assert!(!row.is_empty(), "key{i:04} lost");
    }
}

#[test]
fn test_reopen_with_other_type_fails() {
    let dir = TempDir::new().unwrap();
    {
        let table = open(&dir, descriptors());
        write_rows(&table, 1);
        table.flush_all().unwrap();
    }
    let retyped = vec![ColumnFamilyDescriptor::new(
        "Standard1",
        ColumnFamilyOptions {
            column_type: ColumnType::Super,
            ..Default::default()
        },
    )];
    let err = Table::open(dir.path(), "Table1", TableOptions::default(), retyped).unwrap_err();
    assert!(err.is_invalid_argument());
}

#[test]
fn test_missing_sstable_is_reported() {
    let dir = TempDir::new().unwrap();
    {
        let table = open(&dir, descriptors());
        write_rows(&table, 1);
        table.flush_all().unwrap();
    }
    let data_file = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("Standard1-") && n.ends_with("-Data.db"))
        })
        .unwrap();
    fs::remove_file(data_file).unwrap();

    let err = Table::open(dir.path(), "Table1", TableOptions::default(), descriptors()).unwrap_err();
    assert!(err.is_retryable());
}
