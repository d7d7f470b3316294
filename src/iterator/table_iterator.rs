use crate::column::ColumnEntry;
use crate::query::Selection;
use crate::table::row_format::SerializedRow;
use crate::util::Result;

/// Entries of one SSTable row, decoded on demand in selection order.
///
/// Stops after the first decoding error.
pub struct TableIterator {
    row: SerializedRow,
    selection: Selection,
    failed: bool,
}

impl TableIterator {
    pub fn new(row: SerializedRow, selection: Selection) -> Self {
        TableIterator {
            row,
            selection,
            failed: false,
        }
    }
}

impl Iterator for TableIterator {
    type Item = Result<ColumnEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let index = self.selection.next()?;
        let entry = self.row.entry_at(index);
        self.failed = entry.is_err();
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::column_family::{ColumnFamily, ColumnType};
    use crate::comparator::ComparatorType;
    use crate::query::QueryFilter;
    use crate::table::row_format::encode_row;
    use crate::util::Slice;

    #[test]
    fn test_decodes_selected_entries() {
        let mut cf = ColumnFamily::new("Table1", "Standard1", ColumnType::Standard, ComparatorType::Name);
        for i in 1..=6 {
            cf.add(Column::new(format!("col{i}"), "v", 1));
        }
        let row = SerializedRow::parse(Slice::from(encode_row(&cf)), ComparatorType::Name).unwrap();
        let filter = QueryFilter::slice("col5", "col2", true, 3);
        let selection = filter
            .select(row.len(), ComparatorType::Name.comparator(), |i| row.name_at(i))
            .unwrap();

        let names: Vec<_> = TableIterator::new(row, selection)
            .map(|e| e.unwrap().name().to_string())
            .collect();
        assert_eq!(names, ["col5", "col4", "col3"]);
    }
}
