mod row;
mod row_mutation;
mod table;

pub use row::Row;
pub use row_mutation::RowMutation;
pub use table::{Table, TableOptions};
