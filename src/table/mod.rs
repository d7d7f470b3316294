pub mod block;
pub mod block_builder;
pub mod format;
pub mod row_format;
pub mod table_builder;
pub mod table_reader;

pub use block::Block;
pub use block_builder::BlockBuilder;
pub use format::{BlockHandle, DEFAULT_BLOCK_SIZE, Footer};
pub use row_format::{encode_row, SerializedRow};
pub use table_builder::{TableBuilder, TableBuilderOptions, TableProperties};
pub use table_reader::TableReader;
