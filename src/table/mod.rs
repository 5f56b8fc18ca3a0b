// src/table/mod.rs
pub mod read;
pub mod write;

pub use read::read_table;
pub use write::{output_file_name, write_table, RESULT_HEADERS};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// The first record of the file, as-is.
    pub headers: Vec<String>,
    /// Every following record, in file order. Lengths may differ.
    pub rows: Vec<Vec<String>>,
}
