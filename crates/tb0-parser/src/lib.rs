//! Reader and writer for EnSim tb0 table datasets.
//!
//! A tb0 file is a text header with a `:ColumnMetaData` block describing
//! each column (name, type, units and location), followed by one
//! whitespace-separated row per record.

pub mod dataset;
pub mod header;
pub mod rows;
pub mod writer;

pub use dataset::{read_tb0, read_tb0_file, read_tb0_str, Tb0Dataset};
pub use header::{
    parse_columns, parse_header, parse_header_str, read_header_lines, scan_column_count,
    write_header, HeaderLine, TableColumn, Tb0Header, Tb0Meta, WriterInfo,
};
pub use rows::{read_rows, RowReader};
pub use writer::Tb0Writer;
