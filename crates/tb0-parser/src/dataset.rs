//! Whole-table reading.

use crate::header::{parse_header, Tb0Header, WriterInfo};
use crate::rows::read_rows;
use crate::writer::Tb0Writer;
use ensim_common::{Diagnostics, EnsimError, EnsimResult, LineReader};
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Write};
use std::path::Path;
use tracing::info;

/// A table held in memory, one `Vec` per record.
#[derive(Debug, Clone, PartialEq)]
pub struct Tb0Dataset {
    pub header: Tb0Header,
    pub rows: Vec<Vec<f64>>,
}

impl Tb0Dataset {
    pub fn record_count(&self) -> usize {
        self.rows.len()
    }

    /// All values of one column, in record order.
    ///
    /// `None` when the column does not exist or a row is too short to hold it.
    pub fn column_values(&self, position: usize) -> Option<Vec<f64>> {
        if position >= self.header.column_count() {
            return None;
        }
        self.rows.iter().map(|row| row.get(position).copied()).collect()
    }

    /// Write the whole table.
    pub fn write_to<W: Write>(&self, out: W, info: &WriterInfo) -> EnsimResult<W> {
        let mut writer = Tb0Writer::new(out, &self.header, info)?;
        for row in &self.rows {
            writer.append_row(row)?;
        }
        writer.finish()
    }
}

/// Read a complete table from any buffered source.
pub fn read_tb0<R: BufRead>(input: R, diagnostics: &mut Diagnostics) -> EnsimResult<Tb0Dataset> {
    let mut lines = LineReader::new(input);
    let header = parse_header(&mut lines, diagnostics)?;
    let rows = read_rows(&mut lines, header.column_count()).collect::<EnsimResult<Vec<_>>>()?;
    Ok(Tb0Dataset { header, rows })
}

/// Read a complete table held in memory.
pub fn read_tb0_str(text: &str, diagnostics: &mut Diagnostics) -> EnsimResult<Tb0Dataset> {
    read_tb0(Cursor::new(text), diagnostics)
}

/// Read a complete table file.
pub fn read_tb0_file(path: impl AsRef<Path>, diagnostics: &mut Diagnostics) -> EnsimResult<Tb0Dataset> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(EnsimError::FileNotFound(path.to_path_buf()));
    }
    let dataset = read_tb0(BufReader::new(File::open(path)?), diagnostics)?;
    info!(
        path = %path.display(),
        columns = dataset.header.column_count(),
        records = dataset.record_count(),
        "Read tb0 dataset"
    );
    Ok(dataset)
}
