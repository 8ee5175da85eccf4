//! Append-only table writer.

use crate::header::{write_header, Tb0Header, WriterInfo};
use ensim_common::{EnsimError, EnsimResult};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct Tb0Writer<W: Write> {
    out: W,
    columns: usize,
    rows: usize,
}

impl Tb0Writer<BufWriter<File>> {
    /// Create (or truncate) a file and write its header.
    pub fn create_file(path: impl AsRef<Path>, header: &Tb0Header, info: &WriterInfo) -> EnsimResult<Self> {
        let file = File::create(path.as_ref())?;
        Self::new(BufWriter::new(file), header, info)
    }
}

impl<W: Write> Tb0Writer<W> {
    pub fn new(mut out: W, header: &Tb0Header, info: &WriterInfo) -> EnsimResult<Self> {
        write_header(&mut out, header, info)?;
        Ok(Self {
            out,
            columns: header.column_count(),
            rows: 0,
        })
    }

    /// Rows appended so far.
    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Append one record, one value per column.
    pub fn append_row(&mut self, values: &[f64]) -> EnsimResult<()> {
        if values.len() != self.columns {
            return Err(EnsimError::InvalidArgument(format!(
                "row has {} values but the table has {} columns",
                values.len(),
                self.columns
            )));
        }
        for value in values {
            write!(self.out, " {}", value)?;
        }
        self.out.write_all(b"\n")?;
        self.rows += 1;
        Ok(())
    }

    /// Flush and hand back the underlying sink.
    pub fn finish(mut self) -> EnsimResult<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
