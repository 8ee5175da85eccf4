//! Append-only r2c writer.
//!
//! The header is written on construction. Data is appended either as one
//! block per attribute (single-frame) or as time-stamped frames of the sole
//! attribute (multi-frame). Mixing the two on one writer is rejected.

use crate::attribute::AttributeSpec;
use crate::body::FrameMode;
use crate::header::{write_header, WriterInfo};
use chrono::NaiveDateTime;
use ensim_common::{format_timestamp, DrainageMeta, EnsimError, EnsimResult, GridArray, GridHeader};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

pub struct R2cWriter<W: Write> {
    out: W,
    grid: GridHeader,
    attributes: Vec<AttributeSpec>,
    mode: Option<FrameMode>,
    blocks_written: usize,
    frame_count: usize,
    last_timestamp: Option<NaiveDateTime>,
}

impl R2cWriter<BufWriter<File>> {
    /// Create (or truncate) a file and write its header.
    pub fn create_file(
        path: impl AsRef<Path>,
        grid: &GridHeader,
        attributes: &[AttributeSpec],
        meta: Option<&DrainageMeta>,
        info: &WriterInfo,
    ) -> EnsimResult<Self> {
        let file = File::create(path.as_ref())?;
        Self::new(BufWriter::new(file), grid, attributes, meta, info)
    }
}

impl<W: Write> R2cWriter<W> {
    /// Write the header to `out` and return a writer ready for data.
    pub fn new(
        mut out: W,
        grid: &GridHeader,
        attributes: &[AttributeSpec],
        meta: Option<&DrainageMeta>,
        info: &WriterInfo,
    ) -> EnsimResult<Self> {
        write_header(&mut out, grid, attributes, meta, info)?;
        Ok(Self {
            out,
            grid: grid.clone(),
            attributes: attributes.to_vec(),
            mode: None,
            blocks_written: 0,
            frame_count: 0,
            last_timestamp: None,
        })
    }

    /// Frames appended so far.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn enter_mode(&mut self, mode: FrameMode) -> EnsimResult<()> {
        match self.mode {
            Some(current) if current != mode => Err(EnsimError::InvalidArgument(format!(
                "cannot append {:?}-frame data to a {:?}-frame dataset",
                mode, current
            ))),
            _ => {
                self.mode = Some(mode);
                Ok(())
            }
        }
    }

    fn check_shape(&self, array: &GridArray) -> EnsimResult<()> {
        if array.nx() != self.grid.x_count || array.ny() != self.grid.y_count {
            return Err(EnsimError::InvalidArgument(format!(
                "array is {}x{} but the grid is {}x{}",
                array.nx(),
                array.ny(),
                self.grid.x_count,
                self.grid.y_count
            )));
        }
        Ok(())
    }

    fn write_block(&mut self, array: &GridArray) -> EnsimResult<()> {
        for row in array.rows() {
            let mut first = true;
            for value in row {
                if !first {
                    self.out.write_all(b" ")?;
                }
                write!(self.out, "{}", value)?;
                first = false;
            }
            self.out.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Append the block of the next attribute in declaration order.
    pub fn append_attribute(&mut self, array: &GridArray) -> EnsimResult<()> {
        self.enter_mode(FrameMode::Single)?;
        if self.blocks_written >= self.attributes.len() {
            return Err(EnsimError::InvalidArgument(format!(
                "all {} declared attributes have already been written",
                self.attributes.len()
            )));
        }
        self.check_shape(array)?;
        let name = self.attributes[self.blocks_written].display_name(self.blocks_written);
        debug!(attribute = %name, "Writing attribute block");
        self.write_block(array)?;
        self.blocks_written += 1;
        Ok(())
    }

    /// Append one block per declared attribute.
    pub fn append_single_frame(&mut self, arrays: &[GridArray]) -> EnsimResult<()> {
        if arrays.len() + self.blocks_written != self.attributes.len() {
            return Err(EnsimError::InvalidArgument(format!(
                "expected {} attribute arrays, got {}",
                self.attributes.len() - self.blocks_written,
                arrays.len()
            )));
        }
        for array in arrays {
            self.append_attribute(array)?;
        }
        Ok(())
    }

    /// Append one frame of the sole attribute. Returns the frame number.
    ///
    /// Timestamps must strictly increase.
    pub fn append_frame(&mut self, timestamp: NaiveDateTime, array: &GridArray) -> EnsimResult<usize> {
        self.enter_mode(FrameMode::Multi)?;
        if self.attributes.len() != 1 {
            return Err(EnsimError::InvalidArgument(format!(
                "multi-frame datasets hold exactly one attribute, {} declared",
                self.attributes.len()
            )));
        }
        if let Some(last) = self.last_timestamp {
            if timestamp <= last {
                return Err(EnsimError::InvalidArgument(format!(
                    "frame time {} does not follow {}",
                    format_timestamp(&timestamp),
                    format_timestamp(&last)
                )));
            }
        }
        self.check_shape(array)?;

        self.frame_count += 1;
        let n = self.frame_count;
        writeln!(self.out, ":Frame {} {} \"{}\"", n, n, format_timestamp(&timestamp))?;
        self.write_block(array)?;
        writeln!(self.out, ":EndFrame")?;
        self.last_timestamp = Some(timestamp);
        Ok(n)
    }

    /// Flush and hand back the underlying sink.
    pub fn finish(mut self) -> EnsimResult<W> {
        if self.mode == Some(FrameMode::Single) && self.blocks_written < self.attributes.len() {
            return Err(EnsimError::InvalidArgument(format!(
                "only {} of {} attribute blocks were written",
                self.blocks_written,
                self.attributes.len()
            )));
        }
        self.out.flush()?;
        Ok(self.out)
    }
}
