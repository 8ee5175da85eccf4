//! Whole-dataset reading and writing.

use crate::attribute::AttributeSpec;
use crate::body::{detect_frame_mode, read_single_frame, Frame, FrameMode, FrameReader};
use crate::header::{parse_header, Banner, HeaderBlock, WriterInfo};
use crate::writer::R2cWriter;
use ensim_common::{DrainageMeta, EnsimError, EnsimResult, GridArray, GridHeader, LineReader};
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Write};
use std::path::Path;
use tracing::{debug, info};

/// Data held by a dataset. The variant fixes the frame mode.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// One array per attribute, in declaration order.
    SingleFrame(Vec<GridArray>),
    /// Frames of the single attribute in file order. Reading does not
    /// require increasing times; writing does.
    MultiFrame(Vec<Frame>),
}

/// A grid dataset held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct R2cDataset {
    pub banner: Banner,
    pub grid: GridHeader,
    pub meta: Option<DrainageMeta>,
    pub attributes: Vec<AttributeSpec>,
    pub payload: Payload,
}

impl R2cDataset {
    /// An empty single-frame dataset on `grid`.
    pub fn new(grid: GridHeader) -> Self {
        Self {
            banner: Banner::default(),
            grid,
            meta: None,
            attributes: Vec::new(),
            payload: Payload::SingleFrame(Vec::new()),
        }
    }

    pub fn frame_mode(&self) -> FrameMode {
        match self.payload {
            Payload::SingleFrame(_) => FrameMode::Single,
            Payload::MultiFrame(_) => FrameMode::Multi,
        }
    }

    /// Position of the attribute with this name, ignoring case.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.is_named(name))
    }

    /// Single-frame array of the named attribute.
    pub fn array(&self, name: &str) -> Option<&GridArray> {
        let position = self.position(name)?;
        match &self.payload {
            Payload::SingleFrame(arrays) => arrays.get(position),
            Payload::MultiFrame(_) => None,
        }
    }

    /// Like [`array`](Self::array) but a missing attribute is an error.
    pub fn require(&self, name: &str) -> EnsimResult<&GridArray> {
        self.array(name)
            .ok_or_else(|| EnsimError::MissingAttribute(name.to_string()))
    }

    /// Single-frame attributes paired with their arrays.
    pub fn single_frame(&self) -> impl Iterator<Item = (&AttributeSpec, &GridArray)> {
        let arrays: &[GridArray] = match &self.payload {
            Payload::SingleFrame(arrays) => arrays,
            Payload::MultiFrame(_) => &[],
        };
        self.attributes.iter().zip(arrays.iter())
    }

    /// Frames of a multi-frame dataset; empty for single-frame data.
    pub fn frames(&self) -> &[Frame] {
        match &self.payload {
            Payload::MultiFrame(frames) => frames,
            Payload::SingleFrame(_) => &[],
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

    /// Insert a single-frame attribute at `position` (clamped to the end).
    pub fn insert_attribute(
        &mut self,
        position: usize,
        spec: AttributeSpec,
        array: GridArray,
    ) -> EnsimResult<()> {
        self.check_shape(&array)?;
        let Payload::SingleFrame(arrays) = &mut self.payload else {
            return Err(EnsimError::InvalidArgument(
                "cannot add attributes to a multi-frame dataset".to_string(),
            ));
        };
        let position = position.min(arrays.len());
        arrays.insert(position, array);
        self.attributes.insert(position, spec);
        Ok(())
    }

    /// Append a single-frame attribute.
    pub fn push_attribute(&mut self, spec: AttributeSpec, array: GridArray) -> EnsimResult<()> {
        self.insert_attribute(usize::MAX, spec, array)
    }

    /// Order frames by time and renumber them from 1.
    ///
    /// Frames sharing a timestamp stay in file order and still fail to
    /// write.
    pub fn sort_frames(&mut self) {
        if let Payload::MultiFrame(frames) = &mut self.payload {
            frames.sort_by_key(|frame| frame.timestamp);
            for (i, frame) in frames.iter_mut().enumerate() {
                frame.index = i + 1;
            }
        }
    }

    /// Write the whole dataset.
    ///
    /// Frame times must strictly increase. A dataset read from a file with
    /// frames out of order needs [`sort_frames`](Self::sort_frames) first.
    pub fn write_to<W: Write>(&self, out: W, info: &WriterInfo) -> EnsimResult<W> {
        let mut writer = R2cWriter::new(out, &self.grid, &self.attributes, self.meta.as_ref(), info)?;
        match &self.payload {
            Payload::SingleFrame(arrays) => writer.append_single_frame(arrays)?,
            Payload::MultiFrame(frames) => {
                for frame in frames {
                    writer.append_frame(frame.timestamp, &frame.data)?;
                }
            }
        }
        writer.finish()
    }

    /// Write the whole dataset to a file, replacing any existing one.
    pub fn write_file(&self, path: impl AsRef<Path>, info: &WriterInfo) -> EnsimResult<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        self.write_to(std::io::BufWriter::new(file), info)?;
        info!(path = %path.display(), attributes = self.attributes.len(), "Wrote r2c dataset");
        Ok(())
    }
}

/// Streaming reader: header first, then the body on demand.
pub struct R2cReader<R> {
    lines: LineReader<R>,
    header: HeaderBlock,
    mode: FrameMode,
}

impl<R: BufRead> R2cReader<R> {
    /// Parse the header and detect the body layout.
    pub fn new(input: R) -> EnsimResult<Self> {
        let mut lines = LineReader::new(input);
        let mut header = parse_header(&mut lines)?;
        let mode = detect_frame_mode(&mut lines)?;
        if mode == FrameMode::Multi {
            match header.attributes.len() {
                0 => header.attributes.push(AttributeSpec::new("Attribute1")),
                1 => {}
                n => {
                    return Err(EnsimError::format(
                        lines.line_number() + 1,
                        format!("multi-frame dataset declares {} attributes, expected 1", n),
                    ))
                }
            }
        }
        debug!(
            attributes = header.attributes.len(),
            mode = ?mode,
            "Parsed r2c header"
        );
        Ok(Self {
            lines,
            header,
            mode,
        })
    }

    pub fn header(&self) -> &HeaderBlock {
        &self.header
    }

    pub fn mode(&self) -> FrameMode {
        self.mode
    }

    /// Read one block per declared attribute.
    pub fn read_single_frame(&mut self) -> EnsimResult<Vec<GridArray>> {
        if self.mode != FrameMode::Single {
            return Err(EnsimError::InvalidArgument(
                "dataset is multi-frame".to_string(),
            ));
        }
        read_single_frame(&mut self.lines, &self.header.grid, self.header.attributes.len())
    }

    /// Iterate frames lazily. Yields nothing for single-frame datasets.
    pub fn frames(&mut self) -> FrameReader<'_, R> {
        let grid = self.header.grid.clone();
        match self.mode {
            FrameMode::Multi => FrameReader::new(&mut self.lines, grid),
            FrameMode::Single => FrameReader::empty(&mut self.lines, grid),
        }
    }

    /// Read the rest of the dataset into memory.
    pub fn into_dataset(mut self) -> EnsimResult<R2cDataset> {
        let payload = match self.mode {
            FrameMode::Single => Payload::SingleFrame(self.read_single_frame()?),
            FrameMode::Multi => Payload::MultiFrame(self.frames().collect::<EnsimResult<_>>()?),
        };
        let HeaderBlock {
            banner,
            grid,
            meta,
            attributes,
        } = self.header;
        Ok(R2cDataset {
            banner,
            grid,
            meta,
            attributes,
            payload,
        })
    }
}

/// Read a complete dataset from any buffered source.
pub fn read_r2c<R: BufRead>(input: R) -> EnsimResult<R2cDataset> {
    R2cReader::new(input)?.into_dataset()
}

/// Read a complete dataset held in memory.
pub fn read_r2c_str(text: &str) -> EnsimResult<R2cDataset> {
    read_r2c(Cursor::new(text))
}

/// Open a dataset file for streaming.
pub fn open_r2c_file(path: impl AsRef<Path>) -> EnsimResult<R2cReader<BufReader<File>>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(EnsimError::FileNotFound(path.to_path_buf()));
    }
    R2cReader::new(BufReader::new(File::open(path)?))
}

/// Read a complete dataset file.
pub fn read_r2c_file(path: impl AsRef<Path>) -> EnsimResult<R2cDataset> {
    let path = path.as_ref();
    let dataset = open_r2c_file(path)?.into_dataset()?;
    info!(
        path = %path.display(),
        attributes = dataset.attributes.len(),
        frames = dataset.frames().len(),
        "Read r2c dataset"
    );
    Ok(dataset)
}
