//! Single-frame and multi-frame data blocks.
//!
//! A block is `xCount * yCount` whitespace-separated numbers in file order
//! (rows of constant `y`, `x` fastest). Blocks may wrap across lines.

use chrono::NaiveDateTime;
use ensim_common::lines::tokenize;
use ensim_common::{parse_timestamp, EnsimError, EnsimResult, GridArray, GridHeader, LineReader};
use std::io::BufRead;

/// Layout of a dataset body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMode {
    /// One untagged block per attribute.
    Single,
    /// `:Frame` / block / `:EndFrame` repeated for one attribute.
    Multi,
}

/// One time-stamped array of a multi-frame dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// 1-based position in the file; tag values are not trusted.
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub data: GridArray,
}

fn is_directive(line: &str, keyword: &str) -> bool {
    line.split_whitespace()
        .next()
        .map(|token| token.trim_start_matches(':').eq_ignore_ascii_case(keyword))
        .unwrap_or(false)
}

/// Peek past blank and comment lines to decide how the body is laid out.
///
/// The `:Frame` line itself is left unread.
pub fn detect_frame_mode<R: BufRead>(lines: &mut LineReader<R>) -> EnsimResult<FrameMode> {
    let mode = match lines.peek_content()? {
        Some(line) if is_directive(line, "frame") => FrameMode::Multi,
        _ => FrameMode::Single,
    };
    Ok(mode)
}

/// Reads numeric blocks, carrying surplus tokens from a line into the next block.
struct BlockReader<'a, R> {
    lines: &'a mut LineReader<R>,
    pending: Vec<f64>,
}

impl<'a, R: BufRead> BlockReader<'a, R> {
    fn new(lines: &'a mut LineReader<R>) -> Self {
        Self {
            lines,
            pending: Vec::new(),
        }
    }

    fn read_block(&mut self, header: &GridHeader) -> EnsimResult<GridArray> {
        let count = header.cell_count();
        let mut values = std::mem::take(&mut self.pending);
        while values.len() < count {
            let Some(line) = self.lines.peek_content()? else {
                return Err(self.lines.error(format!(
                    "unexpected end of data: expected {} values, found {}",
                    count,
                    values.len()
                )));
            };
            if line.trim_start().starts_with(':') {
                let found = line.trim().to_string();
                return Err(EnsimError::format(
                    self.lines.line_number() + 1,
                    format!(
                        "expected {} values, found {} before '{}'",
                        count,
                        values.len(),
                        found
                    ),
                ));
            }
            let line = self.lines.next_line()?.unwrap_or_default();
            for token in line.split_whitespace() {
                let value: f64 = token.parse().map_err(|_| {
                    self.lines
                        .error(format!("invalid numeric value '{}'", token))
                })?;
                values.push(value);
            }
        }
        self.pending = values.split_off(count);
        GridArray::from_rows(header.x_count, header.y_count, values)
    }

    fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Read `n` consecutive untagged blocks, then require the body to end.
pub fn read_single_frame<R: BufRead>(
    lines: &mut LineReader<R>,
    header: &GridHeader,
    n: usize,
) -> EnsimResult<Vec<GridArray>> {
    let mut reader = BlockReader::new(lines);
    let mut arrays = Vec::with_capacity(n);
    for _ in 0..n {
        arrays.push(reader.read_block(header)?);
    }
    if reader.has_pending() || lines_remaining(reader.lines)? {
        return Err(reader.lines.error(format!(
            "data continues after {} attribute block(s)",
            n
        )));
    }
    Ok(arrays)
}

fn lines_remaining<R: BufRead>(lines: &mut LineReader<R>) -> EnsimResult<bool> {
    Ok(lines.peek_content()?.is_some())
}

/// Read every remaining frame into memory.
pub fn read_multi_frame<R: BufRead>(
    lines: &mut LineReader<R>,
    header: &GridHeader,
) -> EnsimResult<Vec<Frame>> {
    FrameReader::new(lines, header.clone()).collect()
}

/// Lazy frame-by-frame reader over a multi-frame body.
pub struct FrameReader<'a, R> {
    lines: &'a mut LineReader<R>,
    header: GridHeader,
    count: usize,
    done: bool,
}

impl<'a, R: BufRead> FrameReader<'a, R> {
    pub fn new(lines: &'a mut LineReader<R>, header: GridHeader) -> Self {
        Self {
            lines,
            header,
            count: 0,
            done: false,
        }
    }

    /// A reader that yields nothing.
    pub(crate) fn empty(lines: &'a mut LineReader<R>, header: GridHeader) -> Self {
        let mut reader = Self::new(lines, header);
        reader.done = true;
        reader
    }

    /// Frames read so far.
    pub fn count(&self) -> usize {
        self.count
    }

    fn read_frame(&mut self) -> EnsimResult<Option<Frame>> {
        let Some(line) = self.lines.next_content()? else {
            return Ok(None);
        };
        let line_number = self.lines.line_number();
        if !is_directive(&line, "frame") {
            return Err(EnsimError::format(
                line_number,
                format!("expected ':Frame', found '{}'", line.trim()),
            ));
        }
        let tokens = tokenize(&line, line_number)?;
        if tokens.len() < 4 {
            return Err(EnsimError::format(line_number, "':Frame' is missing its timestamp"));
        }
        let stamp = tokens[3..].join(" ");
        let timestamp = parse_timestamp(&stamp).ok_or_else(|| {
            EnsimError::format(line_number, format!("invalid frame timestamp '{}'", stamp))
        })?;

        let mut blocks = BlockReader::new(&mut *self.lines);
        let data = blocks.read_block(&self.header)?;
        if blocks.has_pending() {
            return Err(self.lines.error("expected ':EndFrame' after frame data"));
        }

        match self.lines.next_content()? {
            Some(end) if is_directive(&end, "endframe") => {}
            Some(other) => {
                return Err(self.lines.error(format!(
                    "expected ':EndFrame', found '{}'",
                    other.trim()
                )))
            }
            None => return Err(self.lines.error("expected ':EndFrame', found end of file")),
        }

        self.count += 1;
        Ok(Some(Frame {
            index: self.count,
            timestamp,
            data,
        }))
    }
}

impl<R: BufRead> Iterator for FrameReader<'_, R> {
    type Item = EnsimResult<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_frame() {
            Ok(frame) => frame.map(Ok),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
