//! Lazy row reading.

use ensim_common::{EnsimError, EnsimResult, LineReader};
use std::io::BufRead;

/// Yields one row of `n` values per call.
///
/// The stream ends quietly at end of file, at a row with fewer than `n`
/// values, or at a `#` comment line. Tokens past the `n`th are ignored.
pub struct RowReader<'a, R> {
    lines: &'a mut LineReader<R>,
    n: usize,
    done: bool,
}

impl<'a, R: BufRead> RowReader<'a, R> {
    pub fn new(lines: &'a mut LineReader<R>, n: usize) -> Self {
        Self {
            lines,
            n,
            done: false,
        }
    }

    fn read_row(&mut self) -> EnsimResult<Option<Vec<f64>>> {
        loop {
            let Some(line) = self.lines.next_line()? else {
                return Ok(None);
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('#') {
                return Ok(None);
            }
            let tokens: Vec<&str> = trimmed.split_whitespace().take(self.n).collect();
            if tokens.len() < self.n {
                return Ok(None);
            }
            let row = tokens
                .iter()
                .map(|token| {
                    token.parse::<f64>().map_err(|_| {
                        EnsimError::format(
                            self.lines.line_number(),
                            format!("invalid numeric value '{}'", token),
                        )
                    })
                })
                .collect::<EnsimResult<Vec<f64>>>()?;
            return Ok(Some(row));
        }
    }
}

impl<R: BufRead> Iterator for RowReader<'_, R> {
    type Item = EnsimResult<Vec<f64>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Read rows of `n` values from the current position.
pub fn read_rows<R: BufRead>(lines: &mut LineReader<R>, n: usize) -> RowReader<'_, R> {
    RowReader::new(lines, n)
}
