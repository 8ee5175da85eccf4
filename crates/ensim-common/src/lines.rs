//! Line-oriented input with line numbers and one line of lookahead.

use crate::error::{EnsimError, EnsimResult};
use std::io::BufRead;

/// Buffered line source that counts lines and can peek one line ahead.
pub struct LineReader<R> {
    inner: R,
    line: usize,
    peeked: Option<String>,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line: 0,
            peeked: None,
        }
    }

    /// 1-based number of the line most recently returned by [`next_line`].
    ///
    /// [`next_line`]: LineReader::next_line
    pub fn line_number(&self) -> usize {
        self.line
    }

    fn read_raw(&mut self) -> EnsimResult<Option<String>> {
        let mut buf = String::new();
        let n = self.inner.read_line(&mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        let trimmed_len = buf.trim_end_matches(['\n', '\r']).len();
        buf.truncate(trimmed_len);
        Ok(Some(buf))
    }

    /// Consume and return the next line without its terminator.
    pub fn next_line(&mut self) -> EnsimResult<Option<String>> {
        let line = match self.peeked.take() {
            Some(line) => Some(line),
            None => self.read_raw()?,
        };
        if line.is_some() {
            self.line += 1;
        }
        Ok(line)
    }

    /// Look at the next line without consuming it.
    pub fn peek_line(&mut self) -> EnsimResult<Option<&str>> {
        if self.peeked.is_none() {
            self.peeked = self.read_raw()?;
        }
        Ok(self.peeked.as_deref())
    }

    /// Consume blank and `#` comment lines, then peek at the next line.
    pub fn peek_content(&mut self) -> EnsimResult<Option<&str>> {
        loop {
            let skip = match self.peek_line()? {
                None => return Ok(None),
                Some(line) => is_ignorable(line),
            };
            if !skip {
                break;
            }
            self.next_line()?;
        }
        self.peek_line()
    }

    /// Consume blank and `#` comment lines and return the next line.
    pub fn next_content(&mut self) -> EnsimResult<Option<String>> {
        self.peek_content()?;
        self.next_line()
    }

    /// Build a format error at the current line.
    pub fn error(&self, message: impl Into<String>) -> EnsimError {
        EnsimError::format(self.line, message)
    }
}

/// Whether a line carries no directive or data.
pub fn is_ignorable(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Split a directive line into tokens, honouring double-quoted values.
pub fn tokenize(line: &str, line_number: usize) -> EnsimResult<Vec<String>> {
    shell_words::split(line.trim())
        .map_err(|e| EnsimError::format(line_number, format!("cannot tokenize line: {}", e)))
}

/// Quote a token for output if it is empty or contains whitespace.
pub fn quote_if_needed(value: &str) -> String {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        format!("\"{}\"", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_peek_does_not_consume() {
        let mut reader = LineReader::new(Cursor::new("a\nb\n"));
        assert_eq!(reader.peek_line().unwrap(), Some("a"));
        assert_eq!(reader.line_number(), 0);
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("a"));
        assert_eq!(reader.line_number(), 1);
        assert_eq!(reader.next_line().unwrap().as_deref(), Some("b"));
        assert_eq!(reader.next_line().unwrap(), None);
        assert_eq!(reader.line_number(), 2);
    }

    #[test]
    fn test_peek_content_skips_comments() {
        let mut reader = LineReader::new(Cursor::new("#x\n\n  \r\n:Frame 1 1\n"));
        assert_eq!(reader.peek_content().unwrap(), Some(":Frame 1 1"));
        assert_eq!(reader.line_number(), 3);
    }

    #[test]
    fn test_tokenize_quoted() {
        let tokens = tokenize(":AttributeName 3 \"1199 sea water\"", 1).unwrap();
        assert_eq!(tokens, vec![":AttributeName", "3", "1199 sea water"]);
        assert!(tokenize(":AttributeName 1 \"open", 7).unwrap_err().is_format());
    }

    #[test]
    fn test_quote_if_needed() {
        assert_eq!(quote_if_needed("Rank"), "Rank");
        assert_eq!(quote_if_needed("sea water"), "\"sea water\"");
        assert_eq!(quote_if_needed(""), "\"\"");
        assert_eq!(tokenize(&format!(":ColumnName A {} B", quote_if_needed("")), 1).unwrap().len(), 4);
    }
}
