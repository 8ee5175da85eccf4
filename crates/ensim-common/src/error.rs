//! Error types for EnSim dataset processing.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using EnsimError.
pub type EnsimResult<T> = Result<T, EnsimError>;

/// Broad class of an [`EnsimError`].
///
/// Both `Format` and `Precondition` failures abort processing of the current
/// dataset. Neither is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed header or body structure.
    Format,
    /// Required input missing or inconsistent with the requested operation.
    Precondition,
    /// Underlying I/O failure.
    Io,
}

/// Primary error type for reading, writing and delineating datasets.
#[derive(Debug, Error)]
pub enum EnsimError {
    // === Format Errors ===
    #[error("format error at line {line}: {message}")]
    Format { line: usize, message: String },

    #[error("not a grid dataset: missing ':EndHeader' (read {line} lines)")]
    MissingEndHeader { line: usize },

    #[error("not a grid dataset: missing required header key ':{0}'")]
    MissingHeaderKey(&'static str),

    // === Precondition Errors ===
    #[error("required attribute not found: {0}")]
    MissingAttribute(String),

    #[error("input file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("gauge '{gauge}' at ({x}, {y}) lies outside the grid")]
    GaugeOutsideGrid { gauge: String, x: f64, y: f64 },

    #[error("gauge '{gauge}' maps to inactive cell ({x}, {y}) where Rank is 0")]
    GaugeOnInactiveCell { gauge: String, x: usize, y: usize },

    #[error("invalid drainage topology: {0}")]
    InvalidTopology(String),

    #[error("unsupported projection: {0}")]
    UnsupportedProjection(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // === Infrastructure Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EnsimError {
    /// Create a format error at the given 1-based line number.
    pub fn format(line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid topology error.
    pub fn topology(message: impl Into<String>) -> Self {
        Self::InvalidTopology(message.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EnsimError::Format { .. }
            | EnsimError::MissingEndHeader { .. }
            | EnsimError::MissingHeaderKey(_) => ErrorKind::Format,

            EnsimError::MissingAttribute(_)
            | EnsimError::FileNotFound(_)
            | EnsimError::GaugeOutsideGrid { .. }
            | EnsimError::GaugeOnInactiveCell { .. }
            | EnsimError::InvalidTopology(_)
            | EnsimError::UnsupportedProjection(_)
            | EnsimError::InvalidArgument(_) => ErrorKind::Precondition,

            EnsimError::Io(_) => ErrorKind::Io,
        }
    }

    pub fn is_format(&self) -> bool {
        self.kind() == ErrorKind::Format
    }

    pub fn is_precondition(&self) -> bool {
        self.kind() == ErrorKind::Precondition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(EnsimError::format(3, "bad").kind(), ErrorKind::Format);
        assert_eq!(
            EnsimError::MissingEndHeader { line: 10 }.kind(),
            ErrorKind::Format
        );
        assert!(EnsimError::MissingAttribute("Rank".into()).is_precondition());
        assert!(EnsimError::GaugeOutsideGrid {
            gauge: "02HA003".into(),
            x: 0.0,
            y: 0.0
        }
        .is_precondition());
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(EnsimError::from(io).kind(), ErrorKind::Io);
    }

    #[test]
    fn test_gauge_errors_name_the_gauge() {
        let err = EnsimError::GaugeOnInactiveCell {
            gauge: "05BB001".into(),
            x: 2,
            y: 4,
        };
        assert!(err.to_string().contains("05BB001"));
    }

    #[test]
    fn test_format_error_reports_line() {
        let err = EnsimError::format(42, "expected ':EndFrame'");
        assert_eq!(
            err.to_string(),
            "format error at line 42: expected ':EndFrame'"
        );
    }
}
