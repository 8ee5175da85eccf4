//! Error types for field conversion.

use ensim_common::EnsimError;
use thiserror::Error;

/// Failures reported by a field source or resampler.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SourceError {
    #[error("field not found: {0}")]
    FieldNotFound(String),

    #[error("resampling failed: {0}")]
    ResampleFailed(String),
}

/// Errors that can occur while converting fields or building databases.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error(transparent)]
    Dataset(#[from] EnsimError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("invalid conversion: {0}")]
    Invalid(String),
}

impl From<std::io::Error> for ConversionError {
    fn from(err: std::io::Error) -> Self {
        ConversionError::Dataset(EnsimError::Io(err))
    }
}

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, ConversionError>;
