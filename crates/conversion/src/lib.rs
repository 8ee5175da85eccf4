//! Conversion of external fields onto EnSim grids.
//!
//! Field archives and resampling are consumed through the [`FieldSource`]
//! and [`Resampler`] traits. On top of them this crate provides
//! per-attribute transforms ([`ConversionField`]), a time loop writing one
//! multi-frame dataset per field ([`TimeSeriesConversion`]) and assembly
//! of drainage databases ([`build_drainage_database`]).

pub mod database;
pub mod error;
pub mod field;
pub mod source;
pub mod timeseries;

pub use database::{build_drainage_database, DatabaseRequest, VEGETATION_CLASSES};
pub use error::{ConversionError, Result, SourceError};
pub use field::ConversionField;
pub use source::{FieldKey, FieldSource, Interpolation, Resampler, SourceField};
pub use timeseries::TimeSeriesConversion;
