//! Common types and utilities shared across the EnSim dataset crates.

pub mod array;
pub mod diagnostics;
pub mod error;
pub mod grid;
pub mod lines;
pub mod time;

pub use array::GridArray;
pub use diagnostics::{Diagnostics, Warning, WarningKind};
pub use error::{EnsimError, EnsimResult, ErrorKind};
pub use grid::{DrainageMeta, GridHeader, Projection, Rotation};
pub use lines::LineReader;
pub use time::{format_timestamp, parse_timestamp, TimeStep};
