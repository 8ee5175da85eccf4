//! Collaborator interfaces: where fields come from and how they are
//! moved onto a target grid.

use crate::error::SourceError;
use chrono::NaiveDateTime;
use drainage::Coordinates;
use ensim_common::{GridArray, GridHeader};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one 2-D field in a source archive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldKey {
    pub variable: String,
    pub label: Option<String>,
    pub level: Option<i32>,
    pub valid_time: Option<NaiveDateTime>,
}

impl FieldKey {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            label: None,
            level: None,
            valid_time: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = Some(level);
        self
    }

    pub fn at(mut self, time: NaiveDateTime) -> Self {
        self.valid_time = Some(time);
        self
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.variable)?;
        if let Some(label) = &self.label {
            write!(f, " label={}", label)?;
        }
        if let Some(level) = self.level {
            write!(f, " level={}", level)?;
        }
        if let Some(time) = &self.valid_time {
            write!(f, " at {}", ensim_common::format_timestamp(time))?;
        }
        Ok(())
    }
}

/// A field on its native grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceField {
    pub key: FieldKey,
    pub grid: GridHeader,
    pub data: GridArray,
}

impl SourceField {
    /// True when the field already lies on `target` and needs no resampling.
    pub fn is_on(&self, target: &GridHeader) -> bool {
        self.grid == *target
    }
}

/// Interpolation used when resampling a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Nearest neighbor (preserves exact values).
    #[default]
    Nearest,
    Linear,
    Cubic,
}

impl Interpolation {
    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Some(Self::Nearest),
            "linear" | "bilinear" => Some(Self::Linear),
            "cubic" | "bicubic" => Some(Self::Cubic),
            _ => None,
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest => write!(f, "nearest"),
            Self::Linear => write!(f, "linear"),
            Self::Cubic => write!(f, "cubic"),
        }
    }
}

/// Reads named fields from an archive.
pub trait FieldSource {
    /// Fetch the field identified by `key`, or `FieldNotFound`.
    fn read_field(&self, key: &FieldKey) -> Result<SourceField, SourceError>;
}

/// Maps fields from their native grid onto another grid.
pub trait Resampler {
    /// Resample `field` onto `target`, returning an array shaped to it.
    fn resample(
        &self,
        field: &SourceField,
        target: &GridHeader,
        kind: Interpolation,
    ) -> Result<GridArray, SourceError>;

    /// Cell-centre coordinates of `target`, for grids whose coordinates
    /// cannot be derived from the header alone.
    fn coordinates(&self, _target: &GridHeader) -> Option<Coordinates> {
        None
    }
}
