//! One output attribute and how to derive it from a source field.

use crate::error::{Result, SourceError};
use crate::source::{FieldKey, FieldSource, Interpolation, Resampler};
use chrono::{Duration, NaiveDateTime};
use ensim_common::{GridArray, GridHeader};
use r2c_parser::AttributeSpec;
use tracing::debug;

/// Describes how one output attribute is produced.
///
/// Values are transformed as `value * scale + offset`, then clipped to
/// `[min, max]` where those bounds are set.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionField {
    pub attribute: AttributeSpec,
    pub variable: String,
    pub label: Option<String>,
    pub level: Option<i32>,
    pub interpolation: Interpolation,
    pub scale: f64,
    pub offset: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Source values are accumulations; output the change over one step.
    pub deaccumulate: bool,
}

impl ConversionField {
    pub fn new(variable: impl Into<String>, attribute: AttributeSpec) -> Self {
        Self {
            attribute,
            variable: variable.into(),
            label: None,
            level: None,
            interpolation: Interpolation::Nearest,
            scale: 1.0,
            offset: 0.0,
            min: None,
            max: None,
            deaccumulate: false,
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

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn scaled(mut self, scale: f64, offset: f64) -> Self {
        self.scale = scale;
        self.offset = offset;
        self
    }

    pub fn clipped(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn deaccumulated(mut self) -> Self {
        self.deaccumulate = true;
        self
    }

    /// Source key of this field, optionally at a valid time.
    pub fn key(&self, valid_time: Option<NaiveDateTime>) -> FieldKey {
        FieldKey {
            variable: self.variable.clone(),
            label: self.label.clone(),
            level: self.level,
            valid_time,
        }
    }

    /// Apply the linear transform and clip to one value.
    pub fn transform(&self, value: f64) -> f64 {
        let mut v = value * self.scale + self.offset;
        if let Some(min) = self.min {
            v = v.max(min);
        }
        if let Some(max) = self.max {
            v = v.min(max);
        }
        v
    }

    /// Read the field and bring it onto `target`, untransformed.
    fn fetch_raw(
        &self,
        source: &dyn FieldSource,
        resampler: &dyn Resampler,
        target: &GridHeader,
        valid_time: Option<NaiveDateTime>,
    ) -> Result<GridArray> {
        let key = self.key(valid_time);
        let field = source.read_field(&key)?;
        let data = if field.is_on(target) {
            field.data
        } else {
            debug!(field = %key, interpolation = %self.interpolation, "Resampling field");
            resampler.resample(&field, target, self.interpolation)?
        };
        if data.nx() != target.x_count || data.ny() != target.y_count {
            return Err(SourceError::ResampleFailed(format!(
                "{} came back as {}x{}, target grid is {}x{}",
                key,
                data.nx(),
                data.ny(),
                target.x_count,
                target.y_count
            ))
            .into());
        }
        Ok(data)
    }

    /// Fetch, resample and transform the field at `valid_time`.
    ///
    /// A de-accumulated field also reads the value one `step` earlier and
    /// transforms the difference.
    pub fn fetch(
        &self,
        source: &dyn FieldSource,
        resampler: &dyn Resampler,
        target: &GridHeader,
        valid_time: Option<NaiveDateTime>,
        step: Duration,
    ) -> Result<GridArray> {
        let mut raw = self.fetch_raw(source, resampler, target, valid_time)?;
        if self.deaccumulate {
            let previous_time = valid_time.map(|t| t - step);
            let previous = self.fetch_raw(source, resampler, target, previous_time)?;
            raw = GridArray::from_fn(raw.nx(), raw.ny(), |x, y| raw.get(x, y) - previous.get(x, y));
        }
        Ok(raw.map(|v| self.transform(v)))
    }
}
