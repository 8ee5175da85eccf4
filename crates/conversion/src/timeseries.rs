//! Time loop converting source fields into multi-frame grid datasets.

use crate::error::{ConversionError, Result};
use crate::field::ConversionField;
use crate::source::{FieldSource, Resampler};
use chrono::{Duration, NaiveDateTime};
use ensim_common::{format_timestamp, GridHeader};
use r2c_parser::{R2cWriter, WriterInfo};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Converts fields over `[start, stop)` at a fixed step onto one grid.
#[derive(Debug, Clone)]
pub struct TimeSeriesConversion {
    pub target: GridHeader,
    pub start: NaiveDateTime,
    pub stop: NaiveDateTime,
    pub step: Duration,
    pub info: WriterInfo,
}

impl TimeSeriesConversion {
    pub fn new(target: GridHeader, start: NaiveDateTime, stop: NaiveDateTime, step: Duration) -> Self {
        Self {
            target,
            start,
            stop,
            step,
            info: WriterInfo::default(),
        }
    }

    pub fn with_info(mut self, info: WriterInfo) -> Self {
        self.info = info;
        self
    }

    /// Valid times of every frame.
    pub fn times(&self) -> Result<Vec<NaiveDateTime>> {
        if self.step <= Duration::zero() {
            return Err(ConversionError::Invalid(format!(
                "time step must be positive, got {} seconds",
                self.step.num_seconds()
            )));
        }
        let mut times = Vec::new();
        let mut t = self.start;
        while t < self.stop {
            times.push(t);
            t += self.step;
        }
        Ok(times)
    }

    /// Append one frame per step of `field` to `out`.
    ///
    /// Returns the writer and the number of frames written. A missing
    /// source field stops the run with `FieldNotFound`.
    pub fn run<W: Write>(
        &self,
        field: &ConversionField,
        source: &dyn FieldSource,
        resampler: &dyn Resampler,
        out: W,
    ) -> Result<(W, usize)> {
        let times = self.times()?;
        let mut writer = R2cWriter::new(
            out,
            &self.target,
            std::slice::from_ref(&field.attribute),
            None,
            &self.info,
        )?;
        for time in times {
            let frame = field.fetch(source, resampler, &self.target, Some(time), self.step)?;
            let index = writer.append_frame(time, &frame)?;
            debug!(
                attribute = %field.attribute.name,
                frame = index,
                time = %format_timestamp(&time),
                "Appended frame"
            );
        }
        let frames = writer.frame_count();
        let out = writer.finish()?;
        info!(attribute = %field.attribute.name, frames, "Converted time series");
        Ok((out, frames))
    }

    /// Like [`run`](Self::run), writing to a new file at `path`.
    pub fn run_to_file(
        &self,
        field: &ConversionField,
        source: &dyn FieldSource,
        resampler: &dyn Resampler,
        path: impl AsRef<Path>,
    ) -> Result<usize> {
        let file = std::fs::File::create(path.as_ref())?;
        let (_, frames) = self.run(field, source, resampler, std::io::BufWriter::new(file))?;
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_times_exclude_stop() {
        let conversion = TimeSeriesConversion::new(
            GridHeader::lat_long(0.0, 0.0, 1, 1, 1.0, 1.0),
            at(0),
            at(3),
            Duration::hours(1),
        );
        assert_eq!(conversion.times().unwrap(), vec![at(0), at(1), at(2)]);
    }

    #[test]
    fn test_empty_window() {
        let conversion = TimeSeriesConversion::new(
            GridHeader::lat_long(0.0, 0.0, 1, 1, 1.0, 1.0),
            at(3),
            at(3),
            Duration::hours(1),
        );
        assert!(conversion.times().unwrap().is_empty());
    }

    #[test]
    fn test_non_positive_step_is_rejected() {
        let conversion = TimeSeriesConversion::new(
            GridHeader::lat_long(0.0, 0.0, 1, 1, 1.0, 1.0),
            at(0),
            at(3),
            Duration::zero(),
        );
        assert!(matches!(conversion.times(), Err(ConversionError::Invalid(_))));
    }
}
