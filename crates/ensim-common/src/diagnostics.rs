//! Non-fatal data quality warnings.
//!
//! Operations that can tolerate suspicious input push a [`Warning`] here and
//! keep going. Each warning is also emitted through `tracing` at the moment
//! it is recorded, so a caller that only wants logs can drop the collector.

use std::fmt;
use tracing::warn;

/// Category of a data quality warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// Table metadata lines disagree on how many columns there are.
    InconsistentColumnCount,
    ZeroGridArea,
    ZeroDrainageArea,
    ZeroChannelSlope,
    ZeroChannelLength,
    /// No cell drains out of the grid.
    NoOutlet,
    /// Active ranks are not the contiguous range `1..=N`.
    DiscontinuousRank,
    /// Land cover fractions of a subbasin summed to zero.
    ZeroLandCoverFraction,
    /// An optional source field was absent and defaulted.
    MissingSourceField,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WarningKind::InconsistentColumnCount => "inconsistent_column_count",
            WarningKind::ZeroGridArea => "zero_grid_area",
            WarningKind::ZeroDrainageArea => "zero_drainage_area",
            WarningKind::ZeroChannelSlope => "zero_channel_slope",
            WarningKind::ZeroChannelLength => "zero_channel_length",
            WarningKind::NoOutlet => "no_outlet",
            WarningKind::DiscontinuousRank => "discontinuous_rank",
            WarningKind::ZeroLandCoverFraction => "zero_land_cover_fraction",
            WarningKind::MissingSourceField => "missing_source_field",
        };
        f.write_str(name)
    }
}

/// A single recorded warning.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Collector of warnings raised while processing one dataset.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and log it.
    pub fn push(&mut self, kind: WarningKind, message: impl Into<String>) {
        let message = message.into();
        warn!(kind = %kind, "{}", message);
        self.warnings.push(Warning { kind, message });
    }

    /// Take over the warnings of another collector without logging them again.
    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.warnings.iter()
    }

    /// Number of warnings of the given kind.
    pub fn count(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }

    pub fn has(&self, kind: WarningKind) -> bool {
        self.count(kind) > 0
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }

    /// Recap every accumulated warning at `warn` level.
    pub fn report(&self) {
        if self.warnings.is_empty() {
            return;
        }
        warn!(count = self.warnings.len(), "data quality warnings recorded");
        for warning in &self.warnings {
            warn!(kind = %warning.kind, "{}", warning.message);
        }
    }

    /// One line per warning, suitable for a summary printout.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for warning in &self.warnings {
            out.push_str(&warning.to_string());
            out.push('\n');
        }
        out
    }
}
