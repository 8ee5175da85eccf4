//! Timestamp handling for frame tags and table headers.
//!
//! Both dataset formats write times as `yyyy/mm/dd HH:MM:SS`, optionally
//! with fractional seconds and surrounding quotes.

use chrono::NaiveDateTime;
use std::fmt;

const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Parse a dataset timestamp. Fractional seconds are ignored.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim().trim_matches('"').trim();
    let whole = match trimmed.rfind('.') {
        // Only strip a fraction that follows the seconds field
        Some(dot) if trimmed[..dot].contains(':') => &trimmed[..dot],
        _ => trimmed,
    };
    NaiveDateTime::parse_from_str(whole, TIMESTAMP_FORMAT).ok()
}

/// Format a timestamp the way dataset headers and frame tags expect.
pub fn format_timestamp(t: &NaiveDateTime) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

/// A table time step: either a plain count or a clock duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeStep {
    /// Integer step, unit implied by the consumer (usually hours).
    Steps(i64),
    /// `HH:MM:SS` duration, stored in seconds.
    Clock(i64),
}

impl TimeStep {
    /// Parse `3` or `01:00:00`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.contains(':') {
            let mut parts = s.split(':');
            let h: i64 = parts.next()?.parse().ok()?;
            let m: i64 = parts.next()?.parse().ok()?;
            let sec: i64 = parts.next()?.parse().ok()?;
            if parts.next().is_some() || !(0..60).contains(&m) || !(0..60).contains(&sec) {
                return None;
            }
            Some(TimeStep::Clock(h * 3600 + m * 60 + sec))
        } else {
            s.parse().ok().map(TimeStep::Steps)
        }
    }
}

impl fmt::Display for TimeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeStep::Steps(n) => write!(f, "{}", n),
            TimeStep::Clock(secs) => write!(
                f,
                "{:02}:{:02}:{:02}",
                secs / 3600,
                (secs % 3600) / 60,
                secs % 60
            ),
        }
    }
}
