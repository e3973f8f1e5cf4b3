//! Period-row constants and the canned bell schedule.

use std::str::FromStr;

use crate::clock::TimeRange;
use crate::error::CoreError;

/// Period count used when none is configured.
pub const DEFAULT_PERIOD_COUNT: usize = 8;

/// Smallest grid the builder will produce.
pub const MIN_PERIODS: usize = 1;

/// Largest grid the builder will produce.
pub const MAX_PERIODS: usize = 12;

const DEFAULT_STARTS: [&str; MAX_PERIODS] = [
    "08:30", "09:25", "10:20", "11:15", "12:10", "13:05", "14:00", "14:55", "15:50", "16:45",
    "17:40", "18:35",
];

const DEFAULT_ENDS: [&str; MAX_PERIODS] = [
    "09:15", "10:10", "11:05", "12:00", "12:55", "13:50", "14:45", "15:40", "16:35", "17:30",
    "18:25", "19:20",
];

/// Clamp a requested period count into `MIN_PERIODS..=MAX_PERIODS`.
pub fn clamp_period_count(requested: usize) -> usize {
    requested.clamp(MIN_PERIODS, MAX_PERIODS)
}

/// How period times are seeded when a grid is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeTemplate {
    /// The school's standard 45-minute bell schedule.
    #[default]
    Default,
    /// Empty times for the editor to fill in.
    Blank,
}

impl FromStr for TimeTemplate {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "blank" => Ok(Self::Blank),
            other => Err(CoreError::Validation(format!(
                "Unknown time template '{other}'. Must be one of: default, blank"
            ))),
        }
    }
}

/// Start and end of one period row, as typed (`HH:MM`, possibly blank).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PeriodTimes {
    pub start: String,
    pub end: String,
}

impl PeriodTimes {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Both fields hold something (not necessarily a valid time).
    pub fn is_set(&self) -> bool {
        !self.start.trim().is_empty() && !self.end.trim().is_empty()
    }

    pub fn range(&self) -> Option<TimeRange> {
        TimeRange::parse(&self.start, &self.end)
    }
}

/// Period times for a freshly built grid of `count` rows.
pub fn template_times(count: usize, template: TimeTemplate) -> Vec<PeriodTimes> {
    let count = clamp_period_count(count);
    match template {
        TimeTemplate::Default => (0..count)
            .map(|i| PeriodTimes::new(DEFAULT_STARTS[i], DEFAULT_ENDS[i]))
            .collect(),
        TimeTemplate::Blank => vec![PeriodTimes::default(); count],
    }
}
