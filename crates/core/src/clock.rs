//! Wall-clock lesson times.
//!
//! The backend serialises `TimeField`s as `HH:MM:SS` while editors type
//! `HH:MM`; both parse to minutes since midnight. Blank or malformed input
//! yields `None`, which conflict checks treat as "no time" rather than an
//! error.

use std::fmt;

use chrono::{NaiveTime, Timelike};

/// Minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    pub fn from_hm(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then(|| Self(u16::from(hour) * 60 + u16::from(minute)))
    }

    /// Parse `HH:MM` or `HH:MM:SS`. Seconds are discarded.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let time = NaiveTime::parse_from_str(raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
            .ok()?;
        Some(Self((time.hour() * 60 + time.minute()) as u16))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// Truncate a backend time (`08:30:00`) to its `HH:MM` prefix.
pub fn truncate_hhmm(raw: &str) -> String {
    raw.trim().chars().take(5).collect()
}

/// Half-open lesson interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl TimeRange {
    pub fn new(start: ClockTime, end: ClockTime) -> Self {
        Self { start, end }
    }

    /// Both ends must parse; ordering is not checked here.
    pub fn parse(start: &str, end: &str) -> Option<Self> {
        Some(Self::new(ClockTime::parse(start)?, ClockTime::parse(end)?))
    }

    /// An interval whose start is not before its end covers no time.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Strict overlap: touching endpoints do not count.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\u{2013}{}", self.start, self.end)
    }
}
