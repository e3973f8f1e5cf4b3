use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Backend primary keys (Django auto fields).
pub type DbId = i64;

/// Schooldays are numbered 1 (Monday) through 6 (Saturday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Weekday(u8);

impl Weekday {
    pub const MONDAY: Weekday = Weekday(1);
    pub const TUESDAY: Weekday = Weekday(2);
    pub const WEDNESDAY: Weekday = Weekday(3);
    pub const THURSDAY: Weekday = Weekday(4);
    pub const FRIDAY: Weekday = Weekday(5);
    pub const SATURDAY: Weekday = Weekday(6);

    /// Grid column order.
    pub const ALL: [Weekday; 6] = [
        Self::MONDAY,
        Self::TUESDAY,
        Self::WEDNESDAY,
        Self::THURSDAY,
        Self::FRIDAY,
        Self::SATURDAY,
    ];

    /// Returns `None` for anything outside 1..=6.
    pub fn new(number: u8) -> Option<Self> {
        (1..=6).contains(&number).then_some(Self(number))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Monday",
            2 => "Tuesday",
            3 => "Wednesday",
            4 => "Thursday",
            5 => "Friday",
            _ => "Saturday",
        }
    }
}

impl TryFrom<u8> for Weekday {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
            .ok_or_else(|| CoreError::Validation(format!("weekday must be 1..=6, got {value}")))
    }
}

impl From<Weekday> for u8 {
    fn from(value: Weekday) -> Self {
        value.0
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Address of one grid cell: a weekday column and a 1-based period row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey {
    pub weekday: Weekday,
    pub period: u8,
}

impl CellKey {
    pub fn new(weekday: Weekday, period: u8) -> Self {
        Self { weekday, period }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.weekday, self.period)
    }
}
