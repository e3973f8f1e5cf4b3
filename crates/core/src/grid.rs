//! Weekly timetable grid for one class.
//!
//! Rows are periods (1-based, shared start/end times across the week),
//! columns are the six schooldays. Each cell remembers the persisted entry
//! it was loaded from so saves can tell creates from updates and deletes.

use std::collections::{BTreeMap, HashMap};

use crate::clock::{truncate_hhmm, ClockTime};
use crate::error::CoreError;
use crate::periods::{clamp_period_count, template_times, PeriodTimes, TimeTemplate};
use crate::schedule::ScheduleEntry;
use crate::types::{CellKey, DbId, Weekday};

/// One weekday + period slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub subject: Option<DbId>,
    pub teacher: Option<DbId>,
    pub room: String,
    /// Entry this cell was loaded from, if any.
    pub backing: Option<ScheduleEntry>,
}

impl Cell {
    pub fn backing_id(&self) -> Option<DbId> {
        self.backing.as_ref().map(|e| e.id)
    }

    /// Room text as compared and saved.
    pub fn room_trimmed(&self) -> &str {
        self.room.trim()
    }

    fn from_entry(entry: ScheduleEntry) -> Self {
        Self {
            subject: Some(entry.subject),
            teacher: Some(entry.teacher),
            room: entry.room.clone().unwrap_or_default(),
            backing: Some(entry),
        }
    }
}

/// Outcome of placing a class's persisted entries onto the grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Entries that landed in a cell.
    pub placed: usize,
    /// Entries beyond the last period row of their weekday.
    pub overflow: Vec<ScheduleEntry>,
    /// Entries whose weekday is outside Monday..Saturday.
    pub invalid_weekday: Vec<ScheduleEntry>,
    /// Placed entries whose stored times differ from their row's period
    /// times. Saving the grid rewrites them to the row's times.
    pub time_mismatch: Vec<TimeMismatch>,
}

/// A placed entry whose stored `HH:MM` times are not its row's times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeMismatch {
    pub cell: CellKey,
    pub entry_id: DbId,
    pub stored_start: String,
    pub stored_end: String,
    pub period_start: String,
    pub period_end: String,
}

impl LoadReport {
    /// Every persisted entry is represented on the grid.
    pub fn is_complete(&self) -> bool {
        self.overflow.is_empty() && self.invalid_weekday.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    periods: Vec<PeriodTimes>,
    cells: BTreeMap<CellKey, Cell>,
}

impl Grid {
    /// Build an empty grid; `period_count` is clamped to 1..=12.
    pub fn build(period_count: usize, template: TimeTemplate) -> Self {
        let count = clamp_period_count(period_count);
        let periods = template_times(count, template);
        let cells = (1..=count as u8)
            .flat_map(|p| Weekday::ALL.map(|wd| (CellKey::new(wd, p), Cell::default())))
            .collect();
        Self { periods, cells }
    }

    pub fn period_count(&self) -> usize {
        self.periods.len()
    }

    /// Times for a 1-based period.
    pub fn period(&self, period: u8) -> Option<&PeriodTimes> {
        usize::from(period)
            .checked_sub(1)
            .and_then(|i| self.periods.get(i))
    }

    pub fn periods(&self) -> &[PeriodTimes] {
        &self.periods
    }

    pub fn set_period_times(
        &mut self,
        period: u8,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Result<(), CoreError> {
        let count = self.period_count();
        let slot = usize::from(period)
            .checked_sub(1)
            .and_then(|i| self.periods.get_mut(i))
            .ok_or_else(|| out_of_range(count, period))?;
        *slot = PeriodTimes::new(start, end);
        Ok(())
    }

    pub fn cell(&self, key: CellKey) -> Option<&Cell> {
        self.cells.get(&key)
    }

    pub fn cell_mut(&mut self, key: CellKey) -> Result<&mut Cell, CoreError> {
        let count = self.period_count();
        self.cells
            .get_mut(&key)
            .ok_or_else(|| out_of_range(count, key.period))
    }

    /// Cells in weekday-then-period order.
    pub fn cells(&self) -> impl Iterator<Item = (CellKey, &Cell)> {
        self.cells.iter().map(|(k, c)| (*k, c))
    }

    /// Reset every cell and place `entries` positionally.
    ///
    /// Entries are grouped by weekday and sorted by start time; the n-th
    /// entry of a weekday goes to period n regardless of its actual time.
    /// Entries past the last row are reported, not placed.
    pub fn place_entries(&mut self, entries: Vec<ScheduleEntry>) -> LoadReport {
        let mut report = LoadReport::default();
        let mut by_weekday: HashMap<Weekday, Vec<ScheduleEntry>> = HashMap::new();

        for entry in entries {
            match entry.weekday() {
                Some(wd) => by_weekday.entry(wd).or_default().push(entry),
                None => report.invalid_weekday.push(entry),
            }
        }

        for cell in self.cells.values_mut() {
            *cell = Cell::default();
        }

        let rows = self.period_count();
        for (weekday, mut day) in by_weekday {
            day.sort_by(|a, b| a.start_str().cmp(b.start_str()));
            for (idx, entry) in day.into_iter().enumerate() {
                if idx >= rows {
                    report.overflow.push(entry);
                    continue;
                }
                let key = CellKey::new(weekday, idx as u8 + 1);
                if let Some(mismatch) = time_mismatch(key, &entry, &self.periods[idx]) {
                    report.time_mismatch.push(mismatch);
                }
                self.cells.insert(key, Cell::from_entry(entry));
                report.placed += 1;
            }
        }

        report.overflow.sort_by_key(|e| (e.weekday, e.id));
        report.time_mismatch.sort_by_key(|m| m.cell);
        report
    }
}

fn time_mismatch(key: CellKey, entry: &ScheduleEntry, period: &PeriodTimes) -> Option<TimeMismatch> {
    let same = |stored: &str, row: &str| ClockTime::parse(stored) == ClockTime::parse(row);
    if same(entry.start_str(), &period.start) && same(entry.end_str(), &period.end) {
        return None;
    }
    Some(TimeMismatch {
        cell: key,
        entry_id: entry.id,
        stored_start: truncate_hhmm(entry.start_str()),
        stored_end: truncate_hhmm(entry.end_str()),
        period_start: period.start.clone(),
        period_end: period.end.clone(),
    })
}

fn out_of_range(count: usize, period: u8) -> CoreError {
    CoreError::Validation(format!("period must be 1..={count}, got {period}"))
}
