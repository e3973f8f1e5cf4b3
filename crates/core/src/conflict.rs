//! Two-phase timetable conflict detection.
//!
//! Phase one flags cells that share a teacher id, or a non-blank room, at
//! the same weekday + period. Phase two compares each staffed cell with
//! the lessons its teacher already has that weekday in other classes.
//!
//! Everything here is pure: callers gather busy slots first (see the
//! editor's busy-time cache) and get back a [`ConflictReport`] they can
//! render however they like.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::clock::TimeRange;
use crate::grid::{Cell, Grid};
use crate::schedule::BusySlot;
use crate::types::{CellKey, DbId, Weekday};

/// Busy slots are looked up per teacher and weekday.
pub type BusyKey = (DbId, Weekday);

/// Busy slots keyed by teacher and weekday.
pub type BusyMap = HashMap<BusyKey, Vec<BusySlot>>;

/// Label used when a busy slot carries no class name.
pub const OTHER_CLASS_LABEL: &str = "another class";

/// A teacher's lesson in another class that overlaps a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossClassClash {
    pub busy_id: DbId,
    pub class_name: String,
    pub start: String,
    pub end: String,
}

impl CrossClassClash {
    fn from_slot(slot: &BusySlot) -> Self {
        Self {
            busy_id: slot.id,
            class_name: slot.class_name.clone(),
            start: slot.start.clone(),
            end: slot.end.clone(),
        }
    }

    /// e.g. `Teacher busy: 8-B 10:50–11:35`.
    pub fn message(&self) -> String {
        let class = if self.class_name.trim().is_empty() {
            OTHER_CLASS_LABEL
        } else {
            self.class_name.trim()
        };
        format!("Teacher busy: {class} {}\u{2013}{}", self.start, self.end)
    }
}

/// Why a single cell is marked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellConflict {
    pub duplicate_teacher: bool,
    pub duplicate_room: bool,
    pub cross_class: Option<CrossClassClash>,
}

impl CellConflict {
    /// Human-readable reason; only cross-class clashes carry one.
    pub fn reason(&self) -> Option<String> {
        self.cross_class.as_ref().map(CrossClassClash::message)
    }
}

/// Conflicted cells after one full check. Cells not listed are clean.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictReport {
    cells: BTreeMap<CellKey, CellConflict>,
}

impl ConflictReport {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_conflicted(&self, key: CellKey) -> bool {
        self.cells.contains_key(&key)
    }

    pub fn get(&self, key: CellKey) -> Option<&CellConflict> {
        self.cells.get(&key)
    }

    pub fn reason(&self, key: CellKey) -> Option<String> {
        self.cells.get(&key).and_then(CellConflict::reason)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellKey, &CellConflict)> {
        self.cells.iter().map(|(k, c)| (*k, c))
    }

    fn entry(&mut self, key: CellKey) -> &mut CellConflict {
        self.cells.entry(key).or_default()
    }
}

// ---------------------------------------------------------------------------
// Phase one: duplicates at one slot
// ---------------------------------------------------------------------------

/// Per-input duplicate flags produced by [`in_grid_duplicates`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DuplicateFlags {
    pub teacher: bool,
    pub room: bool,
}

impl DuplicateFlags {
    pub fn any(self) -> bool {
        self.teacher || self.room
    }
}

/// Flag every cell whose teacher, or trimmed non-empty room, is shared
/// with another cell at the same weekday + period.
///
/// The result is index-aligned with `cells`. Teacher and room keys are
/// independent, so one cell can be flagged for both.
pub fn in_grid_duplicates(cells: &[(CellKey, &Cell)]) -> Vec<DuplicateFlags> {
    let mut flags = vec![DuplicateFlags::default(); cells.len()];
    let mut seen_teacher: HashMap<(DbId, CellKey), usize> = HashMap::new();
    let mut seen_room: HashMap<(&str, CellKey), usize> = HashMap::new();

    for (idx, (key, cell)) in cells.iter().enumerate() {
        if let Some(teacher) = cell.teacher {
            if let Some(&first) = seen_teacher.get(&(teacher, *key)) {
                flags[first].teacher = true;
                flags[idx].teacher = true;
            } else {
                seen_teacher.insert((teacher, *key), idx);
            }
        }

        let room = cell.room_trimmed();
        if !room.is_empty() {
            if let Some(&first) = seen_room.get(&(room, *key)) {
                flags[first].room = true;
                flags[idx].room = true;
            } else {
                seen_room.insert((room, *key), idx);
            }
        }
    }

    flags
}

// ---------------------------------------------------------------------------
// Phase two: cross-class clashes
// ---------------------------------------------------------------------------

/// First busy slot that overlaps `range` and is neither the cell's own
/// persisted entry nor a lesson of the selected class.
pub fn cross_class_clash(
    cell: &Cell,
    range: TimeRange,
    busy: &[BusySlot],
    selected_class: Option<DbId>,
) -> Option<CrossClassClash> {
    let own_id = cell.backing_id();
    busy.iter()
        .find(|slot| {
            let overlaps = slot.range().is_some_and(|r| range.overlaps(&r));
            let is_self = own_id == Some(slot.id);
            let same_class = selected_class.is_some() && slot.clazz == selected_class;
            overlaps && !is_self && !same_class
        })
        .map(CrossClassClash::from_slot)
}

/// Teacher/weekday pairs the cross-class phase will look up: every cell
/// with a teacher whose period has parseable start and end times.
pub fn busy_keys(grid: &Grid) -> BTreeSet<BusyKey> {
    grid.cells()
        .filter_map(|(key, cell)| {
            let teacher = cell.teacher?;
            grid.period(key.period)?.range()?;
            Some((teacher, key.weekday))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Full check
// ---------------------------------------------------------------------------

/// Run both phases over `grid`.
///
/// Teacher/weekday pairs missing from `busy` are treated as having no
/// lessons elsewhere.
pub fn detect_conflicts(grid: &Grid, selected_class: Option<DbId>, busy: &BusyMap) -> ConflictReport {
    let mut report = ConflictReport::default();

    let cells: Vec<(CellKey, &Cell)> = grid.cells().collect();
    for ((key, _), flags) in cells.iter().zip(in_grid_duplicates(&cells)) {
        if flags.any() {
            let entry = report.entry(*key);
            entry.duplicate_teacher |= flags.teacher;
            entry.duplicate_room |= flags.room;
        }
    }

    for (key, cell) in &cells {
        let Some(teacher) = cell.teacher else {
            continue;
        };
        let Some(range) = grid.period(key.period).and_then(|p| p.range()) else {
            continue;
        };
        let Some(slots) = busy.get(&(teacher, key.weekday)) else {
            continue;
        };
        if let Some(clash) = cross_class_clash(cell, range, slots, selected_class) {
            report.entry(*key).cross_class = Some(clash);
        }
    }

    report
}
