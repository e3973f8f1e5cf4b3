//! Staging a grid into create/update/delete operations.
//!
//! A cell is saved when it has a subject, a teacher and a period with
//! both times; a cell that lost any of those but still has a backing
//! entry is deleted. Staging does no I/O so the whole batch can be
//! validated before the first request goes out.

use crate::grid::Grid;
use crate::schedule::{EntryPayload, ScheduleEntry};
use crate::types::{CellKey, DbId};

/// A filled cell sits in a period whose times cannot form a lesson.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Period {period} has an invalid time range '{start}'-'{end}' ({cell})")]
pub struct InvalidPeriod {
    pub cell: CellKey,
    pub period: u8,
    pub start: String,
    pub end: String,
}

/// One write against `/schedule/`.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOp {
    Create {
        key: CellKey,
        payload: EntryPayload,
    },
    Update {
        key: CellKey,
        id: DbId,
        payload: EntryPayload,
        /// Entry as loaded, for rolling back.
        previous: ScheduleEntry,
    },
    Delete {
        key: CellKey,
        id: DbId,
        /// Entry as loaded, for rolling back.
        previous: ScheduleEntry,
    },
}

impl SaveOp {
    pub fn key(&self) -> CellKey {
        match self {
            Self::Create { key, .. } | Self::Update { key, .. } | Self::Delete { key, .. } => *key,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }
}

/// Ordered list of writes for one save-all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavePlan {
    ops: Vec<SaveOp>,
}

impl SavePlan {
    pub fn ops(&self) -> &[SaveOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// `(creates, updates, deletes)`.
    pub fn counts(&self) -> (usize, usize, usize) {
        self.ops.iter().fold((0, 0, 0), |(c, u, d), op| match op {
            SaveOp::Create { .. } => (c + 1, u, d),
            SaveOp::Update { .. } => (c, u + 1, d),
            SaveOp::Delete { .. } => (c, u, d + 1),
        })
    }
}

/// Stage every cell of `grid` for class `class_id`.
pub fn stage_save(grid: &Grid, class_id: DbId) -> Result<SavePlan, InvalidPeriod> {
    let mut ops = Vec::new();

    for (key, cell) in grid.cells() {
        let times = grid.period(key.period).filter(|p| p.is_set());
        let lesson = match (cell.subject, cell.teacher, times) {
            (Some(subject), Some(teacher), Some(times)) => Some((subject, teacher, times)),
            _ => None,
        };

        match (lesson, &cell.backing) {
            (Some((subject, teacher, times)), backing) => {
                let range = times
                    .range()
                    .filter(|r| !r.is_empty())
                    .ok_or_else(|| InvalidPeriod {
                        cell: key,
                        period: key.period,
                        start: times.start.clone(),
                        end: times.end.clone(),
                    })?;
                let payload = EntryPayload {
                    clazz: class_id,
                    subject,
                    teacher,
                    weekday: key.weekday.number(),
                    start_time: range.start.to_string(),
                    end_time: range.end.to_string(),
                    room: cell.room_trimmed().to_string(),
                };
                ops.push(match backing {
                    Some(previous) => SaveOp::Update {
                        key,
                        id: previous.id,
                        payload,
                        previous: previous.clone(),
                    },
                    None => SaveOp::Create { key, payload },
                });
            }
            (None, Some(previous)) => ops.push(SaveOp::Delete {
                key,
                id: previous.id,
                previous: previous.clone(),
            }),
            (None, None) => {}
        }
    }

    Ok(SavePlan { ops })
}
