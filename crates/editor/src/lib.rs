//! Timetable grid controller.
//!
//! [`editor::TimetableEditor`] owns one class's weekly grid, the lookup
//! lists and the teacher busy-time cache. It loads the persisted schedule,
//! re-runs the conflict check on every edit, and reconciles the grid back
//! to the backend on save.

pub mod busy_cache;
pub mod config;
pub mod editor;
pub mod error;
pub mod save;
