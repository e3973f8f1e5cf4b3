//! Timetable domain model and conflict engine.
//!
//! Zero-I/O building blocks shared by the REST client and the grid
//! controller: identifiers, weekdays, clock times, the weekly grid,
//! lookup lists, the pure two-phase conflict detector, save staging,
//! and the [`backend::ScheduleBackend`] seam.

pub mod backend;
pub mod clock;
pub mod conflict;
pub mod error;
pub mod grid;
pub mod lookups;
pub mod periods;
pub mod save_plan;
pub mod schedule;
pub mod types;
