use timetable_core::backend::BackendError;
use timetable_core::error::CoreError;
use timetable_core::save_plan::InvalidPeriod;

/// Errors from loading and editing the grid.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// A domain-level error from `timetable_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A backend request failed.
    #[error("Backend request failed: {0}")]
    Backend(#[from] BackendError),

    /// The operation needs a selected class.
    #[error("No class selected")]
    NoClassSelected,
}

/// Errors from [`TimetableEditor::save_all`](crate::editor::TimetableEditor::save_all).
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("No class selected")]
    NoClassSelected,

    /// At least one cell is marked; nothing was written.
    #[error("Conflicts found: fix the red cells ({count} conflicted)")]
    Conflicts { count: usize },

    /// A filled cell sits in a period without a usable time range;
    /// nothing was written.
    #[error(transparent)]
    InvalidPeriod(#[from] InvalidPeriod),

    /// A write was rejected. Writes applied before it were rolled back
    /// as far as the backend allowed.
    #[error("Save failed: {message}")]
    Failed {
        /// First failing response's message.
        message: String,
        /// Writes that had succeeded when the failure was seen.
        applied: usize,
        /// Whether every applied write was undone.
        rolled_back: bool,
    },

    /// Every write succeeded but re-reading the schedule did not.
    #[error("Schedule saved but reload failed: {0}")]
    Reload(#[source] Box<EditorError>),
}
