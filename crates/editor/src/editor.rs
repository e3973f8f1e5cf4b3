//! The timetable grid controller.
//!
//! Typical flow:
//!
//! 1. [`TimetableEditor::load_lookups`] checks the caller's role and
//!    fetches classes, subjects and teachers.
//! 2. [`TimetableEditor::select_class`] rebuilds the grid and loads the
//!    class's persisted schedule.
//! 3. Edits (`set_subject`, `set_teacher`, `set_room`,
//!    `set_period_times`) mutate the in-memory grid and return a fresh
//!    [`ConflictReport`].
//! 4. [`TimetableEditor::save_all`] refuses while anything is marked,
//!    otherwise writes the staged changes and reloads.

use std::sync::Arc;

use timetable_core::backend::ScheduleBackend;
use timetable_core::conflict::{busy_keys, detect_conflicts, ConflictReport};
use timetable_core::error::CoreError;
use timetable_core::grid::{Grid, LoadReport};
use timetable_core::lookups::{filter_classes, Lookups, SchoolClass, Teacher};
use timetable_core::periods::TimeTemplate;
use timetable_core::schedule::BusySlot;
use timetable_core::types::{CellKey, DbId, Weekday};

use crate::busy_cache::BusyCache;
use crate::config::{EditorSettings, BUSY_FETCH_CONCURRENCY};
use crate::error::EditorError;

pub struct TimetableEditor {
    pub(crate) backend: Arc<dyn ScheduleBackend>,
    pub(crate) settings: EditorSettings,
    lookups: Lookups,
    pub(crate) selected_class: Option<SchoolClass>,
    pub(crate) grid: Grid,
    pub(crate) busy: BusyCache,
    pub(crate) conflicts: ConflictReport,
}

impl TimetableEditor {
    /// Create an editor with an empty grid and no lookups loaded.
    pub fn new(backend: Arc<dyn ScheduleBackend>, settings: EditorSettings) -> Self {
        let grid = Grid::build(settings.period_count, settings.time_template);
        Self {
            backend,
            settings,
            lookups: Lookups::default(),
            selected_class: None,
            grid,
            busy: BusyCache::new(),
            conflicts: ConflictReport::default(),
        }
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn lookups(&self) -> &Lookups {
        &self.lookups
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn conflicts(&self) -> &ConflictReport {
        &self.conflicts
    }

    pub fn busy_cache(&self) -> &BusyCache {
        &self.busy
    }

    pub fn selected_class(&self) -> Option<&SchoolClass> {
        self.selected_class.as_ref()
    }

    /// Verify the caller may edit timetables, then fetch all lookups.
    pub async fn load_lookups(&mut self) -> Result<(), EditorError> {
        let me = self.backend.current_user().await?;
        if !me.can_edit_timetable() {
            return Err(CoreError::Forbidden(format!(
                "role '{}' cannot edit class timetables",
                me.role
            ))
            .into());
        }

        let (classes, subjects, teachers) = futures::try_join!(
            self.backend.list_classes(),
            self.backend.list_subjects(),
            self.backend.list_teachers(),
        )?;

        tracing::info!(
            classes = classes.len(),
            subjects = subjects.len(),
            teachers = teachers.len(),
            "Lookups loaded",
        );

        self.lookups = Lookups {
            classes,
            subjects,
            teachers,
        };
        Ok(())
    }

    /// Class to open for a search `query`.
    ///
    /// An exact name wins; otherwise the first class by name whose name
    /// contains the query, ignoring case. No query picks the first class
    /// by name.
    pub fn find_class(&self, query: Option<&str>) -> Option<&SchoolClass> {
        let query = query.unwrap_or_default();
        self.lookups
            .class_by_name(query.trim())
            .or_else(|| filter_classes(&self.lookups.classes, query).into_iter().next())
    }

    /// Teachers offered for `subject` (all teachers when `None`).
    pub fn teachers_for_subject(&self, subject: Option<DbId>) -> Vec<&Teacher> {
        self.lookups.teachers_for_subject(subject)
    }

    /// Select a class: rebuild the grid and load its schedule.
    pub async fn select_class(&mut self, class_id: DbId) -> Result<LoadReport, EditorError> {
        let class = self
            .lookups
            .class(class_id)
            .cloned()
            .ok_or(CoreError::NotFound {
                entity: "class",
                id: class_id,
            })?;

        tracing::info!(class_id, class_name = %class.name, "Class selected");
        self.selected_class = Some(class);
        self.rebuild();
        self.load_schedule_for_class().await
    }

    /// Rebuild the grid with a new period count and time template.
    ///
    /// Discards unsaved edits and backing ids; call
    /// [`load_schedule_for_class`](Self::load_schedule_for_class) to
    /// repopulate.
    pub fn build_grid(&mut self, period_count: usize, template: TimeTemplate) {
        self.settings.period_count = period_count;
        self.settings.time_template = template;
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.grid = Grid::build(self.settings.period_count, self.settings.time_template);
        self.conflicts = ConflictReport::default();
    }

    /// Fetch the selected class's entries, place them positionally and
    /// re-run the conflict check.
    pub async fn load_schedule_for_class(&mut self) -> Result<LoadReport, EditorError> {
        let class_id = self.selected_class_id().ok_or(EditorError::NoClassSelected)?;

        let entries = self.backend.class_schedule(class_id).await?;
        let total = entries.len();
        let report = self.grid.place_entries(entries);

        for entry in &report.overflow {
            tracing::warn!(
                class_id,
                entry_id = entry.id,
                weekday = entry.weekday,
                start_time = entry.start_str(),
                periods = self.grid.period_count(),
                "Schedule entry does not fit the grid and was not loaded",
            );
        }
        for entry in &report.invalid_weekday {
            tracing::warn!(
                class_id,
                entry_id = entry.id,
                weekday = entry.weekday,
                "Schedule entry has an unknown weekday and was not loaded",
            );
        }
        for mismatch in &report.time_mismatch {
            tracing::warn!(
                class_id,
                entry_id = mismatch.entry_id,
                cell = %mismatch.cell,
                stored_start = %mismatch.stored_start,
                stored_end = %mismatch.stored_end,
                period_start = %mismatch.period_start,
                period_end = %mismatch.period_end,
                "Stored lesson times differ from the period row; saving will rewrite them",
            );
        }
        tracing::info!(class_id, total, placed = report.placed, "Schedule loaded");

        self.run_conflicts().await;
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Cell edits
    // -----------------------------------------------------------------------

    /// Set a cell's subject. A chosen teacher who does not teach the new
    /// subject is cleared.
    pub async fn set_subject(
        &mut self,
        key: CellKey,
        subject: Option<DbId>,
    ) -> Result<&ConflictReport, EditorError> {
        let teacher = self.grid.cell(key).and_then(|c| c.teacher);
        let keep_teacher =
            subject.is_none() || teacher.is_some_and(|t| self.lookups.teacher_allowed(t, subject));

        let cell = self.grid.cell_mut(key)?;
        cell.subject = subject;
        if !keep_teacher {
            cell.teacher = None;
        }
        Ok(self.run_conflicts().await)
    }

    pub async fn set_teacher(
        &mut self,
        key: CellKey,
        teacher: Option<DbId>,
    ) -> Result<&ConflictReport, EditorError> {
        self.grid.cell_mut(key)?.teacher = teacher;
        Ok(self.run_conflicts().await)
    }

    pub async fn set_room(
        &mut self,
        key: CellKey,
        room: impl Into<String>,
    ) -> Result<&ConflictReport, EditorError> {
        self.grid.cell_mut(key)?.room = room.into();
        Ok(self.run_conflicts().await)
    }

    /// Change a period row's times (applies to all six weekdays).
    pub async fn set_period_times(
        &mut self,
        period: u8,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Result<&ConflictReport, EditorError> {
        self.grid.set_period_times(period, start, end)?;
        Ok(self.run_conflicts().await)
    }

    // -----------------------------------------------------------------------
    // Conflicts
    // -----------------------------------------------------------------------

    /// Busy slots for one teacher and weekday, through the session cache.
    pub async fn get_teacher_busy_for_day(&mut self, teacher_id: DbId, weekday: Weekday) -> Vec<BusySlot> {
        self.busy
            .get_teacher_busy_for_day(self.backend.as_ref(), teacher_id, weekday)
            .await
    }

    /// Run both conflict phases over the whole grid.
    pub async fn run_conflicts(&mut self) -> &ConflictReport {
        let keys = busy_keys(&self.grid);
        self.busy
            .prefetch(self.backend.as_ref(), keys, BUSY_FETCH_CONCURRENCY)
            .await;

        self.conflicts = detect_conflicts(&self.grid, self.selected_class_id(), self.busy.busy_map());
        if !self.conflicts.is_empty() {
            tracing::debug!(conflicted = self.conflicts.len(), "Conflicts detected");
        }
        &self.conflicts
    }

    pub(crate) fn selected_class_id(&self) -> Option<DbId> {
        self.selected_class.as_ref().map(|c| c.id)
    }
}
