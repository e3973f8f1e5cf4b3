//! Writing a staged [`SavePlan`] to the backend.
//!
//! Writes run with bounded concurrency. The first rejected write stops
//! new writes from starting; writes already in flight are awaited, then
//! everything that was applied is undone in reverse order.

use futures::stream::{FuturesUnordered, StreamExt};

use timetable_core::backend::{BackendError, ScheduleBackend};
use timetable_core::save_plan::{stage_save, SaveOp, SavePlan};
use timetable_core::schedule::{EntryPayload, ScheduleEntry};
use timetable_core::types::{CellKey, DbId};

use crate::editor::TimetableEditor;
use crate::error::SaveError;

/// Writes performed by a successful save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl SaveSummary {
    pub fn total(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}

/// A write that went through, with what is needed to undo it.
#[derive(Debug)]
enum Applied<'a> {
    Created { id: DbId },
    Updated { id: DbId, previous: &'a ScheduleEntry },
    Deleted { key: CellKey, previous: &'a ScheduleEntry },
}

/// A save that stopped at a rejected write.
#[derive(Debug)]
pub struct PlanFailure {
    /// First failing response's message.
    pub message: String,
    /// Writes that had succeeded when the failure was seen.
    pub applied: usize,
    /// Whether every applied write was undone.
    pub rolled_back: bool,
    /// Deleted entries re-created during rollback, keyed by the cell that
    /// was backed by them. Re-created entries carry new ids.
    pub recreated: Vec<(CellKey, ScheduleEntry)>,
}

impl From<PlanFailure> for SaveError {
    fn from(failure: PlanFailure) -> Self {
        Self::Failed {
            message: failure.message,
            applied: failure.applied,
            rolled_back: failure.rolled_back,
        }
    }
}

#[derive(Debug)]
struct WriteFailure {
    key: CellKey,
    kind: &'static str,
    error: BackendError,
}

async fn apply<'a>(backend: &'a dyn ScheduleBackend, op: &'a SaveOp) -> Result<Applied<'a>, WriteFailure> {
    let result = match op {
        SaveOp::Create { payload, .. } => backend
            .create_entry(payload)
            .await
            .map(|created| Applied::Created { id: created.id }),
        SaveOp::Update {
            id,
            payload,
            previous,
            ..
        } => backend
            .update_entry(*id, payload)
            .await
            .map(|_| Applied::Updated { id: *id, previous }),
        SaveOp::Delete { key, id, previous } => backend
            .delete_entry(*id)
            .await
            .map(|()| Applied::Deleted { key: *key, previous }),
    };

    result.map_err(|error| WriteFailure {
        key: op.key(),
        kind: op.kind(),
        error,
    })
}

/// Execute `plan` against `backend`, at most `concurrency` writes at a
/// time.
///
/// On failure the applied writes are compensated (created entries
/// deleted, updated entries restored, deleted entries re-created) and
/// the returned [`PlanFailure`] reports how far that got.
pub async fn execute_plan(
    backend: &dyn ScheduleBackend,
    plan: &SavePlan,
    concurrency: usize,
    class_id: DbId,
) -> Result<SaveSummary, PlanFailure> {
    let concurrency = concurrency.max(1);
    let mut pending = plan.ops().iter();
    let mut in_flight = FuturesUnordered::new();
    let mut applied: Vec<Applied<'_>> = Vec::with_capacity(plan.len());
    let mut failure: Option<WriteFailure> = None;

    loop {
        while failure.is_none() && in_flight.len() < concurrency {
            match pending.next() {
                Some(op) => in_flight.push(apply(backend, op)),
                None => break,
            }
        }

        match in_flight.next().await {
            Some(Ok(done)) => applied.push(done),
            Some(Err(err)) => {
                tracing::warn!(
                    class_id,
                    cell = %err.key,
                    op = err.kind,
                    error = %err.error,
                    "Schedule write rejected",
                );
                failure.get_or_insert(err);
            }
            None => break,
        }
    }

    let Some(failure) = failure else {
        return Ok(summarize(&applied));
    };

    let applied_count = applied.len();
    let (rolled_back, recreated) = compensate(backend, applied, class_id).await;
    tracing::error!(
        class_id,
        applied = applied_count,
        rolled_back,
        error = %failure.error,
        "Save failed",
    );

    Err(PlanFailure {
        message: failure.error.to_string(),
        applied: applied_count,
        rolled_back,
        recreated,
    })
}

fn summarize(applied: &[Applied<'_>]) -> SaveSummary {
    applied.iter().fold(SaveSummary::default(), |mut s, a| {
        match a {
            Applied::Created { .. } => s.created += 1,
            Applied::Updated { .. } => s.updated += 1,
            Applied::Deleted { .. } => s.deleted += 1,
        }
        s
    })
}

/// Undo `applied` newest first.
///
/// Returns whether every undo succeeded, and the entries re-created for
/// undone deletes.
async fn compensate(
    backend: &dyn ScheduleBackend,
    applied: Vec<Applied<'_>>,
    class_id: DbId,
) -> (bool, Vec<(CellKey, ScheduleEntry)>) {
    let mut all_undone = true;
    let mut recreated = Vec::new();

    for done in applied.into_iter().rev() {
        let result = match &done {
            Applied::Created { id } => backend.delete_entry(*id).await,
            Applied::Updated { id, previous } => backend
                .update_entry(*id, &EntryPayload::from_entry(previous, class_id))
                .await
                .map(|_| ()),
            Applied::Deleted { key, previous } => backend
                .create_entry(&EntryPayload::from_entry(previous, class_id))
                .await
                .map(|entry| recreated.push((*key, entry))),
        };

        if let Err(e) = result {
            all_undone = false;
            tracing::error!(class_id, write = ?done, error = %e, "Rollback write failed");
        }
    }

    (all_undone, recreated)
}

impl TimetableEditor {
    /// Persist every changed cell of the selected class.
    ///
    /// Refuses with [`SaveError::Conflicts`] while any cell is marked and
    /// with [`SaveError::InvalidPeriod`] when a filled cell has unusable
    /// times; neither issues a write. After any write the busy cache is
    /// dropped. A successful save reloads the schedule. A failed save that
    /// was fully rolled back keeps the grid's edits so the offending cell
    /// can be fixed and saved again; an incomplete rollback reloads.
    pub async fn save_all(&mut self) -> Result<SaveSummary, SaveError> {
        let class_id = self.selected_class_id().ok_or(SaveError::NoClassSelected)?;

        let conflicted = self.run_conflicts().await.len();
        if conflicted > 0 {
            tracing::warn!(class_id, conflicted, "Save refused: conflicts present");
            return Err(SaveError::Conflicts { count: conflicted });
        }

        let plan = stage_save(&self.grid, class_id)?;
        if plan.is_empty() {
            tracing::info!(class_id, "Nothing to save");
            return Ok(SaveSummary::default());
        }

        let (creates, updates, deletes) = plan.counts();
        tracing::info!(class_id, creates, updates, deletes, "Saving schedule");

        let result = execute_plan(
            self.backend.as_ref(),
            &plan,
            self.settings.save_concurrency,
            class_id,
        )
        .await;
        self.busy.invalidate_all();

        match result {
            Ok(summary) => {
                self.load_schedule_for_class()
                    .await
                    .map_err(|e| SaveError::Reload(Box::new(e)))?;
                tracing::info!(
                    class_id,
                    created = summary.created,
                    updated = summary.updated,
                    deleted = summary.deleted,
                    "Schedule saved",
                );
                Ok(summary)
            }
            Err(failure) if failure.rolled_back => {
                // Backend is back to its pre-save state; keep the edits and
                // point cells at the ids of re-created entries.
                for (key, entry) in &failure.recreated {
                    if let Ok(cell) = self.grid.cell_mut(*key) {
                        cell.backing = Some(entry.clone());
                    }
                }
                self.run_conflicts().await;
                Err(failure.into())
            }
            Err(failure) => {
                if let Err(reload) = self.load_schedule_for_class().await {
                    tracing::warn!(class_id, error = %reload, "Reload after failed save failed");
                }
                Err(failure.into())
            }
        }
    }
}
