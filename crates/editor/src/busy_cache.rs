//! Session cache of teacher busy slots, keyed by teacher and weekday.
//!
//! A miss fetches every lesson of the teacher from the backend and keeps
//! the requested weekday. Failed fetches are fail-open: they count as "no
//! lessons elsewhere" and are not cached, so the next check retries.
//! The cache has no per-class versioning; call
//! [`BusyCache::invalidate_all`] whenever the backend schedule may have
//! changed.

use std::collections::BTreeSet;

use futures::stream::{self, StreamExt};
use timetable_core::backend::ScheduleBackend;
use timetable_core::conflict::{BusyKey, BusyMap};
use timetable_core::schedule::{busy_slots_for_day, BusySlot};
use timetable_core::types::{DbId, Weekday};

#[derive(Debug, Default)]
pub struct BusyCache {
    entries: BusyMap,
}

impl BusyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Busy slots of `teacher_id` on `weekday`, fetched on first use.
    pub async fn get_teacher_busy_for_day(
        &mut self,
        backend: &dyn ScheduleBackend,
        teacher_id: DbId,
        weekday: Weekday,
    ) -> Vec<BusySlot> {
        let key = (teacher_id, weekday);
        if let Some(slots) = self.entries.get(&key) {
            tracing::debug!(teacher_id, weekday = %weekday, "Busy cache hit");
            return slots.clone();
        }

        match fetch(backend, key).await {
            Some(slots) => {
                self.entries.insert(key, slots.clone());
                slots
            }
            None => Vec::new(),
        }
    }

    /// Fetch every key not yet cached, at most `concurrency` at a time.
    pub async fn prefetch(
        &mut self,
        backend: &dyn ScheduleBackend,
        keys: BTreeSet<BusyKey>,
        concurrency: usize,
    ) {
        let missing: Vec<BusyKey> = keys
            .into_iter()
            .filter(|k| !self.entries.contains_key(k))
            .collect();
        if missing.is_empty() {
            return;
        }

        let fetched: Vec<(BusyKey, Option<Vec<BusySlot>>)> = stream::iter(missing)
            .map(|key| async move { (key, fetch(backend, key).await) })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        for (key, slots) in fetched {
            if let Some(slots) = slots {
                self.entries.insert(key, slots);
            }
        }
    }

    /// Drop everything; the next lookup of any key goes to the backend.
    pub fn invalidate_all(&mut self) {
        if !self.entries.is_empty() {
            tracing::debug!(keys = self.entries.len(), "Busy cache invalidated");
        }
        self.entries.clear();
    }

    pub fn contains(&self, teacher_id: DbId, weekday: Weekday) -> bool {
        self.entries.contains_key(&(teacher_id, weekday))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached slots, for the conflict detector.
    pub fn busy_map(&self) -> &BusyMap {
        &self.entries
    }
}

async fn fetch(backend: &dyn ScheduleBackend, (teacher_id, weekday): BusyKey) -> Option<Vec<BusySlot>> {
    tracing::debug!(teacher_id, weekday = %weekday, "Busy cache miss, fetching teacher schedule");
    match backend.teacher_schedule(teacher_id).await {
        Ok(entries) => Some(busy_slots_for_day(&entries, weekday)),
        Err(e) => {
            tracing::warn!(
                teacher_id,
                weekday = %weekday,
                error = %e,
                "Teacher schedule fetch failed, assuming no conflicts",
            );
            None
        }
    }
}
