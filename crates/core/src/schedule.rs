//! Schedule-entry wire models and the derived busy-slot record.

use serde::{Deserialize, Serialize};

use crate::clock::{truncate_hhmm, TimeRange};
use crate::types::{DbId, Weekday};

/// One persisted lesson as returned by `/schedule/` endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: DbId,
    /// Owning class id.
    #[serde(default)]
    pub clazz: Option<DbId>,
    /// Owning class label, e.g. `"7-A"`.
    #[serde(default)]
    pub class_name: Option<String>,
    pub subject: DbId,
    pub teacher: DbId,
    pub weekday: u8,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub room: Option<String>,
}

impl ScheduleEntry {
    pub fn weekday(&self) -> Option<Weekday> {
        Weekday::new(self.weekday)
    }

    pub fn start_str(&self) -> &str {
        self.start_time.as_deref().unwrap_or("")
    }

    pub fn end_str(&self) -> &str {
        self.end_time.as_deref().unwrap_or("")
    }
}

/// Create/update body for `POST /schedule/` and `PUT /schedule/{id}/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPayload {
    pub clazz: DbId,
    pub subject: DbId,
    pub teacher: DbId,
    pub weekday: u8,
    pub start_time: String,
    pub end_time: String,
    pub room: String,
}

impl EntryPayload {
    /// Rebuild the payload that would recreate `entry` as it was loaded.
    ///
    /// `fallback_class` is used when the entry does not carry its class id.
    pub fn from_entry(entry: &ScheduleEntry, fallback_class: DbId) -> Self {
        Self {
            clazz: entry.clazz.unwrap_or(fallback_class),
            subject: entry.subject,
            teacher: entry.teacher,
            weekday: entry.weekday,
            start_time: truncate_hhmm(entry.start_str()),
            end_time: truncate_hhmm(entry.end_str()),
            room: entry.room.clone().unwrap_or_default(),
        }
    }
}

/// A teacher's already-scheduled lesson on one weekday, in any class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusySlot {
    pub id: DbId,
    /// `HH:MM`, possibly blank.
    pub start: String,
    /// `HH:MM`, possibly blank.
    pub end: String,
    pub room: String,
    pub class_name: String,
    pub clazz: Option<DbId>,
}

impl BusySlot {
    pub fn from_entry(entry: &ScheduleEntry) -> Self {
        Self {
            id: entry.id,
            start: truncate_hhmm(entry.start_str()),
            end: truncate_hhmm(entry.end_str()),
            room: entry.room.clone().unwrap_or_default(),
            class_name: entry.class_name.clone().unwrap_or_default(),
            clazz: entry.clazz,
        }
    }

    pub fn range(&self) -> Option<TimeRange> {
        TimeRange::parse(&self.start, &self.end)
    }
}

/// Keep the entries on `weekday` and normalise them into busy slots.
pub fn busy_slots_for_day(entries: &[ScheduleEntry], weekday: Weekday) -> Vec<BusySlot> {
    entries
        .iter()
        .filter(|e| e.weekday == weekday.number())
        .map(BusySlot::from_entry)
        .collect()
}

/// List endpoints answer either with a bare array or a DRF page.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Plain(Vec<T>),
    Paginated { results: Vec<T> },
}

impl<T> ListResponse<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Plain(items) | Self::Paginated { results: items } => items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_json() -> serde_json::Value {
        serde_json::json!({
            "id": 41,
            "clazz": 3,
            "class_name": "8-B",
            "subject": 2,
            "subject_name": "Physics",
            "teacher": 12,
            "teacher_name": "Aziz Karimov",
            "weekday": 2,
            "start_time": "10:50:00",
            "end_time": "11:35:00",
            "room": "305"
        })
    }

    #[test]
    fn entry_ignores_display_only_fields() {
        let entry: ScheduleEntry = serde_json::from_value(entry_json()).unwrap();
        assert_eq!(entry.id, 41);
        assert_eq!(entry.clazz, Some(3));
        assert_eq!(entry.weekday(), Some(Weekday::TUESDAY));
    }

    #[test]
    fn busy_slot_truncates_times() {
        let entry: ScheduleEntry = serde_json::from_value(entry_json()).unwrap();
        let slot = BusySlot::from_entry(&entry);
        assert_eq!(slot.start, "10:50");
        assert_eq!(slot.end, "11:35");
        assert_eq!(slot.class_name, "8-B");
        assert_eq!(slot.range().unwrap().to_string(), "10:50\u{2013}11:35");
    }

    #[test]
    fn busy_slots_filter_by_weekday() {
        let mut other_day: ScheduleEntry = serde_json::from_value(entry_json()).unwrap();
        other_day.id = 42;
        other_day.weekday = 4;
        let same_day: ScheduleEntry = serde_json::from_value(entry_json()).unwrap();

        let slots = busy_slots_for_day(&[other_day, same_day], Weekday::TUESDAY);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].id, 41);
    }

    #[test]
    fn payload_restores_loaded_entry() {
        let entry: ScheduleEntry = serde_json::from_value(entry_json()).unwrap();
        let payload = EntryPayload::from_entry(&entry, 99);
        assert_eq!(payload.clazz, 3);
        assert_eq!(payload.start_time, "10:50");
        assert_eq!(payload.room, "305");
    }

    #[test]
    fn list_response_accepts_both_shapes() {
        let plain: ListResponse<ScheduleEntry> =
            serde_json::from_value(serde_json::json!([entry_json()])).unwrap();
        let paged: ListResponse<ScheduleEntry> =
            serde_json::from_value(serde_json::json!({"count": 1, "results": [entry_json()]}))
                .unwrap();
        assert_eq!(plain.into_vec().len(), 1);
        assert_eq!(paged.into_vec().len(), 1);
    }
}
