//! In-memory school backend for driving [`TimetableEditor`] in tests.
//!
//! Lookups are fixed:
//!
//! - classes: 7-A (1), 8-B (2)
//! - subjects: Math (1), Physics (2)
//! - teachers: 12 and 14 teach Physics, 13 teaches Math
//!
//! Schedule entries live in a mutex and are changed by the write calls.
//! Any create or update whose room is [`REJECTED_ROOM`] fails with a 400.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use timetable_core::backend::{BackendError, ScheduleBackend};
use timetable_core::lookups::{CurrentUser, SchoolClass, Subject, Teacher};
use timetable_core::schedule::{EntryPayload, ScheduleEntry};
use timetable_core::types::DbId;
use timetable_editor::config::EditorSettings;
use timetable_editor::editor::TimetableEditor;

pub const CLASS_7A: DbId = 1;
pub const CLASS_8B: DbId = 2;
pub const MATH: DbId = 1;
pub const PHYSICS: DbId = 2;

/// Room value the fake refuses to store.
pub const REJECTED_ROOM: &str = "bad";

pub struct FakeBackend {
    pub role: Mutex<String>,
    entries: Mutex<Vec<ScheduleEntry>>,
    next_id: AtomicI64,
    /// `"POST"`, `"PUT <id>"` or `"DELETE <id>"` for every accepted or
    /// rejected write.
    writes: Mutex<Vec<String>>,
    teacher_fetches: AtomicUsize,
    pub fail_teacher_fetch: AtomicBool,
    /// Refuse every delete with a 500.
    pub reject_deletes: AtomicBool,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            role: Mutex::new("admin".into()),
            entries: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(500),
            writes: Mutex::new(Vec::new()),
            teacher_fetches: AtomicUsize::new(0),
            fail_teacher_fetch: AtomicBool::new(false),
            reject_deletes: AtomicBool::new(false),
        })
    }

    pub fn seed(&self, entry: ScheduleEntry) {
        self.entries.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<ScheduleEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn entry(&self, id: DbId) -> Option<ScheduleEntry> {
        self.entries().into_iter().find(|e| e.id == id)
    }

    pub fn class_entries(&self, class_id: DbId) -> Vec<ScheduleEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.clazz == Some(class_id))
            .collect()
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    pub fn teacher_fetches(&self) -> usize {
        self.teacher_fetches.load(Ordering::SeqCst)
    }

    fn class_name(class_id: DbId) -> Option<String> {
        classes()
            .into_iter()
            .find(|c| c.id == class_id)
            .map(|c| c.name)
    }

    fn record(&self, write: String) {
        self.writes.lock().unwrap().push(write);
    }

    fn to_entry(id: DbId, payload: &EntryPayload) -> ScheduleEntry {
        ScheduleEntry {
            id,
            clazz: Some(payload.clazz),
            class_name: Self::class_name(payload.clazz),
            subject: payload.subject,
            teacher: payload.teacher,
            weekday: payload.weekday,
            start_time: Some(format!("{}:00", payload.start_time)),
            end_time: Some(format!("{}:00", payload.end_time)),
            room: Some(payload.room.clone()),
        }
    }
}

fn rejected() -> BackendError {
    BackendError::http(400, r#"{"room":["invalid room"]}"#)
}

fn not_found() -> BackendError {
    BackendError::http(404, "")
}

#[async_trait]
impl ScheduleBackend for FakeBackend {
    async fn current_user(&self) -> Result<CurrentUser, BackendError> {
        Ok(CurrentUser {
            id: Some(1),
            role: self.role.lock().unwrap().clone(),
        })
    }

    async fn list_classes(&self) -> Result<Vec<SchoolClass>, BackendError> {
        Ok(classes())
    }

    async fn list_subjects(&self) -> Result<Vec<Subject>, BackendError> {
        Ok(vec![
            Subject {
                id: MATH,
                name: "Math".into(),
                code: "MATH".into(),
            },
            Subject {
                id: PHYSICS,
                name: "Physics".into(),
                code: "PHYS".into(),
            },
        ])
    }

    async fn list_teachers(&self) -> Result<Vec<Teacher>, BackendError> {
        Ok(vec![
            teacher(12, PHYSICS, "Physics"),
            teacher(13, MATH, "Math"),
            teacher(14, PHYSICS, "Physics"),
        ])
    }

    async fn class_schedule(&self, class_id: DbId) -> Result<Vec<ScheduleEntry>, BackendError> {
        Ok(self.class_entries(class_id))
    }

    async fn teacher_schedule(&self, teacher_id: DbId) -> Result<Vec<ScheduleEntry>, BackendError> {
        self.teacher_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_teacher_fetch.load(Ordering::SeqCst) {
            return Err(BackendError::Transport("connection refused".into()));
        }
        Ok(self
            .entries()
            .into_iter()
            .filter(|e| e.teacher == teacher_id)
            .collect())
    }

    async fn create_entry(&self, payload: &EntryPayload) -> Result<ScheduleEntry, BackendError> {
        self.record("POST".into());
        if payload.room == REJECTED_ROOM {
            return Err(rejected());
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let entry = Self::to_entry(id, payload);
        self.entries.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn update_entry(&self, id: DbId, payload: &EntryPayload) -> Result<ScheduleEntry, BackendError> {
        self.record(format!("PUT {id}"));
        if payload.room == REJECTED_ROOM {
            return Err(rejected());
        }
        let mut entries = self.entries.lock().unwrap();
        let slot = entries.iter_mut().find(|e| e.id == id).ok_or_else(not_found)?;
        *slot = Self::to_entry(id, payload);
        Ok(slot.clone())
    }

    async fn delete_entry(&self, id: DbId) -> Result<(), BackendError> {
        self.record(format!("DELETE {id}"));
        if self.reject_deletes.load(Ordering::SeqCst) {
            return Err(BackendError::http(500, "delete refused"));
        }
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Err(not_found());
        }
        Ok(())
    }
}

fn classes() -> Vec<SchoolClass> {
    vec![
        SchoolClass {
            id: CLASS_7A,
            name: "7-A".into(),
        },
        SchoolClass {
            id: CLASS_8B,
            name: "8-B".into(),
        },
    ]
}

fn teacher(id: DbId, specialty: DbId, specialty_name: &str) -> Teacher {
    Teacher {
        id,
        user: Some(id + 100),
        user_full_name: format!("Teacher {id}"),
        specialty: Some(specialty),
        specialty_name: specialty_name.into(),
    }
}

/// A persisted lesson with backend-style `HH:MM:SS` times.
#[allow(clippy::too_many_arguments)]
pub fn lesson(
    id: DbId,
    class_id: DbId,
    weekday: u8,
    start: &str,
    end: &str,
    teacher: DbId,
    subject: DbId,
    room: &str,
) -> ScheduleEntry {
    ScheduleEntry {
        id,
        clazz: Some(class_id),
        class_name: FakeBackend::class_name(class_id),
        subject,
        teacher,
        weekday,
        start_time: Some(format!("{start}:00")),
        end_time: Some(format!("{end}:00")),
        room: Some(room.into()),
    }
}

/// Editor over `backend` with lookups loaded.
pub async fn editor_with(backend: &Arc<FakeBackend>, settings: EditorSettings) -> TimetableEditor {
    let mut editor = TimetableEditor::new(backend.clone(), settings);
    editor.load_lookups().await.expect("lookups should load");
    editor
}
