//! Lookup lists (classes, subjects, teachers) and the caller's role.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// Roles allowed to edit class timetables.
pub const TIMETABLE_EDITOR_ROLES: &[&str] = &["admin", "registrar"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolClass {
    pub id: DbId,
    /// e.g. `"7-A"`.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: DbId,
    pub name: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: DbId,
    #[serde(default)]
    pub user: Option<DbId>,
    #[serde(default)]
    pub user_full_name: String,
    /// Subject id this teacher is qualified for.
    #[serde(default)]
    pub specialty: Option<DbId>,
    #[serde(default)]
    pub specialty_name: String,
}

impl Teacher {
    /// Label shown in teacher pickers: the full name, then an em dash and
    /// the specialty when one is set.
    pub fn display_name(&self) -> String {
        let name = if self.user_full_name.trim().is_empty() {
            match self.user {
                Some(user) => format!("#{user}"),
                None => format!("#{}", self.id),
            }
        } else {
            self.user_full_name.trim().to_string()
        };
        if self.specialty_name.is_empty() {
            name
        } else {
            format!("{name} \u{2014} {}", self.specialty_name)
        }
    }

    /// Whether the teacher may be offered for `subject`.
    ///
    /// With no subject chosen every teacher qualifies; otherwise only
    /// teachers whose specialty is that subject.
    pub fn teaches(&self, subject: Option<DbId>) -> bool {
        match subject {
            None => true,
            Some(subject) => self.specialty == Some(subject),
        }
    }
}

/// Response of `GET /auth/me/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    #[serde(default)]
    pub id: Option<DbId>,
    #[serde(default)]
    pub role: String,
}

impl CurrentUser {
    pub fn can_edit_timetable(&self) -> bool {
        TIMETABLE_EDITOR_ROLES.contains(&self.role.as_str())
    }
}

/// Everything the grid needs to resolve ids into choices.
#[derive(Debug, Clone, Default)]
pub struct Lookups {
    pub classes: Vec<SchoolClass>,
    pub subjects: Vec<Subject>,
    pub teachers: Vec<Teacher>,
}

impl Lookups {
    pub fn class(&self, id: DbId) -> Option<&SchoolClass> {
        self.classes.iter().find(|c| c.id == id)
    }

    pub fn class_by_name(&self, name: &str) -> Option<&SchoolClass> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn teacher(&self, id: DbId) -> Option<&Teacher> {
        self.teachers.iter().find(|t| t.id == id)
    }

    /// Teachers offered in the picker once `subject` is chosen.
    pub fn teachers_for_subject(&self, subject: Option<DbId>) -> Vec<&Teacher> {
        self.teachers.iter().filter(|t| t.teaches(subject)).collect()
    }

    /// Whether `teacher` survives re-filtering the picker for `subject`.
    /// Unknown teacher ids never do.
    pub fn teacher_allowed(&self, teacher: DbId, subject: Option<DbId>) -> bool {
        self.teacher(teacher).is_some_and(|t| t.teaches(subject))
    }
}

/// Classes sorted by name, keeping case-insensitive substring matches.
pub fn filter_classes<'a>(classes: &'a [SchoolClass], query: &str) -> Vec<&'a SchoolClass> {
    let query = query.trim().to_lowercase();
    let mut matches: Vec<&SchoolClass> = classes
        .iter()
        .filter(|c| query.is_empty() || c.name.to_lowercase().contains(&query))
        .collect();
    matches.sort_by(|a, b| a.name.cmp(&b.name));
    matches
}
