//! The seam between the timetable editor and the school REST backend.
//!
//! The production implementation lives in `timetable-client`; tests plug
//! in an in-memory backend.

use async_trait::async_trait;

use crate::lookups::{CurrentUser, SchoolClass, Subject, Teacher};
use crate::schedule::{EntryPayload, ScheduleEntry};
use crate::types::DbId;

/// Errors surfaced by a [`ScheduleBackend`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Credentials were rejected and could not be refreshed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The backend answered with a non-success status. `message` is the
    /// response body, or `HTTP <status>` when the body was empty.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The request never produced a usable response.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl BackendError {
    /// Build an [`Http`](Self::Http) error, falling back to the status
    /// line when the body is blank.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = if body.trim().is_empty() {
            format!("HTTP {status}")
        } else {
            body
        };
        Self::Http { status, message }
    }
}

/// Backend operations the timetable editor relies on.
#[async_trait]
pub trait ScheduleBackend: Send + Sync {
    /// `GET /auth/me/`.
    async fn current_user(&self) -> Result<CurrentUser, BackendError>;

    /// `GET /classes/`.
    async fn list_classes(&self) -> Result<Vec<SchoolClass>, BackendError>;

    /// `GET /subjects/`.
    async fn list_subjects(&self) -> Result<Vec<Subject>, BackendError>;

    /// `GET /teachers/`.
    async fn list_teachers(&self) -> Result<Vec<Teacher>, BackendError>;

    /// `GET /schedule/class/{id}/`.
    async fn class_schedule(&self, class_id: DbId) -> Result<Vec<ScheduleEntry>, BackendError>;

    /// `GET /schedule/?teacher={id}`, across all classes and weekdays.
    async fn teacher_schedule(&self, teacher_id: DbId) -> Result<Vec<ScheduleEntry>, BackendError>;

    /// `POST /schedule/`.
    async fn create_entry(&self, payload: &EntryPayload) -> Result<ScheduleEntry, BackendError>;

    /// `PUT /schedule/{id}/`.
    async fn update_entry(
        &self,
        id: DbId,
        payload: &EntryPayload,
    ) -> Result<ScheduleEntry, BackendError>;

    /// `DELETE /schedule/{id}/`.
    async fn delete_entry(&self, id: DbId) -> Result<(), BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_falls_back_to_status() {
        assert_eq!(BackendError::http(500, "  ").to_string(), "HTTP 500");
    }

    #[test]
    fn body_becomes_the_message() {
        let err = BackendError::http(400, "{\"room\":[\"too long\"]}");
        assert_eq!(err.to_string(), "{\"room\":[\"too long\"]}");
    }
}
