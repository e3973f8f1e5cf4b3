//! [`ScheduleBackend`] implementation over [`SchoolApi`].

use async_trait::async_trait;
use timetable_core::backend::{BackendError, ScheduleBackend};
use timetable_core::lookups::{CurrentUser, SchoolClass, Subject, Teacher};
use timetable_core::schedule::{EntryPayload, ScheduleEntry};
use timetable_core::types::DbId;

use crate::api::{SchoolApi, SchoolApiError};

impl From<SchoolApiError> for BackendError {
    fn from(err: SchoolApiError) -> Self {
        match err {
            SchoolApiError::Request(e) => BackendError::Transport(e.to_string()),
            SchoolApiError::ApiError { status, body } => BackendError::http(status, body),
            SchoolApiError::Unauthorized(msg) => BackendError::Unauthorized(msg),
        }
    }
}

#[async_trait]
impl ScheduleBackend for SchoolApi {
    async fn current_user(&self) -> Result<CurrentUser, BackendError> {
        Ok(SchoolApi::current_user(self).await?)
    }

    async fn list_classes(&self) -> Result<Vec<SchoolClass>, BackendError> {
        Ok(SchoolApi::list_classes(self).await?)
    }

    async fn list_subjects(&self) -> Result<Vec<Subject>, BackendError> {
        Ok(SchoolApi::list_subjects(self).await?)
    }

    async fn list_teachers(&self) -> Result<Vec<Teacher>, BackendError> {
        Ok(SchoolApi::list_teachers(self).await?)
    }

    async fn class_schedule(&self, class_id: DbId) -> Result<Vec<ScheduleEntry>, BackendError> {
        Ok(SchoolApi::class_schedule(self, class_id).await?)
    }

    async fn teacher_schedule(&self, teacher_id: DbId) -> Result<Vec<ScheduleEntry>, BackendError> {
        Ok(SchoolApi::teacher_schedule(self, teacher_id).await?)
    }

    async fn create_entry(&self, payload: &EntryPayload) -> Result<ScheduleEntry, BackendError> {
        Ok(SchoolApi::create_entry(self, payload).await?)
    }

    async fn update_entry(
        &self,
        id: DbId,
        payload: &EntryPayload,
    ) -> Result<ScheduleEntry, BackendError> {
        Ok(SchoolApi::update_entry(self, id, payload).await?)
    }

    async fn delete_entry(&self, id: DbId) -> Result<(), BackendError> {
        Ok(SchoolApi::delete_entry(self, id).await?)
    }
}
