//! REST client for the school backend's timetable endpoints.
//!
//! [`api::SchoolApi`] wraps the HTTP API with bearer authentication and a
//! one-shot token refresh on `401`, and implements
//! [`timetable_core::backend::ScheduleBackend`] so the editor can run
//! against it.

pub mod api;
pub mod backend;
pub mod config;
