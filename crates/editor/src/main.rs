//! `timetable-check` -- report timetable conflicts for one class.
//!
//! Loads the class's persisted weekly schedule into the grid, runs the
//! in-grid and cross-class conflict checks, and logs every marked cell.
//! Exits with status 2 when any conflict is found.
//!
//! # Environment variables
//!
//! | Variable               | Required | Default                     | Description                        |
//! |------------------------|----------|-----------------------------|------------------------------------|
//! | `API_BASE_URL`         | no       | `http://localhost:8000/api` | School backend REST root           |
//! | `API_ACCESS_TOKEN`     | yes      | --                          | Bearer token                       |
//! | `API_REFRESH_TOKEN`    | no       | --                          | Used once when the token expires   |
//! | `REQUEST_TIMEOUT_SECS` | no       | `30`                        | Per-request timeout                |
//! | `SAVE_CONCURRENCY`     | no       | `4`                         | Concurrent writes during a save    |
//! | `PERIOD_COUNT`         | no       | `8`                         | Grid rows, clamped to 1..=12       |
//! | `TIME_TEMPLATE`        | no       | `default`                   | `default` or `blank` period times  |
//! | `CLASS_NAME`           | no       | first class                 | Class name or part of it           |

use std::sync::Arc;

use timetable_client::api::SchoolApi;
use timetable_editor::config::EditorConfig;
use timetable_editor::editor::TimetableEditor;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "timetable_editor=info,timetable_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EditorConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    let api = SchoolApi::new(&config.client).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build HTTP client");
        std::process::exit(1);
    });

    tracing::info!(
        base_url = %api.base_url(),
        period_count = config.settings.period_count,
        "Starting timetable-check",
    );

    let mut editor = TimetableEditor::new(Arc::new(api), config.settings.clone());

    if let Err(e) = editor.load_lookups().await {
        tracing::error!(error = %e, "Failed to load lookups");
        std::process::exit(1);
    }

    let Some(class) = editor.find_class(config.class_name.as_deref()).cloned() else {
        tracing::error!(class_name = ?config.class_name, "No matching class");
        std::process::exit(1);
    };

    let report = match editor.select_class(class.id).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(class_id = class.id, error = %e, "Failed to load schedule");
            std::process::exit(1);
        }
    };

    if !report.is_complete() {
        tracing::warn!(
            overflow = report.overflow.len(),
            invalid_weekday = report.invalid_weekday.len(),
            "Some entries were not placed on the grid",
        );
    }

    let conflicts = editor.conflicts();
    for (key, conflict) in conflicts.iter() {
        tracing::warn!(
            cell = %key,
            duplicate_teacher = conflict.duplicate_teacher,
            duplicate_room = conflict.duplicate_room,
            reason = %conflict.reason().unwrap_or_default(),
            "Conflict",
        );
    }

    tracing::info!(
        class_name = %class.name,
        placed = report.placed,
        conflicted = conflicts.len(),
        "Check complete",
    );

    if !conflicts.is_empty() {
        std::process::exit(2);
    }
}
