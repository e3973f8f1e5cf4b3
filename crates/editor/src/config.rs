use std::time::Duration;

use timetable_client::config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use timetable_core::periods::{clamp_period_count, TimeTemplate, DEFAULT_PERIOD_COUNT};

/// Default cap on concurrent save requests.
pub const DEFAULT_SAVE_CONCURRENCY: usize = 4;

/// Cap on concurrent busy-time fetches during one conflict check.
pub const BUSY_FETCH_CONCURRENCY: usize = 8;

/// Grid and save behaviour for one [`TimetableEditor`](crate::editor::TimetableEditor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSettings {
    /// Rows in the grid, clamped to 1..=12 when the grid is built.
    pub period_count: usize,
    pub time_template: TimeTemplate,
    /// Maximum save requests in flight at once (at least 1).
    pub save_concurrency: usize,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            period_count: DEFAULT_PERIOD_COUNT,
            time_template: TimeTemplate::Default,
            save_concurrency: DEFAULT_SAVE_CONCURRENCY,
        }
    }
}

/// Configuration errors raised by [`EditorConfig::from_env`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var} has an invalid value '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Everything `timetable-check` needs, loaded from the environment.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    pub client: ClientConfig,
    pub settings: EditorSettings,
    /// Class to open; the first class when unset.
    pub class_name: Option<String>,
}

impl EditorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                     |
    /// |------------------------|-----------------------------|
    /// | `API_BASE_URL`         | `http://localhost:8000/api` |
    /// | `API_ACCESS_TOKEN`     | required                    |
    /// | `API_REFRESH_TOKEN`    | unset                       |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                        |
    /// | `SAVE_CONCURRENCY`     | `4`                         |
    /// | `PERIOD_COUNT`         | `8`                         |
    /// | `TIME_TEMPLATE`        | `default`                   |
    /// | `CLASS_NAME`           | unset                       |
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env_or("API_BASE_URL", DEFAULT_BASE_URL);
        let access_token = std::env::var("API_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::Missing("API_ACCESS_TOKEN"))?;
        let refresh_token = std::env::var("API_REFRESH_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        let request_timeout_secs: u64 =
            parse_var("REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        let save_concurrency: usize = parse_var("SAVE_CONCURRENCY", DEFAULT_SAVE_CONCURRENCY)?;
        let period_count: usize = parse_var("PERIOD_COUNT", DEFAULT_PERIOD_COUNT)?;

        let template_raw = env_or("TIME_TEMPLATE", "default");
        let time_template = template_raw
            .parse::<TimeTemplate>()
            .map_err(|_| ConfigError::Invalid {
                var: "TIME_TEMPLATE",
                value: template_raw.clone(),
            })?;

        let mut client = ClientConfig::new(base_url, access_token)
            .with_timeout(Duration::from_secs(request_timeout_secs));
        if let Some(refresh) = refresh_token {
            client = client.with_refresh_token(refresh);
        }

        Ok(Self {
            client,
            settings: EditorSettings {
                period_count: clamp_period_count(period_count),
                time_template,
                save_concurrency: save_concurrency.max(1),
            },
            class_name: std::env::var("CLASS_NAME")
                .ok()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
        })
    }
}

fn env_or(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { var, value: raw }),
        Err(_) => Ok(default),
    }
}
