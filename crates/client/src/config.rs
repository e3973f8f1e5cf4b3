use std::time::Duration;

/// Default backend base URL for local development.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Connection settings for [`SchoolApi`](crate::api::SchoolApi).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `http://host:8000/api` (trailing slashes ignored).
    pub base_url: String,
    /// Bearer token attached to every request.
    pub access_token: String,
    /// Exchanged for a new access token when the backend answers `401`.
    pub refresh_token: Option<String>,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            access_token: access_token.into(),
            refresh_token: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
