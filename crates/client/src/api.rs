//! HTTP client for the school backend.
//!
//! Wraps the timetable-related REST endpoints (lookups, per-class and
//! per-teacher schedules, entry create/update/delete) using [`reqwest`].
//! Every request carries the current bearer token; a `401` triggers one
//! refresh-token exchange and a single retry.

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use timetable_core::lookups::{CurrentUser, SchoolClass, Subject, Teacher};
use timetable_core::schedule::{EntryPayload, ListResponse, ScheduleEntry};
use timetable_core::types::DbId;
use tokio::sync::RwLock;

use crate::config::ClientConfig;

/// HTTP client for one school backend.
pub struct SchoolApi {
    client: reqwest::Client,
    base_url: String,
    tokens: RwLock<Tokens>,
}

struct Tokens {
    access: String,
    refresh: Option<String>,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    access: Option<String>,
}

/// Errors from the school REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum SchoolApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, body decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("School API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The access token was rejected and could not be refreshed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl SchoolApi {
    /// Create a client with its own connection pool and the configured
    /// request timeout.
    pub fn new(config: &ClientConfig) -> Result<Self, SchoolApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tokens: RwLock::new(Tokens {
                access: config.access_token.clone(),
                refresh: config.refresh_token.clone(),
            }),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The access token currently attached to requests.
    pub async fn access_token(&self) -> String {
        self.tokens.read().await.access.clone()
    }

    /// `GET /auth/me/`.
    pub async fn current_user(&self) -> Result<CurrentUser, SchoolApiError> {
        let response = self.get("/auth/me/").await?;
        Self::read_json(response).await
    }

    /// `GET /classes/`.
    pub async fn list_classes(&self) -> Result<Vec<SchoolClass>, SchoolApiError> {
        self.get_list("/classes/").await
    }

    /// `GET /subjects/`.
    pub async fn list_subjects(&self) -> Result<Vec<Subject>, SchoolApiError> {
        self.get_list("/subjects/").await
    }

    /// `GET /teachers/`.
    pub async fn list_teachers(&self) -> Result<Vec<Teacher>, SchoolApiError> {
        self.get_list("/teachers/").await
    }

    /// All persisted entries of one class, ordered by weekday and start.
    pub async fn class_schedule(&self, class_id: DbId) -> Result<Vec<ScheduleEntry>, SchoolApiError> {
        self.get_list(&format!("/schedule/class/{class_id}/")).await
    }

    /// All entries taught by one teacher, across every class.
    pub async fn teacher_schedule(
        &self,
        teacher_id: DbId,
    ) -> Result<Vec<ScheduleEntry>, SchoolApiError> {
        self.get_list(&format!("/schedule/?teacher={teacher_id}")).await
    }

    /// `POST /schedule/`. Returns the created entry with its new id.
    pub async fn create_entry(&self, payload: &EntryPayload) -> Result<ScheduleEntry, SchoolApiError> {
        let response = self.send(Method::POST, "/schedule/", Some(payload)).await?;
        Self::read_json(response).await
    }

    /// `PUT /schedule/{id}/`.
    pub async fn update_entry(
        &self,
        id: DbId,
        payload: &EntryPayload,
    ) -> Result<ScheduleEntry, SchoolApiError> {
        let response = self
            .send(Method::PUT, &format!("/schedule/{id}/"), Some(payload))
            .await?;
        Self::read_json(response).await
    }

    /// `DELETE /schedule/{id}/`. The backend answers `204 No Content`.
    pub async fn delete_entry(&self, id: DbId) -> Result<(), SchoolApiError> {
        let response = self
            .send(Method::DELETE, &format!("/schedule/{id}/"), None::<&()>)
            .await?;
        Self::expect_success(response).await.map(|_| ())
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, SchoolApiError> {
        self.send(Method::GET, path, None::<&()>).await
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, SchoolApiError> {
        let response = self.get(path).await?;
        let list: ListResponse<T> = Self::read_json(response).await?;
        Ok(list.into_vec())
    }

    /// Send with the current token; on `401` refresh once and retry.
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, SchoolApiError> {
        let response = self.send_once(method.clone(), path, body).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::debug!(path, "Access token rejected, attempting refresh");
        if !self.refresh_access_token().await? {
            return Err(SchoolApiError::Unauthorized(
                "session expired, log in again".to_string(),
            ));
        }

        let retry = self.send_once(method, path, body).await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            return Err(SchoolApiError::Unauthorized(
                "access token rejected after refresh".to_string(),
            ));
        }
        Ok(retry)
    }

    async fn send_once<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, SchoolApiError> {
        let token = self.access_token().await;
        let mut request = self.client.request(method, self.url(path)).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Returns `Ok(false)` when there is no refresh token or the backend
    /// refuses it; only transport failures are errors.
    async fn refresh_access_token(&self) -> Result<bool, SchoolApiError> {
        let Some(refresh) = self.tokens.read().await.refresh.clone() else {
            return Ok(false);
        };

        let response = self
            .client
            .post(self.url("/auth/refresh/"))
            .json(&RefreshRequest { refresh: &refresh })
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!(status = response.status().as_u16(), "Token refresh refused");
            return Ok(false);
        }

        let body = response.json::<RefreshResponse>().await.unwrap_or_default();
        match body.access {
            Some(access) => {
                self.tokens.write().await.access = access;
                tracing::info!("Access token refreshed");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Turn a non-2xx reply into [`SchoolApiError::ApiError`].
    ///
    /// The body is kept verbatim: for rejected schedule writes it holds the
    /// backend's per-field validation messages, which callers show as is.
    async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response, SchoolApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let path = response.url().path().to_string();
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), path = %path, "School API rejected request");
        Err(SchoolApiError::ApiError {
            status: status.as_u16(),
            body,
        })
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, SchoolApiError> {
        Ok(Self::expect_success(response).await?.json::<T>().await?)
    }
}
