//! In-process mock of the school backend, served by axum on an
//! ephemeral localhost port.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

/// The only access token the mock accepts.
pub const GOOD_TOKEN: &str = "good";

/// The only refresh token the mock exchanges.
pub const GOOD_REFRESH: &str = "r1";

#[derive(Default)]
pub struct MockState {
    /// `"METHOD /path?query"` for every request received.
    pub hits: Mutex<Vec<String>>,
}

impl MockState {
    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.hits().iter().filter(|h| h.starts_with(prefix)).count()
    }
}

pub struct MockServer {
    pub base_url: String,
    pub state: Arc<MockState>,
}

/// Spawn the mock backend and return its `/api` base URL.
pub async fn spawn() -> MockServer {
    let state = Arc::new(MockState::default());

    let app = Router::new()
        .route("/api/auth/me/", get(me))
        .route("/api/auth/refresh/", post(refresh))
        .route("/api/classes/", get(classes))
        .route("/api/subjects/", get(subjects))
        .route("/api/teachers/", get(teachers))
        .route("/api/schedule/", get(teacher_schedule).post(create_entry))
        .route("/api/schedule/class/{id}/", get(class_schedule))
        .route("/api/schedule/{id}/", put(update_entry).delete(delete_entry))
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("bind mock backend");
    let addr = listener.local_addr().expect("mock backend address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock backend crashed");
    });

    MockServer {
        base_url: format!("http://{addr}/api/"),
        state,
    }
}

async fn record(State(state): State<Arc<MockState>>, req: Request, next: Next) -> Response {
    state
        .hits
        .lock()
        .unwrap()
        .push(format!("{} {}", req.method(), req.uri()));
    next.run(req).await
}

fn authorized(headers: &HeaderMap) -> Result<(), StatusCode> {
    let expected = format!("Bearer {GOOD_TOKEN}");
    match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

fn entry(id: i64, clazz: i64, class_name: &str, teacher: i64, weekday: u8, start: &str, end: &str) -> Value {
    json!({
        "id": id,
        "clazz": clazz,
        "class_name": class_name,
        "subject": 2,
        "subject_name": "Physics",
        "teacher": teacher,
        "teacher_name": "",
        "weekday": weekday,
        "start_time": start,
        "end_time": end,
        "room": "305"
    })
}

async fn me(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    authorized(&headers)?;
    Ok(Json(json!({"id": 1, "role": "admin", "phone": "+998900000000"})))
}

async fn refresh(Json(body): Json<Value>) -> Response {
    if body["refresh"] == GOOD_REFRESH {
        Json(json!({"access": GOOD_TOKEN})).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Token is invalid or expired"}))).into_response()
    }
}

async fn classes(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    authorized(&headers)?;
    Ok(Json(json!({
        "count": 2,
        "next": null,
        "previous": null,
        "results": [{"id": 1, "name": "7-A"}, {"id": 2, "name": "8-B"}]
    })))
}

async fn subjects(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    authorized(&headers)?;
    Ok(Json(json!([
        {"id": 1, "name": "Math", "code": "MATH"},
        {"id": 2, "name": "Physics", "code": "PHYS"}
    ])))
}

async fn teachers(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    authorized(&headers)?;
    Ok(Json(json!([
        {"id": 12, "user": 40, "user_full_name": "Aziz Karimov", "user_phone": "",
         "specialty": 2, "specialty_name": "Physics", "is_class_teacher": false, "notes": ""},
        {"id": 13, "user": 41, "user_full_name": "", "user_phone": "",
         "specialty": null, "specialty_name": "", "is_class_teacher": true, "notes": ""}
    ])))
}

async fn teacher_schedule(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    authorized(&headers)?;
    let teacher: i64 = params
        .get("teacher")
        .and_then(|t| t.parse().ok())
        .ok_or(StatusCode::BAD_REQUEST)?;
    Ok(Json(json!({
        "count": 2,
        "results": [
            entry(41, 2, "8-B", teacher, 2, "10:50:00", "11:35:00"),
            entry(42, 2, "8-B", teacher, 4, "08:30:00", "09:15:00")
        ]
    })))
}

async fn class_schedule(headers: HeaderMap, Path(id): Path<i64>) -> Result<Json<Value>, StatusCode> {
    authorized(&headers)?;
    Ok(Json(json!([
        entry(7, id, "7-A", 12, 1, "08:30:00", "09:15:00"),
        entry(8, id, "7-A", 13, 1, "09:25:00", "10:10:00")
    ])))
}

async fn create_entry(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(status) = authorized(&headers) {
        return status.into_response();
    }
    if body["room"] == "bad" {
        return (StatusCode::BAD_REQUEST, r#"{"room":["invalid room"]}"#).into_response();
    }
    let mut created = body.clone();
    created["id"] = json!(500);
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn update_entry(
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    authorized(&headers)?;
    let mut updated = body;
    updated["id"] = json!(id);
    Ok(Json(updated))
}

async fn delete_entry(headers: HeaderMap, Path(id): Path<i64>) -> StatusCode {
    if authorized(&headers).is_err() {
        return StatusCode::UNAUTHORIZED;
    }
    if id == 404 {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}
