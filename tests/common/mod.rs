#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::{json, Value};

pub const GOOD_TOKEN: &str = "ya29.good-token";
pub const GOOD_CODE: &str = "4/good-code";
pub const USER_EMAIL: &str = "user@gmail.com";

/// One message held by the fake Gmail backend.
#[derive(Debug, Clone)]
pub struct FakeMessage {
    pub id: Option<String>,
    pub from: Option<String>,
    pub subject: Option<String>,
    pub snippet: String,
    pub internal_date_ms: i64,
    /// Artificial latency for the detail request.
    pub delay_ms: u64,
    pub fail_detail: bool,
    pub malformed_detail: bool,
}

impl FakeMessage {
    pub fn new(id: &str, from: &str, subject: &str, internal_date_ms: i64) -> Self {
        Self {
            id: Some(id.to_string()),
            from: Some(from.to_string()),
            subject: Some(subject.to_string()),
            snippet: format!("snippet for {id}"),
            internal_date_ms,
            delay_ms: 0,
            fail_detail: false,
            malformed_detail: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeGoogle {
    pub messages: Vec<FakeMessage>,
    /// Token endpoint rejects every code.
    pub token_error: bool,
    /// Userinfo answers without an email.
    pub userinfo_without_email: bool,
}

impl FakeGoogle {
    pub fn with_messages(messages: Vec<FakeMessage>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(|value| value == format!("Bearer {GOOD_TOKEN}"))
        .unwrap_or(false)
}

fn google_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({
            "error": { "code": status.as_u16(), "message": message, "status": "ERROR" }
        })),
    )
        .into_response()
}

async fn list_messages(
    State(fake): State<Arc<FakeGoogle>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return google_error(
            StatusCode::UNAUTHORIZED,
            "Request had invalid authentication credentials.",
        );
    }
    let max_results = query
        .get("maxResults")
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(100);

    if fake.messages.is_empty() {
        return Json(json!({ "resultSizeEstimate": 0 })).into_response();
    }

    let stubs: Vec<Value> = fake
        .messages
        .iter()
        .take(max_results)
        .map(|message| match &message.id {
            Some(id) => json!({ "id": id, "threadId": format!("t-{id}") }),
            None => json!({ "threadId": "t-orphan" }),
        })
        .collect();
    Json(json!({
        "messages": stubs,
        "nextPageToken": "ignored-page",
        "resultSizeEstimate": fake.messages.len()
    }))
    .into_response()
}

async fn get_message(
    State(fake): State<Arc<FakeGoogle>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return google_error(
            StatusCode::UNAUTHORIZED,
            "Request had invalid authentication credentials.",
        );
    }
    let Some(message) = fake
        .messages
        .iter()
        .find(|message| message.id.as_deref() == Some(id.as_str()))
    else {
        return google_error(StatusCode::NOT_FOUND, "Requested entity was not found.");
    };

    if message.delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(message.delay_ms)).await;
    }
    if message.fail_detail {
        return google_error(StatusCode::INTERNAL_SERVER_ERROR, "Backend Error");
    }
    if message.malformed_detail {
        return (StatusCode::OK, "{\"id\": 42, \"payload\": [").into_response();
    }

    let mut headers = Vec::new();
    if let Some(from) = &message.from {
        headers.push(json!({ "name": "From", "value": from }));
    }
    if let Some(subject) = &message.subject {
        headers.push(json!({ "name": "Subject", "value": subject }));
    }
    Json(json!({
        "id": id,
        "threadId": format!("t-{id}"),
        "snippet": message.snippet,
        "internalDate": message.internal_date_ms.to_string(),
        "payload": { "headers": headers }
    }))
    .into_response()
}

async fn token(
    State(fake): State<Arc<FakeGoogle>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let valid = !fake.token_error
        && form.get("grant_type").map(String::as_str) == Some("authorization_code")
        && form.get("code").map(String::as_str) == Some(GOOD_CODE)
        && form.get("client_id").is_some()
        && form.get("client_secret").is_some();
    if !valid {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant", "error_description": "Bad Request" })),
        )
            .into_response();
    }
    Json(json!({
        "access_token": GOOD_TOKEN,
        "refresh_token": "1//refresh-token",
        "expires_in": 3599,
        "scope": "https://www.googleapis.com/auth/gmail.readonly",
        "token_type": "Bearer"
    }))
    .into_response()
}

async fn userinfo(State(fake): State<Arc<FakeGoogle>>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return google_error(StatusCode::UNAUTHORIZED, "Invalid Credentials");
    }
    if fake.userinfo_without_email {
        return Json(json!({ "sub": "1234" })).into_response();
    }
    Json(json!({ "sub": "1234", "email": USER_EMAIL, "name": "Gmail User" })).into_response()
}

/// Serve the fake provider and return its base URL. Gmail lives under
/// `/gmail/v1`, OAuth endpoints under `/token` and `/userinfo`.
pub async fn spawn_fake_google(fake: FakeGoogle) -> String {
    let app = Router::new()
        .route("/gmail/v1/users/me/messages", get(list_messages))
        .route("/gmail/v1/users/me/messages/:id", get(get_message))
        .route("/token", post(token))
        .route("/userinfo", get(userinfo))
        .with_state(Arc::new(fake));
    spawn(app).await
}

pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("read test listener addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve test app");
    });
    format!("http://{addr}")
}
