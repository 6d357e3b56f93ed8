use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{AppendHeaders, Html, IntoResponse, Redirect, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use url::form_urlencoded;
use uuid::Uuid;

use crate::auth::session::{
    expired_cookie, read_cookie, session_cookie, state_cookie, SESSION_COOKIE, STATE_COOKIE,
};
use crate::auth::OAuthCallback;
use crate::connectors::FetchError;
use crate::models::{MessageRecord, Session};
use crate::output::html::{self, InboxView, SummaryView};
use crate::summary::{summarize_now, DateRange, Summary};
use crate::web::{ApiError, AppState, SessionContext};

#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    auth_error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    range: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EmailsResponse {
    pub emails: Vec<MessageRecord>,
}

async fn fetch_inbox(state: &AppState, session: &Session) -> Result<Vec<MessageRecord>, FetchError> {
    state
        .gateway
        .list_recent_messages(&session.access_token, state.max_results)
        .await
}

pub async fn home(
    State(state): State<Arc<AppState>>,
    context: SessionContext,
    Query(query): Query<HomeQuery>,
) -> Html<String> {
    let notice = query.auth_error.as_deref();
    let Some(session) = context.session() else {
        return Html(html::render_home(None, InboxView::SignedOut, notice));
    };

    let page = match fetch_inbox(&state, session).await {
        Ok(records) => html::render_home(Some(session), InboxView::Loaded(&records), notice),
        Err(error) => {
            warn!(error = %error, "inbox fetch failed");
            let message = error.to_string();
            html::render_home(Some(session), InboxView::Failed(&message), notice)
        }
    };
    Html(page)
}

pub async fn summary_page(
    State(state): State<Arc<AppState>>,
    context: SessionContext,
    Query(query): Query<RangeQuery>,
) -> Response {
    let Some(session) = context.session() else {
        return Redirect::to("/").into_response();
    };

    let range = query
        .range
        .as_deref()
        .and_then(|raw| raw.parse::<DateRange>().ok())
        .unwrap_or_default();

    let page = match fetch_inbox(&state, session).await {
        Ok(records) => {
            let summary = summarize_now(&records, range);
            html::render_summary(range, SummaryView::Loaded(&summary))
        }
        Err(error) => {
            warn!(error = %error, range = %range, "summary fetch failed");
            let message = error.to_string();
            html::render_summary(range, SummaryView::Failed(&message))
        }
    };
    Html(page).into_response()
}

pub async fn api_emails(
    State(state): State<Arc<AppState>>,
    context: SessionContext,
) -> Result<Json<EmailsResponse>, ApiError> {
    let session = context.require()?;
    let emails = fetch_inbox(&state, session).await?;
    Ok(Json(EmailsResponse { emails }))
}

pub async fn api_summary(
    State(state): State<Arc<AppState>>,
    context: SessionContext,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Summary>, ApiError> {
    let session = context.require()?;
    let range = match query.range.as_deref() {
        Some(raw) => raw.parse::<DateRange>().map_err(ApiError::BadRequest)?,
        None => DateRange::default(),
    };
    let records = fetch_inbox(&state, session).await?;
    Ok(Json(summarize_now(&records, range)))
}

pub async fn api_session(context: SessionContext) -> Json<Value> {
    match context.session() {
        Some(session) => Json(json!({
            "authenticated": true,
            "email": session.email,
            "name": session.name,
        })),
        None => Json(json!({ "authenticated": false })),
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn sign_in(State(state): State<Arc<AppState>>) -> Response {
    let csrf_state = Uuid::new_v4().simple().to_string();
    match state.auth.authorization_url(&csrf_state) {
        Ok(url) => (
            AppendHeaders([(SET_COOKIE, state_cookie(&csrf_state, state.secure_cookies))]),
            Redirect::to(url.as_str()),
        )
            .into_response(),
        Err(error) => {
            warn!(error = %error, "could not build google authorization url");
            redirect_with_auth_error(&error.to_string(), state.secure_cookies)
        }
    }
}

pub async fn callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(callback): Query<OAuthCallback>,
) -> Response {
    let expected_state = read_cookie(&headers, STATE_COOKIE);

    let session = match state.auth.authenticate(&callback, expected_state).await {
        Ok(session) => session,
        Err(error) => {
            warn!(error = %error, "google sign-in failed");
            return redirect_with_auth_error(&error.to_string(), state.secure_cookies);
        }
    };

    let sealed = match state.sealer.seal(&session) {
        Ok(sealed) => sealed,
        Err(error) => {
            warn!(error = %error, "could not seal session");
            return redirect_with_auth_error(&error.to_string(), state.secure_cookies);
        }
    };

    info!(email = %session.display_email(), "session created");
    (
        AppendHeaders([
            (SET_COOKIE, session_cookie(&sealed, state.secure_cookies)),
            (SET_COOKIE, expired_cookie(STATE_COOKIE, state.secure_cookies)),
        ]),
        Redirect::to("/"),
    )
        .into_response()
}

pub async fn sign_out(State(state): State<Arc<AppState>>, context: SessionContext) -> Response {
    if let Some(session) = context.session() {
        info!(email = %session.display_email(), "session ended");
    }
    (
        AppendHeaders([(SET_COOKIE, expired_cookie(SESSION_COOKIE, state.secure_cookies))]),
        Redirect::to("/"),
    )
        .into_response()
}

fn redirect_with_auth_error(message: &str, secure: bool) -> Response {
    let encoded: String = form_urlencoded::byte_serialize(message.as_bytes()).collect();
    (
        AppendHeaders([(SET_COOKIE, expired_cookie(STATE_COOKIE, secure))]),
        Redirect::to(&format!("/?auth_error={encoded}")),
    )
        .into_response()
}
