use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::connectors::FetchError;

/// Failure of a JSON API call, rendered as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not authenticated")]
    Unauthenticated,

    /// Includes malformed provider payloads; the provider's text is passed through.
    #[error(transparent)]
    Gateway(#[from] FetchError),

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Gateway(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let Self::Gateway(source) = &self {
            error!(error = %source, upstream_status = ?source.status(), "gmail api error");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
