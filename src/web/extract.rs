use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::debug;

use crate::auth::session::{read_cookie, SESSION_COOKIE};
use crate::models::Session;
use crate::web::error::ApiError;
use crate::web::AppState;

/// The request's signed-in session, if the cookie opens and carries an
/// access token. Handlers receive it as an explicit argument.
#[derive(Debug, Clone, Default)]
pub struct SessionContext(pub Option<Session>);

impl SessionContext {
    pub fn session(&self) -> Option<&Session> {
        self.0.as_ref()
    }

    pub fn require(&self) -> Result<&Session, ApiError> {
        self.session().ok_or(ApiError::Unauthenticated)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for SessionContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(raw) = read_cookie(&parts.headers, SESSION_COOKIE) else {
            return Ok(Self(None));
        };

        let session = match state.sealer.open(raw) {
            Ok(session) if !session.access_token.is_empty() => Some(session),
            Ok(_) => None,
            Err(error) => {
                debug!(error = %error, "ignoring unreadable session cookie");
                None
            }
        };
        Ok(Self(session))
    }
}
