use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use crate::auth::AuthError;
use crate::connectors::gmail_api::redact_response_body;
use crate::models::Session;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Profile, email address and read-only mail access.
pub const OAUTH_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/userinfo.profile",
    "https://www.googleapis.com/auth/gmail.readonly",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
        }
    }
}

/// Query string Google appends to the redirect URI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GoogleAuthClient {
    client: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    endpoints: GoogleEndpoints,
}

impl GoogleAuthClient {
    pub fn new(
        client: Client,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        endpoints: GoogleEndpoints,
    ) -> Self {
        Self {
            client,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            endpoints,
        }
    }

    /// Consent is forced on every login and offline access is requested, so
    /// Google hands back a refresh token each time.
    pub fn authorization_url(&self, state: &str) -> Result<Url, AuthError> {
        let scope = OAUTH_SCOPES.join(" ");
        Ok(Url::parse_with_params(
            &self.endpoints.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("prompt", "consent"),
                ("access_type", "offline"),
                ("state", state),
            ],
        )?)
    }

    /// Finish the authorization-code flow and build the session.
    pub async fn authenticate(
        &self,
        callback: &OAuthCallback,
        expected_state: Option<&str>,
    ) -> Result<Session, AuthError> {
        if let Some(error) = callback.error.as_deref() {
            warn!(error = %error, "google sign-in was not approved");
            return Err(AuthError::ConsentDenied(error.to_string()));
        }

        verify_state(callback.state.as_deref(), expected_state)?;

        let code = callback
            .code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .ok_or(AuthError::MissingCode)?;

        let tokens = self.exchange_code(code).await?;
        let profile = self.fetch_userinfo(&tokens.access_token).await?;

        let email = profile
            .email
            .filter(|email| !email.trim().is_empty())
            .ok_or(AuthError::NoAccountInfo)?;
        info!(email = %email, "google sign-in completed");

        Ok(Session {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: tokens
                .expires_in
                .map(|secs| Utc::now().timestamp() + secs as i64),
            email: Some(email),
            name: profile.name,
        })
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthTokenResponse, AuthError> {
        let response = self
            .client
            .post(&self.endpoints.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AuthError::TokenExchange {
                status: status.as_u16(),
                message: redact_response_body(&body),
            });
        }

        let tokens: OAuthTokenResponse = serde_json::from_str(&body)?;
        if tokens.access_token.trim().is_empty() {
            return Err(AuthError::NoAccountInfo);
        }
        Ok(tokens)
    }

    async fn fetch_userinfo(&self, access_token: &str) -> Result<GoogleUserInfo, AuthError> {
        let response = self
            .client
            .get(&self.endpoints.userinfo_url)
            .bearer_auth(access_token)
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                body = %redact_response_body(&body),
                "google userinfo request failed"
            );
            return Err(AuthError::NoAccountInfo);
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[allow(deprecated)]
fn verify_state(received: Option<&str>, expected: Option<&str>) -> Result<(), AuthError> {
    match (received, expected) {
        (Some(received), Some(expected))
            if !expected.is_empty()
                && ring::constant_time::verify_slices_are_equal(
                    received.as_bytes(),
                    expected.as_bytes(),
                )
                .is_ok() =>
        {
            Ok(())
        }
        _ => Err(AuthError::StateMismatch),
    }
}

// --- OAuth types ---

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
struct OAuthTokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    token_type: Option<String>,
    scope: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct GoogleUserInfo {
    email: Option<String>,
    name: Option<String>,
}
