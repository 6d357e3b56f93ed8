use thiserror::Error;

pub mod google;
pub mod session;

pub use google::{GoogleAuthClient, GoogleEndpoints, OAuthCallback};
pub use session::{SessionError, SessionSealer};

/// Why a sign-in attempt produced no session. The user has to start over.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("sign-in was not approved: {0}")]
    ConsentDenied(String),

    #[error("authorization callback is missing the code parameter")]
    MissingCode,

    #[error("authorization state did not match; please sign in again")]
    StateMismatch,

    #[error("token exchange failed: status={status} {message}")]
    TokenExchange { status: u16, message: String },

    #[error("identity provider returned no account info")]
    NoAccountInfo,

    #[error("identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("identity provider response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid authorization url: {0}")]
    Url(#[from] url::ParseError),
}
