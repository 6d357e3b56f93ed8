use std::net::SocketAddr;
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::auth::{GoogleEndpoints, SessionError, SessionSealer};
use crate::connectors::gmail_api::{DEFAULT_FETCH_CONCURRENCY, GMAIL_API_BASE};
use crate::connectors::DEFAULT_MAX_RESULTS;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Gmail caps `users.messages.list` at 500 ids per page.
pub const MAX_RESULTS_LIMIT: usize = 500;
pub const CALLBACK_PATH: &str = "/auth/callback";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing google client id (GOOGLE_CLIENT_ID)")]
    MissingClientId,

    #[error("missing google client secret (GOOGLE_CLIENT_SECRET)")]
    MissingClientSecret,

    #[error("invalid public url '{0}'")]
    PublicUrl(String),

    #[error("max results must be between 1 and {max}, got {0}", max = MAX_RESULTS_LIMIT)]
    MaxResults(usize),

    #[error("fetch concurrency must be at least 1")]
    Concurrency,

    #[error("request timeout must be at least 1 second")]
    RequestTimeout,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// Origin the browser uses to reach the service; the OAuth redirect URI
    /// is derived from it.
    pub public_url: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    /// 64 hex characters. `None` generates a per-process key.
    pub session_key: Option<String>,
    pub gmail_api_base: String,
    pub google: GoogleEndpoints,
    pub max_results: usize,
    pub fetch_concurrency: usize,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            google_client_id: String::new(),
            google_client_secret: String::new(),
            session_key: None,
            gmail_api_base: GMAIL_API_BASE.to_string(),
            google: GoogleEndpoints::default(),
            max_results: DEFAULT_MAX_RESULTS,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.google_client_id.trim().is_empty() {
            return Err(ConfigError::MissingClientId);
        }
        if self.google_client_secret.trim().is_empty() {
            return Err(ConfigError::MissingClientSecret);
        }
        self.parsed_public_url()?;
        if self.max_results == 0 || self.max_results > MAX_RESULTS_LIMIT {
            return Err(ConfigError::MaxResults(self.max_results));
        }
        if self.fetch_concurrency == 0 {
            return Err(ConfigError::Concurrency);
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::RequestTimeout);
        }
        if let Some(key) = self.session_key.as_deref() {
            crate::auth::session::parse_session_key_hex(key)?;
        }
        Ok(())
    }

    pub fn redirect_uri(&self) -> Result<String, ConfigError> {
        self.parsed_public_url()?
            .join(CALLBACK_PATH)
            .map(String::from)
            .map_err(|_| ConfigError::PublicUrl(self.public_url.clone()))
    }

    pub fn secure_cookies(&self) -> bool {
        self.parsed_public_url()
            .map(|url| url.scheme() == "https")
            .unwrap_or(false)
    }

    pub fn http_client(&self) -> Result<Client, ConfigError> {
        Ok(Client::builder().timeout(self.request_timeout).build()?)
    }

    pub fn session_sealer(&self) -> Result<SessionSealer, ConfigError> {
        match self
            .session_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
        {
            Some(key) => Ok(SessionSealer::from_hex(key)?),
            None => {
                warn!("no session key configured; generated a random one, sessions end on restart");
                Ok(SessionSealer::generate()?)
            }
        }
    }

    fn parsed_public_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(self.public_url.trim())
            .map_err(|_| ConfigError::PublicUrl(self.public_url.clone()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::PublicUrl(self.public_url.clone()));
        }
        Ok(url)
    }
}
