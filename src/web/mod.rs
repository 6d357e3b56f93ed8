use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::{GoogleAuthClient, SessionSealer};
use crate::config::Config;
use crate::connectors::{GmailApiClient, MailGateway};

pub mod error;
pub mod extract;
pub mod handlers;

pub use error::ApiError;
pub use extract::SessionContext;

pub const CONTENT_SECURITY_POLICY: &str = "script-src 'self' https://accounts.google.com 'unsafe-inline' 'unsafe-eval'; frame-src https://accounts.google.com; object-src 'none';";

/// Immutable per-process state shared by every request.
pub struct AppState {
    pub gateway: Arc<dyn MailGateway>,
    pub auth: GoogleAuthClient,
    pub sealer: SessionSealer,
    pub max_results: usize,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate().context("validate configuration")?;

        let http = config.http_client().context("build outbound http client")?;
        let gateway = GmailApiClient::new(http.clone(), config.gmail_api_base.clone())
            .with_concurrency(config.fetch_concurrency);
        let auth = GoogleAuthClient::new(
            http,
            config.google_client_id.clone(),
            config.google_client_secret.clone(),
            config.redirect_uri()?,
            config.google.clone(),
        );

        Ok(Self {
            gateway: Arc::new(gateway),
            auth,
            sealer: config.session_sealer()?,
            max_results: config.max_results,
            secure_cookies: config.secure_cookies(),
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/summary", get(handlers::summary_page))
        .route("/api/emails", get(handlers::api_emails))
        .route("/api/summary", get(handlers::api_summary))
        .route("/api/session", get(handlers::api_session))
        .route("/api/health", get(handlers::health))
        .route("/auth/signin", get(handlers::sign_in))
        .route("/auth/callback", get(handlers::callback))
        .route("/auth/signout", post(handlers::sign_out))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: Config) -> Result<()> {
    let state = Arc::new(AppState::from_config(&config)?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("bind {}", config.bind_addr))?;
    info!(
        addr = %config.bind_addr,
        public_url = %config.public_url,
        max_results = config.max_results,
        fetch_concurrency = config.fetch_concurrency,
        "inbox summary server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve http")?;
    info!("inbox summary server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
