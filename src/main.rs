use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use inbox_summary::summary::DateRange;

#[derive(Debug, Parser)]
#[command(
    name = "inbox-summary",
    version,
    about = "Sign in with Google and summarize your Gmail inbox"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output structured JSON (list/summary)
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the web app
    Serve(ServeArgs),
    /// Print the most recent inbox messages for an access token
    List(FetchArgs),
    /// Print per-sender counts for today or yesterday
    Summary(SummaryArgs),
}

#[derive(Debug, Args)]
struct ServeArgs {
    #[arg(long, env = "INBOX_SUMMARY_BIND", default_value = inbox_summary::config::DEFAULT_BIND_ADDR)]
    bind: std::net::SocketAddr,

    /// Origin browsers use to reach this server
    #[arg(long, env = "INBOX_SUMMARY_PUBLIC_URL", default_value = inbox_summary::config::DEFAULT_PUBLIC_URL)]
    public_url: String,

    #[arg(long, env = "GOOGLE_CLIENT_ID", hide_env_values = true)]
    google_client_id: String,

    #[arg(long, env = "GOOGLE_CLIENT_SECRET", hide_env_values = true)]
    google_client_secret: String,

    /// 64 hex characters; a random key is generated when unset
    #[arg(long, env = "INBOX_SUMMARY_SESSION_KEY", hide_env_values = true)]
    session_key: Option<String>,

    #[arg(long, env = "INBOX_SUMMARY_GOOGLE_AUTH_URL", default_value = inbox_summary::auth::google::GOOGLE_AUTH_URL)]
    google_auth_url: String,

    #[arg(long, env = "INBOX_SUMMARY_GOOGLE_TOKEN_URL", default_value = inbox_summary::auth::google::GOOGLE_TOKEN_URL)]
    google_token_url: String,

    #[arg(long, env = "INBOX_SUMMARY_GOOGLE_USERINFO_URL", default_value = inbox_summary::auth::google::GOOGLE_USERINFO_URL)]
    google_userinfo_url: String,

    #[command(flatten)]
    gateway: GatewayArgs,
}

#[derive(Debug, Args)]
struct GatewayArgs {
    #[arg(long, env = "INBOX_SUMMARY_GMAIL_API_BASE", default_value = inbox_summary::connectors::gmail_api::GMAIL_API_BASE)]
    gmail_api_base: String,

    #[arg(long, env = "INBOX_SUMMARY_MAX_RESULTS", default_value_t = inbox_summary::connectors::DEFAULT_MAX_RESULTS)]
    max_results: usize,

    /// Concurrent message detail requests
    #[arg(long, env = "INBOX_SUMMARY_FETCH_CONCURRENCY", default_value_t = inbox_summary::connectors::gmail_api::DEFAULT_FETCH_CONCURRENCY)]
    fetch_concurrency: usize,

    /// Per-request timeout for outbound calls, in seconds
    #[arg(long, env = "INBOX_SUMMARY_REQUEST_TIMEOUT", default_value_t = inbox_summary::config::DEFAULT_REQUEST_TIMEOUT_SECS)]
    request_timeout: u64,
}

#[derive(Debug, Args)]
struct FetchArgs {
    /// Delegated Gmail access token
    #[arg(long, env = "INBOX_SUMMARY_ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,

    #[command(flatten)]
    gateway: GatewayArgs,
}

#[derive(Debug, Args)]
struct SummaryArgs {
    /// today or yesterday
    #[arg(long, default_value = "today")]
    range: DateRange,

    #[command(flatten)]
    fetch: FetchArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inbox_summary=info,tower_http=info".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    commands::dispatch(cli).await
}

mod commands {
    use std::time::Duration;

    use anyhow::{Context, Result};

    use inbox_summary::auth::GoogleEndpoints;
    use inbox_summary::config::Config;
    use inbox_summary::connectors::{GmailApiClient, MailGateway};
    use inbox_summary::output::{self, OutputFormat};
    use inbox_summary::summary;
    use inbox_summary::web;

    use super::{Cli, Commands, FetchArgs, GatewayArgs, ServeArgs, SummaryArgs};

    pub async fn dispatch(cli: Cli) -> Result<()> {
        match cli.command {
            Commands::Serve(args) => handle_serve(args).await,
            Commands::List(args) => handle_list(args, cli.json).await,
            Commands::Summary(args) => handle_summary(args, cli.json).await,
        }
    }

    async fn handle_serve(args: ServeArgs) -> Result<()> {
        let config = Config {
            bind_addr: args.bind,
            public_url: args.public_url,
            google_client_id: args.google_client_id,
            google_client_secret: args.google_client_secret,
            session_key: args.session_key,
            gmail_api_base: args.gateway.gmail_api_base,
            google: GoogleEndpoints {
                auth_url: args.google_auth_url,
                token_url: args.google_token_url,
                userinfo_url: args.google_userinfo_url,
            },
            max_results: args.gateway.max_results,
            fetch_concurrency: args.gateway.fetch_concurrency,
            request_timeout: Duration::from_secs(args.gateway.request_timeout),
        };
        web::serve(config).await
    }

    async fn handle_list(args: FetchArgs, json: bool) -> Result<()> {
        let records = fetch(&args).await?;
        let formatted = output::format_messages(OutputFormat::from_json_flag(json), &records)?;
        println!("{formatted}");
        Ok(())
    }

    async fn handle_summary(args: SummaryArgs, json: bool) -> Result<()> {
        let records = fetch(&args.fetch).await?;
        let summary = summary::summarize_now(&records, args.range);
        let formatted = output::format_summary(OutputFormat::from_json_flag(json), &summary)?;
        println!("{formatted}");
        Ok(())
    }

    async fn fetch(args: &FetchArgs) -> Result<Vec<inbox_summary::models::MessageRecord>> {
        let client = gateway(&args.gateway)?;
        client
            .list_recent_messages(&args.access_token, args.gateway.max_results)
            .await
            .context("fetch recent gmail messages")
    }

    fn gateway(args: &GatewayArgs) -> Result<GmailApiClient> {
        let config = Config {
            gmail_api_base: args.gmail_api_base.clone(),
            max_results: args.max_results,
            fetch_concurrency: args.fetch_concurrency,
            request_timeout: Duration::from_secs(args.request_timeout),
            ..Config::default()
        };
        if config.max_results == 0 || config.max_results > inbox_summary::config::MAX_RESULTS_LIMIT {
            anyhow::bail!(
                "--max-results must be between 1 and {}",
                inbox_summary::config::MAX_RESULTS_LIMIT
            );
        }
        if config.request_timeout.is_zero() {
            anyhow::bail!("--request-timeout must be at least 1 second");
        }
        let http = config.http_client().context("build outbound http client")?;
        Ok(GmailApiClient::new(http, config.gmail_api_base).with_concurrency(config.fetch_concurrency))
    }
}
