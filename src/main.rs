//! # Chatfront CLI
//!
//! Loads `config.json` and `session.json`, then serves the chat page and
//! relays each turn to the local inference server until Ctrl-C.
//!
//! Exit status is 0 on normal shutdown and 1 when either settings file is
//! missing or invalid.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use chatfront::inference::{DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
use chatfront::{AppSettings, ChatRelay, LogOptions, PageInfo, ServerState};

/// Browser chat front-end for a local OpenAI-compatible inference server.
#[derive(Parser, Debug)]
#[command(name = "chatfront", version, about, long_about = None)]
struct Cli {
    /// Path to the application configuration file.
    #[arg(long, env = "CHATFRONT_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Path to the session file naming the served model.
    #[arg(long, env = "CHATFRONT_SESSION", default_value = "session.json")]
    session: PathBuf,

    /// Base URL of the OpenAI-compatible API (up to and including `/v1`).
    #[arg(long, env = "CHATFRONT_BACKEND_URL", default_value = DEFAULT_BASE_URL)]
    backend_url: String,

    /// Address the chat page is served on.
    #[arg(long, env = "CHATFRONT_LISTEN", default_value = "127.0.0.1:7860")]
    listen: String,

    /// Longest the backend may stay silent (before the first byte or
    /// between chunks) before the turn fails, in seconds.
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    request_timeout_secs: u64,

    /// Write logs to a file instead of stderr. Without a value, the file is
    /// placed in the platform data directory.
    #[arg(long, num_args = 0..=1, value_name = "PATH")]
    log_file: Option<Option<PathBuf>>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn log_options(&self) -> LogOptions {
        LogOptions {
            file: self
                .log_file
                .clone()
                .map(|path| path.unwrap_or_else(chatfront::default_log_path)),
            json: self.json_logs,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = chatfront::init_tracing(&cli.log_options()) {
        eprintln!("failed to initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    // Settings first: nothing touches the network until both files are valid.
    let settings = match AppSettings::load(&cli.config, &cli.session) {
        Ok(settings) => settings,
        Err(e) => {
            if e.is_missing() {
                tracing::error!(path = %e.path().display(), "settings file not found");
            } else {
                tracing::error!(path = %e.path().display(), error = %e, "settings file is invalid");
            }
            eprintln!("{e}");
            return ExitCode::from(1);
        }
    };

    match run(cli, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "chatfront stopped with an error");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, settings: AppSettings) -> anyhow::Result<()> {
    let relay = ChatRelay::connect(
        &cli.backend_url,
        Duration::from_secs(cli.request_timeout_secs),
        &settings,
    )
    .context("failed to create inference client")?;

    tracing::info!(
        title = %settings.client.title,
        model = %relay.model(),
        backend = %relay.base_url(),
        max_tokens = settings.client.max_tokens,
        examples = settings.client.examples.len(),
        "settings loaded"
    );

    let state = ServerState::new(relay, PageInfo::from_settings(&settings));

    let listener = tokio::net::TcpListener::bind(&cli.listen)
        .await
        .with_context(|| format!("failed to bind to {}", cli.listen))?;
    let local_addr = listener.local_addr().context("failed to read bound address")?;

    tracing::info!(address = %local_addr, "serving chat page on http://{local_addr}");

    chatfront::server::serve(listener, state, shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C; serving until killed");
        std::future::pending::<()>().await;
    }
}
