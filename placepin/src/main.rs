//! placepin - Main entry point
//!
//! Interactive place search on the terminal. Each stdin line replaces the
//! query text; `:show` resolves the current suggestions to map markers and
//! `:quit` exits.
//!
//! Stdin is read on a plain OS thread rather than through `tokio::io::stdin`:
//! tokio's blocking read cannot be cancelled, and the runtime would wait on it
//! at shutdown until the user pressed Enter.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use placepin::presenter::{run_presenter, ConsolePresenter};
use placepin::services::{GoogleGeocodeClient, GooglePlacesClient};
use placepin::{Pipeline, PipelineHandle, PipelineSettings};
use placepin_common::config::{self, TomlConfig, API_KEY_ENV_VAR};
use placepin_common::events::EventBus;

/// Command-line arguments for placepin
#[derive(Parser, Debug)]
#[command(name = "placepin")]
#[command(about = "Debounced place search with map marker resolution")]
#[command(version)]
struct Args {
    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the debounce interval in milliseconds
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Query searched on startup
    #[arg(long, default_value = "London")]
    initial_query: String,

    /// Write a default config file to this path and exit
    #[arg(long, value_name = "PATH")]
    write_default_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.write_default_config {
        config::write_toml_config(&TomlConfig::default(), path)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let mut toml_config =
        config::load_config(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(ms) = args.debounce_ms {
        toml_config.debounce_ms = ms;
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    let level = &toml_config.logging.level;
                    format!("placepin={0},placepin_common={0}", level).into()
                }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let api_key = config::resolve_api_key(&toml_config)
        .ok_or_else(|| anyhow!("No API key: set {} or api_key in the config file", API_KEY_ENV_VAR))?;

    let places = GooglePlacesClient::new(api_key.clone(), toml_config.http_timeout())
        .context("Failed to build places client")?;
    let geocoder = GoogleGeocodeClient::new(
        api_key,
        toml_config.http_timeout(),
        toml_config.geocode_min_interval(),
    )
    .context("Failed to build geocode client")?;

    let events = EventBus::new(toml_config.event_capacity);
    let presenter = tokio::spawn(run_presenter(events.subscribe(), ConsolePresenter::stdout()));

    let settings = PipelineSettings::from(&toml_config);
    info!(
        debounce_ms = toml_config.debounce_ms,
        category = %settings.search.category_filter,
        "Starting placepin"
    );
    let pipeline = Pipeline::spawn(settings, Arc::new(places), Arc::new(geocoder), events);

    if !args.initial_query.is_empty() {
        pipeline.on_query_text(args.initial_query.clone()).await?;
    }

    let mut lines = spawn_line_reader(std::io::BufReader::new(std::io::stdin()));
    tokio::select! {
        result = read_commands(&pipeline, &mut lines) => result?,
        _ = shutdown_signal() => {}
    }

    pipeline.shutdown();
    drop(pipeline);
    if let Err(e) = presenter.await {
        warn!(error = %e, "Presenter task failed");
    }

    info!("Shutdown complete");
    Ok(())
}

/// One line of console input
#[derive(Debug, PartialEq, Eq)]
enum ConsoleCommand {
    Quit,
    Show,
    Query(String),
}

impl ConsoleCommand {
    fn parse(line: String) -> Self {
        match line.trim() {
            ":quit" | ":q" => ConsoleCommand::Quit,
            ":show" => ConsoleCommand::Show,
            _ => ConsoleCommand::Query(line),
        }
    }
}

/// Read lines on a detached thread and forward them over a channel
///
/// The thread ends at end of input, on a read error, or once the receiver
/// is dropped and the next line arrives. It is never joined, so a read that
/// is still blocked does not hold up process exit.
fn spawn_line_reader<R>(reader: R) -> mpsc::Receiver<std::io::Result<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in reader.lines() {
            let failed = line.is_err();
            if tx.blocking_send(line).is_err() || failed {
                break;
            }
        }
    });
    rx
}

/// Feed input lines to the pipeline until `:quit` or end of input
async fn read_commands(
    pipeline: &PipelineHandle,
    lines: &mut mpsc::Receiver<std::io::Result<String>>,
) -> Result<()> {
    while let Some(line) = lines.recv().await {
        let line = line.context("Failed to read stdin")?;
        match ConsoleCommand::parse(line) {
            ConsoleCommand::Quit => break,
            ConsoleCommand::Show => pipeline.trigger_aggregation().await?,
            ConsoleCommand::Query(text) => pipeline.on_query_text(text).await?,
        }
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
