mod error;
mod logging;
mod server;
mod socket;

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use tally_kernel::config::ServeConfig;
use tally_kernel::log::{AppendLog, Record};
use tally_kernel::replay::replay_from;

use crate::server::{build_router, AppState};

/// Tally record log
#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(about = "Append-only record log with live notify and stream feeds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the append, notify and stream endpoints
    Serve {
        /// Path to service config JSON
        #[arg(long)]
        config: Option<String>,

        /// Listen address, overrides the config file
        #[arg(long)]
        listen: Option<String>,

        /// JSON array of integers to preload into the log
        #[arg(long)]
        seed: Option<String>,
    },

    /// Print the records of a JSON log file from a cursor onward
    Replay {
        /// JSON array of integers
        #[arg(long)]
        log: String,

        #[arg(long, default_value_t = 0)]
        cursor: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            listen,
            seed,
        } => {
            let mut config = match config {
                Some(path) => ServeConfig::load(path)?,
                None => ServeConfig::default(),
            };
            if let Some(listen) = listen {
                config.listen = listen;
            }
            logging::init(&config)?;
            serve(config, seed).await
        }
        Command::Replay { log, cursor } => {
            logging::init(&ServeConfig::default())?;
            replay(&log, cursor)
        }
    }
}

fn load_records(path: &str) -> Result<Vec<Record>> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let records = serde_json::from_str(&data).with_context(|| format!("parsing {path}"))?;
    Ok(records)
}

async fn serve(config: ServeConfig, seed: Option<String>) -> Result<()> {
    // ----------------------------
    // Build the log
    // ----------------------------
    let log = match seed {
        Some(path) => AppendLog::from_records(load_records(&path)?),
        None => AppendLog::new(),
    };
    let log = Arc::new(log);

    // ----------------------------
    // Serve until Ctrl-C
    // ----------------------------
    let shutdown = CancellationToken::new();
    let state = AppState::new(log.clone(), config.channels.clone(), shutdown.clone());

    let listener = TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("binding {}", config.listen))?;
    tracing::info!(
        listen = %listener.local_addr()?,
        records = log.len(),
        poll_interval_ms = config.channels.poll_interval_ms,
        wake_on_append = config.channels.wake_on_append,
        "tally serving"
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    tracing::info!(records = log.len(), "tally stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "cannot listen for ctrl-c");
    }
    // Reader loops observe this at their next wait.
    shutdown.cancel();
}

fn replay(path: &str, cursor: u64) -> Result<()> {
    let log = AppendLog::from_records(load_records(path)?);

    for item in replay_from(&log, cursor) {
        println!("{}", serde_json::to_string(&item)?);
    }

    Ok(())
}
