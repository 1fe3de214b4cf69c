#![forbid(unsafe_code)]

//! `pdb-relay` — MCP debugger session server binary.
//!
//! Bootstraps configuration, starts the stdio MCP transport, and tears
//! every debug session down on shutdown so no debugger child outlives
//! the server.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use pdb_relay::config::GlobalConfig;
use pdb_relay::mcp::handler::AppState;
use pdb_relay::mcp::transport;
use pdb_relay::session::{SessionRegistry, SessionSettings};
use pdb_relay::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "pdb-relay", about = "MCP debugger session server", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("pdb-relay server bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let config = match args.config {
        Some(path) => GlobalConfig::load_from_path(path)?,
        None => GlobalConfig::default(),
    };
    let config = Arc::new(config);
    info!("configuration loaded");

    // ── Build shared application state ──────────────────
    let sessions = Arc::new(SessionRegistry::new(SessionSettings::from_config(&config)));
    let state = Arc::new(AppState {
        config: Arc::clone(&config),
        sessions: Arc::clone(&sessions),
    });

    // ── Start transport ─────────────────────────────────
    let ct = CancellationToken::new();
    let stdio_ct = ct.clone();
    let stdio_state = Arc::clone(&state);
    let mut stdio_handle = tokio::spawn(async move {
        if let Err(err) = transport::serve_stdio(stdio_state, stdio_ct).await {
            error!(%err, "stdio transport failed");
        }
    });

    info!("MCP server ready");

    // ── Wait for shutdown signal or peer disconnect ─────
    let transport_running = tokio::select! {
        () = shutdown_signal() => {
            info!("shutdown signal received");
            true
        }
        _ = &mut stdio_handle => {
            info!("stdio transport closed by peer");
            false
        }
    };
    ct.cancel();

    // ── Tear down every debug session ───────────────────
    // Invoked regardless of session state; an idle registry is a no-op.
    sessions.cleanup_all().await;

    if transport_running {
        let _ = stdio_handle.await;
    }
    info!("pdb-relay shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries the MCP protocol; logs must stay on stderr.
    let subscriber = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
