//! certkeep daemon
//!
//! Keeps each user's personal X.509 certificates, enforces who may see whose,
//! and pushes expiry reminders over the Telegram Bot API.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use certkeep_core::db::unix_timestamp;
use certkeep_core::time::parse_hhmm;
use certkeep_daemon::ingest::{self, ExtractedFile, FileOutcome};
use certkeep_daemon::notify::{TelegramClient, run_sweep, spawn_daily_sweep};
use certkeep_daemon::storage::Database;

#[derive(Parser, Debug)]
#[command(name = "certkeep-daemon")]
#[command(version, about = "certkeep daemon - certificate store and expiry reminders")]
struct Cli {
    /// Database file path
    #[arg(long, env = "CERTKEEP_DB_PATH", global = true)]
    db_path: Option<PathBuf>,

    /// Log level filter (e.g. "info", "debug", "warn").
    #[arg(long, default_value = "info", env = "CERTKEEP_LOG_LEVEL", global = true)]
    log_level: String,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, env = "CERTKEEP_LOG_JSON", global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the daemon with its daily expiry sweep until shutdown
    Serve {
        /// Telegram bot token used for reminder delivery
        #[arg(long, env = "CERTKEEP_BOT_TOKEN")]
        bot_token: String,

        /// Local time of day for the daily sweep (HH:MM)
        #[arg(long, env = "CERTKEEP_NOTIFY_AT", default_value = "09:00")]
        notify_at: String,
    },
    /// Run one expiry sweep immediately and exit
    Sweep {
        /// Telegram bot token used for reminder delivery
        #[arg(long, env = "CERTKEEP_BOT_TOKEN")]
        bot_token: String,
    },
    /// Delete certificates whose expiry is already in the past
    Cleanup,
    /// Ingest certificate files from disk on behalf of one owner
    Import {
        /// Owner the certificates belong to
        #[arg(long)]
        owner: i64,

        /// Certificate files to ingest
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        format!(
            "certkeep_core={level},certkeep_x509={level},certkeep_daemon={level}",
            level = cli.log_level
        )
    });
    let env_filter = tracing_subscriber::EnvFilter::new(log_filter);
    if cli.log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting certkeep-daemon"
    );

    let db = match &cli.db_path {
        Some(path) => {
            info!(path = %path.display(), "Opening database");
            Database::open(path).await?
        }
        None => {
            let default_path = default_db_path()?;
            info!(path = %default_path.display(), "Opening database (default path)");
            Database::open(&default_path).await?
        }
    };

    match cli.command {
        Command::Serve {
            bot_token,
            notify_at,
        } => serve(db, &bot_token, &notify_at).await,
        Command::Sweep { bot_token } => {
            let sender = TelegramClient::new(&bot_token)?;
            let report = run_sweep(&db, &sender, chrono::Utc::now()).await?;
            info!(
                sent = report.sent,
                failed = report.failed,
                "Manual sweep finished"
            );
            Ok(())
        }
        Command::Cleanup => {
            let removed = db.delete_expired(unix_timestamp()).await?;
            info!(removed, "Expired certificates deleted");
            Ok(())
        }
        Command::Import { owner, paths } => import(&db, owner, &paths).await,
    }
}

/// Run the daily sweep until Ctrl+C or SIGTERM.
async fn serve(db: Database, bot_token: &str, notify_at: &str) -> Result<()> {
    let notify_at = parse_hhmm(notify_at)?;
    let sender = Arc::new(TelegramClient::new(bot_token)?);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let sweep_handle = spawn_daily_sweep(db, sender, notify_at, shutdown_rx);

    #[cfg(unix)]
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    #[cfg(unix)]
    let sigterm_future = sigterm.recv();
    #[cfg(not(unix))]
    let sigterm_future = std::future::pending::<Option<()>>();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C shutdown signal");
        }
        _ = sigterm_future => {
            info!("Received SIGTERM shutdown signal");
        }
    }

    let _ = shutdown_tx.send(true);
    let _ = sweep_handle.await;

    info!("Daemon stopped");
    Ok(())
}

/// Read each file and push it through the ingest pipeline.
async fn import(db: &Database, owner: i64, paths: &[PathBuf]) -> Result<()> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = std::fs::read(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        files.push(ExtractedFile {
            filename: display_name(path),
            bytes,
        });
    }

    let report = ingest::ingest_files(db, owner, &files).await;
    for file in &report.files {
        match &file.outcome {
            FileOutcome::Added => info!(filename = %file.filename, "Certificate added"),
            FileOutcome::Skipped => info!(filename = %file.filename, "Already stored, skipped"),
            // Failures are already logged by the ingest pipeline.
            FileOutcome::Failed(_) => {}
        }
    }
    info!(
        added = report.added,
        skipped = report.skipped,
        failed = report.failed,
        "Import finished"
    );
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

/// Default database path: ~/.certkeep/certkeep.db
fn default_db_path() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".certkeep").join("certkeep.db"))
}
