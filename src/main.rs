//! news-feedback - reader feedback service for the news portal
//!
//! # Usage
//!
//! ```bash
//! # Serve the feedback API on the configured address
//! news-feedback
//!
//! # Ephemeral store, custom address
//! news-feedback --in-memory --addr 127.0.0.1:9000
//!
//! # Print aggregate statistics for the configured store and exit
//! news-feedback stats
//! ```
//!
//! # Environment Variables
//!
//! - `NEWS_FEEDBACK_CONFIG`: Path to the TOML config file
//! - `RUST_LOG`: Logging level (default: info)
//! - `RESET_DB`: Set to "true" to wipe the feedback database on startup (for testing)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use news_feedback::api::{create_app, AppState};
use news_feedback::config::{LogFormat, PortalConfig, StorageBackend};
use news_feedback::stats::compute_stats;
use news_feedback::storage::{FeedbackStore, InMemoryFeedbackStore, SledFeedbackStore};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "news-feedback")]
#[command(about = "Reader feedback service for the news portal")]
#[command(version)]
struct CliArgs {
    /// Override the server address (default from config: "0.0.0.0:8080")
    #[arg(short, long)]
    addr: Option<String>,

    /// Path to a TOML config file (overrides NEWS_FEEDBACK_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keep feedback in memory only; nothing survives a restart
    #[arg(long)]
    in_memory: bool,

    /// Wipe the feedback database on startup.
    /// WARNING: This is destructive and cannot be undone!
    /// Can also be set via RESET_DB=true environment variable.
    #[arg(long)]
    reset_db: bool,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Run the HTTP API (default)
    Serve,
    /// Print feedback statistics as JSON and exit
    Stats,
}

// ============================================================================
// Startup helpers
// ============================================================================

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_tracing(format: LogFormat) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Explicit `--config` must load cleanly; otherwise use the search order.
fn load_config(args: &CliArgs) -> Result<PortalConfig> {
    let mut config = match &args.config {
        Some(path) => PortalConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => PortalConfig::load(),
    };

    if let Some(addr) = &args.addr {
        config.server.addr = addr.clone();
    }
    if args.in_memory {
        config.storage.backend = StorageBackend::Memory;
    }
    Ok(config)
}

/// Check if database reset is requested via CLI flag or environment variable.
fn should_reset_db(cli_flag: bool) -> bool {
    if cli_flag {
        return true;
    }
    if let Ok(val) = std::env::var("RESET_DB") {
        let val_lower = val.to_lowercase();
        return val_lower == "true" || val_lower == "1" || val_lower == "yes";
    }
    false
}

/// Remove the sled database directory.
fn reset_database(path: &Path) -> Result<()> {
    if !path.exists() {
        info!(path = %path.display(), "Database does not exist, nothing to reset");
        return Ok(());
    }

    warn!(path = %path.display(), "RESET_DB detected - wiping feedback database");
    std::fs::remove_dir_all(path)
        .with_context(|| format!("Failed to remove {}", path.display()))?;
    info!("Database removed; a fresh one will be created on startup");
    Ok(())
}

fn open_store(config: &PortalConfig) -> Result<Arc<dyn FeedbackStore>> {
    let store: Arc<dyn FeedbackStore> = match config.storage.backend {
        StorageBackend::Memory => Arc::new(InMemoryFeedbackStore::new()),
        StorageBackend::Sled => {
            if let Some(parent) = config.storage.path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let store = SledFeedbackStore::open(&config.storage.path, &config.storage.namespace)
                .context("Failed to open feedback database")?;
            info!(
                path = %config.storage.path.display(),
                records = store.count(),
                size_bytes = store.size_bytes(),
                "Feedback database opened"
            );
            Arc::new(store)
        }
    };
    Ok(store)
}

// ============================================================================
// Commands
// ============================================================================

async fn run_stats(store: Arc<dyn FeedbackStore>) -> Result<()> {
    let records = store.list_all().await.context("Failed to read feedback")?;
    let stats = compute_stats(&records);
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

async fn run_server(config: PortalConfig, store: Arc<dyn FeedbackStore>) -> Result<()> {
    let state = AppState::new(store, config.feedback);
    let app = create_app(state, &config.server.cors_origins);

    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.addr))?;
    info!(addr = %config.server.addr, "HTTP API listening");

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
            info!("[HttpServer] Received shutdown signal");
        })
        .await;

    match result {
        Ok(()) => {
            info!("[HttpServer] Graceful shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("[HttpServer] Server error: {}", e);
            Err(anyhow::anyhow!("HTTP server error: {}", e))
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Config warnings are emitted before the configured subscriber exists.
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .finish();
    let config = tracing::subscriber::with_default(bootstrap, || load_config(&args))?;
    init_tracing(config.logging.format);

    info!(
        backend = ?config.storage.backend,
        namespace = %config.storage.namespace,
        default_rating = config.feedback.default_rating,
        "news-feedback {}",
        env!("CARGO_PKG_VERSION")
    );

    // Reset check runs before any storage is opened
    if config.storage.backend == StorageBackend::Sled && should_reset_db(args.reset_db) {
        reset_database(&config.storage.path)?;
    }

    let store = open_store(&config)?;

    match args.command.unwrap_or(SubCommand::Serve) {
        SubCommand::Stats => run_stats(store).await?,
        SubCommand::Serve => run_server(config, store).await?,
    }

    info!("news-feedback shutdown complete");
    Ok(())
}
