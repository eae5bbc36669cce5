//! ideanest background daemon.
//!
//! Opens the idea store, applies migrations and runs the enrichment worker
//! and the reminder watcher until interrupted.

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ideanest_core::{defaults, KeywordVocabulary};
use ideanest_db::{log_pool_metrics, Database, PoolConfig};
use ideanest_jobs::{
    AnalyzeIdeaHandler, ReminderConfig, ReminderWatcher, WorkerBuilder, WorkerConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: info for the ideanest crates)
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "ideanest_daemon=info,ideanest_jobs=info,ideanest_db=info,ideanest_core=info".into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("ideanest.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false)); // no ANSI in files by default
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Console-only output
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    // Get configuration from environment
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| defaults::DATABASE_URL.to_string());
    let worker_config = WorkerConfig::from_env();
    let reminder_config = ReminderConfig::from_env();
    let vocabulary = KeywordVocabulary::from_env();

    info!(
        subsystem = "daemon",
        keywords = vocabulary.len(),
        enrichment_enabled = worker_config.enabled,
        "Configuration loaded"
    );

    // Connect to database
    info!("Connecting to database...");
    let db = Database::connect_with_config(&database_url, PoolConfig::from_env()).await?;
    info!("Database connected");

    // Run pending database migrations on startup
    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");
    log_pool_metrics(db.pool());

    // Background enrichment
    let stop_grace = worker_config.shutdown_grace();
    let worker_handle = if worker_config.enabled {
        let worker = WorkerBuilder::new(db.clone())
            .with_config(worker_config)
            .with_handler(AnalyzeIdeaHandler::with_vocabulary(db.clone(), vocabulary))
            .build()
            .await;
        Some(worker.start())
    } else {
        warn!("Enrichment disabled via ENRICHMENT_ENABLED, task queue will not be drained");
        None
    };

    let reminder_handle = ReminderWatcher::new(db.clone(), reminder_config).start();

    info!("ideanest daemon running, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    if let Some(handle) = worker_handle {
        // Let an in-flight tick finish before the pool goes away.
        if !handle.shutdown_and_wait(stop_grace).await? {
            warn!("Task worker did not stop in time");
        }
    }
    reminder_handle.shutdown().await?;

    db.pool().close().await;
    info!("ideanest daemon stopped");
    Ok(())
}
