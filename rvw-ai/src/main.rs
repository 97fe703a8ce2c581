//! rvw-ai - Review Enrichment Service
//!
//! Accepts product reviews over HTTP, enriches them with a sentiment label
//! and key points from external AI services, and stores the result.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rvw_ai::config::{load_env_file, AiConfig};
use rvw_ai::{build_router, AppState};
use rvw_common::config::{load_toml_config, locate_config_file, TomlConfig};

const CONFIG_ENV: &str = "RVW_CONFIG";
const CONFIG_FILE_NAME: &str = "rvw-ai.toml";

/// Command-line arguments for rvw-ai
#[derive(Parser, Debug)]
#[command(name = "rvw-ai")]
#[command(about = "Review enrichment service")]
#[command(version)]
struct Args {
    /// Bootstrap TOML file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "RVW_PORT")]
    port: Option<u16>,

    /// SQLite database file
    #[arg(short, long, env = "RVW_DATABASE")]
    database: Option<PathBuf>,

    /// Create the schema, insert the system check review, and exit
    #[arg(long)]
    init_db: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before clap, so RVW_PORT / RVW_DATABASE may come from .env too
    let env_file = load_env_file(None);
    let args = Args::parse();

    // Read config before tracing so the configured level applies; report after
    let config_path = locate_config_file(args.config.as_deref(), CONFIG_ENV, CONFIG_FILE_NAME);
    let loaded = match config_path.as_deref() {
        Some(path) if path.exists() => Some(load_toml_config(path)),
        _ => None,
    };
    let log_level = match &loaded {
        Some(Ok(toml)) => toml.logging.level.clone(),
        _ => "info".to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .init();

    info!(
        "Starting rvw-ai (Review Enrichment) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("RVW_GIT_HASH"),
        env!("RVW_BUILD_TIMESTAMP"),
        env!("RVW_BUILD_PROFILE")
    );

    let toml = match (loaded, config_path) {
        (Some(result), Some(path)) => {
            let toml = result.context("Failed to load configuration")?;
            info!("Config file: {}", path.display());
            toml
        }
        (_, Some(path)) => {
            warn!("Config file not found: {} (using defaults)", path.display());
            TomlConfig::default()
        }
        (_, None) => {
            warn!("No config file found (using defaults)");
            TomlConfig::default()
        }
    };

    let config = AiConfig::resolve(&toml, args.port, args.database);
    config.log_system_check(env_file.as_deref());

    info!("Database: {}", config.database_path.display());
    let pool = rvw_common::db::init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    if args.init_db {
        rvw_ai::db::seed_system_check(&pool)
            .await
            .context("Failed to seed database")?;
        info!("Database initialized");
        return Ok(());
    }

    let state = AppState::from_config(pool, &config).context("Failed to build application state")?;
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
