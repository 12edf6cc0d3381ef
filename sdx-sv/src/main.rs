//! sdx-sv - Scene Service
//!
//! **Module Identity:**
//! - Name: sdx-sv (Scene Service)
//! - Port: 5730 (default)
//!
//! Converts uploaded glTF assets into scene documents and reads/writes node
//! transforms on shared scene documents over HTTP REST + SSE.

use anyhow::{Context, Result};
use clap::Parser;
use sdx_common::config::{RootFolderInitializer, RootFolderResolver, TomlConfig};
use sdx_common::document::RoutingStore;
use sdx_common::events::EventBus;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sdx_sv::services::{GltfConverter, SceneService, TaskManager};
use sdx_sv::{AppState, DEFAULT_BIND_ADDRESS, MODULE_NAME};

const DEFAULT_EVENT_CAPACITY: usize = 100;

/// Scene service command line
#[derive(Debug, Parser)]
#[command(name = "sdx-sv", version, about = "Scene conversion and attribute service")]
struct Cli {
    /// Root folder holding uploaded assets and converted scenes
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// TOML config file (defaults to $SDX_CONFIG, then the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// HTTP listen address
    #[arg(long)]
    bind: Option<String>,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config is read before tracing starts so its log level can apply;
    // a malformed file is fatal.
    let config = TomlConfig::discover(cli.config.as_deref(), MODULE_NAME)
        .context("Failed to load configuration")?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting sdx-sv (Scene Service)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Step 1: Resolve root folder
    let root_folder = RootFolderResolver::new(cli.root_folder.clone(), &config).resolve();

    // Step 2: Create upload and scene directories if missing
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directories_exist()
        .context("Failed to initialize root folder")?;
    info!("Uploads: {}", initializer.upload_dir().display());
    info!("Scenes: {}", initializer.scenes_dir().display());

    // Step 3: Services
    let event_bus = EventBus::new(config.event_capacity.unwrap_or(DEFAULT_EVENT_CAPACITY));
    let tasks = Arc::new(
        TaskManager::new(Arc::new(GltfConverter::new()), event_bus)
            .with_retention(Duration::from_secs(config.conversion.task_retention_secs)),
    );

    let shutdown = CancellationToken::new();
    let reaper = tasks.spawn_reaper(
        Duration::from_secs(config.conversion.reap_interval_secs.max(1)),
        shutdown.clone(),
    );

    let service = Arc::new(SceneService::new(
        Arc::new(RoutingStore::default()),
        tasks,
        initializer.upload_dir(),
        initializer.scenes_dir(),
    ));
    let app = sdx_sv::build_router(AppState::new(service));

    // Step 4: Serve
    let bind = cli
        .bind
        .or(config.bind_address)
        .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("Listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await?;

    shutdown.cancel();
    let _ = reaper.await;
    Ok(())
}
