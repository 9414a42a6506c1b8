use std::sync::Arc;

use tracing::{info, warn};

use vidfetch::api::server::{ApiServer, ApiServerConfig, AppState};
use vidfetch::engine::{ExtractionEngine, YtDlpConfig, YtDlpEngine};
use vidfetch::jobs::JobCoordinator;
use vidfetch::logging;
use vidfetch::storage::{StorageArea, StorageConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());
    let (logging_config, _guard) = logging::init_logging(&log_dir)?;

    // Prepare the storage area
    let storage = Arc::new(StorageArea::new(StorageConfig::from_env_or_default()));
    storage.ensure_ready()?;
    info!("Storage ready at {}", storage.root_dir().display());

    // Probe the extraction engine
    let engine = YtDlpEngine::with_config(YtDlpConfig::from_env_or_default());
    match engine.version() {
        Some(version) => info!("yt-dlp {} detected", version),
        None => warn!("yt-dlp not found; analysis and downloads will fail"),
    }
    if engine.ffmpeg_version().is_none() {
        warn!("ffmpeg not found; audio extraction may fail");
    }

    let coordinator = Arc::new(JobCoordinator::new(Arc::new(engine), storage.clone()));

    // Build the API server
    let state = AppState::new()
        .with_coordinator(coordinator)
        .with_storage(storage.clone());
    let server = ApiServer::with_state(ApiServerConfig::from_env_or_default(), state);

    // Background tasks share the server's cancellation token
    let cancel_token = server.cancel_token();
    storage.start_background_sweep(cancel_token.clone());
    logging_config.start_retention_cleanup(cancel_token.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
            cancel_token.cancel();
        }
    });

    server.run().await?;

    Ok(())
}
