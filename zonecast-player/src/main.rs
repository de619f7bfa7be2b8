//! Zonecast Player (zonecast-player) - Main entry point
//!
//! Runs the announcement interleaving controller behind an HTTP control
//! surface. The backend REST API drives zone playback; local music and
//! announcement outputs are headless.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zonecast_common::config::TomlConfig;
use zonecast_player::api::{self, AppContext};
use zonecast_player::config::ControllerSettings;
use zonecast_player::services::{
    BackendClient, Catalog, HttpCatalog, HttpPlaybackApi, SimulatedAnnouncementOutput,
    SimulatedLocalPlayer,
};
use zonecast_player::state::SharedState;
use zonecast_player::{spawn_controller, ControllerDeps};

/// Command-line arguments for zonecast-player
#[derive(Parser, Debug)]
#[command(name = "zonecast-player")]
#[command(about = "Announcement interleaving playback controller for Zonecast")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "ZONECAST_PORT")]
    port: Option<u16>,

    /// Path to TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend API base URL (overrides config file)
    #[arg(long, env = "ZONECAST_REMOTE_URL")]
    remote_url: Option<String>,

    /// Backend API bearer token (overrides config file)
    #[arg(long, env = "ZONECAST_REMOTE_TOKEN", hide_env_values = true)]
    remote_token: Option<String>,

    /// Skip loading the library from the backend at startup
    #[arg(long)]
    no_refresh: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(url) = args.remote_url {
        config.remote.base_url = url;
    }
    if let Some(token) = args.remote_token {
        config.remote.token = Some(token);
    }

    // Initialize tracing
    let default_filter = format!("zonecast_player={},tower_http=info", config.logging.level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Zonecast Player on port {}", config.port);
    info!("Backend API: {}", config.remote.base_url);

    let backend = BackendClient::new(&config.remote).context("Failed to create backend client")?;
    let catalog: Arc<dyn Catalog> = Arc::new(HttpCatalog::new(backend.clone()));
    let state = Arc::new(SharedState::new());

    let settings = ControllerSettings::from(&config.playback);
    let (controller, controller_task) = spawn_controller(
        ControllerDeps {
            remote: Arc::new(HttpPlaybackApi::new(backend)),
            local: Arc::new(SimulatedLocalPlayer::new()),
            announcer: Arc::new(SimulatedAnnouncementOutput::new()),
            shared: state.clone(),
        },
        settings,
    );

    if !args.no_refresh {
        match catalog.snapshot().await {
            Ok(library) => {
                controller
                    .set_library(library)
                    .await
                    .context("Controller stopped during startup")?;
            }
            Err(e) => warn!("Initial library load failed (use /library/refresh later): {}", e),
        }
    }

    let ctx = AppContext {
        state,
        controller: controller.clone(),
        catalog: Some(catalog),
    };

    api::run(config.port, ctx, shutdown_signal())
        .await
        .context("Server error")?;

    // Leave the zone silent on shutdown
    if let Err(e) = controller.stop().await {
        warn!("Stop on shutdown failed: {}", e);
    }
    drop(controller);
    let _ = controller_task.await;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
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
                warn!("Failed to install terminate handler: {}", e);
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
