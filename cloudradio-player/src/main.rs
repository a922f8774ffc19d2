//! Cloudradio player - Main entry point
//!
//! Wires the two message channels (in-process and remote socket) to the
//! playback controller and runs the dispatch loop until shutdown.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cloudradio_common::config::{self, Config};
use cloudradio_player::backend::InstantBackend;
use cloudradio_player::bus::{LocalBus, MessageBus, SocketBus};
use cloudradio_player::mixer::VolumeState;
use cloudradio_player::PlayerController;

/// Command-line arguments for cloudradio-player
#[derive(Parser, Debug)]
#[command(name = "cloudradio-player")]
#[command(about = "Control core of the cloudradio networked media player")]
#[command(version)]
struct Args {
    /// Remote channel endpoint (overrides config file)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Path to config file (default: platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cloudradio_player=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = Config::load(args.config.as_deref())?;
    let endpoint = config::resolve_endpoint(
        args.endpoint.as_deref(),
        "CLOUDRADIO_ENDPOINT",
        &config,
    );

    info!("Starting cloudradio player");
    info!("Remote endpoint: {}", endpoint);

    let local_bus = Arc::new(LocalBus::new());
    let socket_bus = Arc::new(SocketBus::new());

    let (ready_tx, ready_rx) = mpsc::unbounded_channel();
    let backend = Arc::new(InstantBackend::new(ready_tx));

    let mut controller = PlayerController::new(
        backend,
        socket_bus.clone(),
        config.noise_track_ref(),
        VolumeState::mix(config.master_volume, config.noise_fraction),
        ready_rx,
    );
    controller.attach_buses(&[local_bus.as_ref() as &dyn MessageBus, socket_bus.as_ref()]);

    // Playback must survive without the remote channel; commands queued
    // for it are covered by the pre-connect buffer policy.
    if let Err(e) = socket_bus.connect(&endpoint).await {
        warn!("remote channel unavailable: {e}");
    }

    tokio::select! {
        _ = controller.run() => {
            info!("Controller loop ended");
        }
        _ = shutdown_signal() => {}
    }

    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
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
