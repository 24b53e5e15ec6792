//! `argus-cli` – controller entry point.
//!
//! Boots the whole bridge stack:
//!
//! 1. Initialises structured logging from `RUST_LOG`
//!    (`ARGUS_LOG_FORMAT=json` for newline-delimited JSON output).
//! 2. Loads `~/.argus/config.toml` with `ARGUS_*` env overrides.
//! 3. Installs the termination handler (SIGINT/SIGTERM) that cancels the
//!    shared shutdown token; a second signal is a no-op.
//! 4. Opens the serial device and binds the listener — both fatal on
//!    failure, exiting 1 with a diagnostic.
//! 5. Spawns the marker-detector thread, runs the bridge server to
//!    completion, then joins the detector so the camera device is confirmed
//!    released before exiting 0.

mod config;

use argus_bridge::{BridgeServer, SessionSettings};
use argus_hal::UartLink;
use argus_hal::sim::{ScriptedDetector, SimCamera};
use argus_middleware::{HandoffSlot, Shutdown};
use argus_types::ArgusError;
use argus_vision::DetectorWorker;
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    init_logging();

    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            info!(path = %config::config_path().display(), "config loaded");
            cfg
        }
        Ok(None) => config::Config::default(),
        Err(e) => {
            warn!(error = %e, "config unreadable; using defaults");
            config::Config::default()
        }
    };

    let shutdown = Shutdown::new();
    let shutdown_signal = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        // Idempotent: a second signal while shutdown is in progress is a
        // no-op on the token.
        info!("termination signal received; shutting down");
        shutdown_signal.cancel();
    }) {
        warn!(error = %e, "failed to install termination handler; graceful shutdown on signal will not be available");
    }

    println!(
        "Starting WebSocket server at ws://{}:{}",
        cfg.bind_address, cfg.port
    );

    if let Err(e) = run(cfg, shutdown).await {
        eprintln!("argus: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: config::Config, shutdown: Shutdown) -> Result<(), ArgusError> {
    let frames = HandoffSlot::new();
    let ids = HandoffSlot::new();

    // Device startup failures are fatal before any execution context exists.
    let serial = UartLink::open(&cfg.serial_path, cfg.serial_baud)?;
    let server = BridgeServer::bind(
        &cfg.bind_address,
        cfg.port,
        Box::new(serial),
        ids.clone(),
        frames.clone(),
        shutdown.clone(),
        SessionSettings {
            command_poll: Duration::from_millis(cfg.command_poll_ms),
            send_frames: cfg.send_frames,
            frame_interval: Duration::from_millis(cfg.frame_interval_ms),
            jpeg_quality: cfg.jpeg_quality,
        },
    )
    .await?;

    // The platform camera driver and detection backend are external
    // collaborators; the in-tree stack runs on the simulated drivers.
    info!("simulated vision stack active");
    let detector = DetectorWorker::new(
        Box::new(SimCamera::new(
            "front_rgb",
            cfg.camera_width,
            cfg.camera_height,
        )),
        Box::new(ScriptedDetector::silent()),
        frames,
        ids,
        shutdown.clone(),
    )
    .spawn()?;

    server.run().await;

    // The camera must be confirmed released before the process may exit.
    detector.join();
    info!("shutdown complete");
    Ok(())
}

fn init_logging() {
    // Initialise tracing-subscriber using RUST_LOG (defaults to "info").
    // Set ARGUS_LOG_FORMAT=json to emit newline-delimited JSON logs suitable
    // for log aggregators.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("ARGUS_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init();
    }
}
