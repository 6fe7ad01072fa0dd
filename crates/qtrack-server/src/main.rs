//! `qtrack` binary: live fleet telemetry behind the Observer API.
//!
//! Wires the HTTP status provider and the configured push transport into
//! the live-sync controller, then serves the Observer API until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `$QTRACK_CONFIG` or `qtrack-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the status provider and push transport
//! 4. Start live sync
//! 5. Spawn the Observer server
//! 6. Wait for `Ctrl-C`, then stop sync and the server

mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use qtrack_client::{HttpStatusProvider, PushTransport};
use qtrack_core::QtrackConfig;
use qtrack_core::config::{LogFormat, LoggingConfig};
use qtrack_observer::spawn_observer;
use qtrack_observer::state::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::ServerError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "qtrack-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, client construction or the
/// Observer bind fails.
#[tokio::main]
async fn main() -> Result<(), ServerError> {
    // 1. Load configuration. Logging is not up yet, so remember where it came from.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(
        source = %source.display(),
        provider = %config.provider.base_url,
        push = ?config.push.transport,
        poll_interval_ms = config.sync.poll_interval_ms,
        "qtrack starting"
    );

    // 3. Collaborators.
    let provider = HttpStatusProvider::new(&config.provider)?;
    let push = PushTransport::from_config(
        provider.base_url(),
        &config.push,
        Duration::from_millis(config.provider.request_timeout_ms),
    )?;
    info!(transport = push.name(), "Push transport configured");

    let state = Arc::new(AppState::new(Arc::new(provider), Arc::new(push), &config));

    // 4. Live sync.
    state.sync.start().await;

    // 5. Observer API.
    let observer = spawn_observer(&config.observer, Arc::clone(&state)).await?;
    info!(addr = %observer.addr, "Observer API ready");

    // 6. Shutdown.
    let signal = tokio::signal::ctrl_c().await;
    info!("Shutdown requested");
    state.sync.stop().await;
    observer.task.abort();

    signal.map_err(|e| ServerError::Signal {
        message: e.to_string(),
    })?;

    info!("qtrack shutdown complete");
    Ok(())
}

/// Load configuration from `$QTRACK_CONFIG`, else `qtrack-config.yaml`.
///
/// A missing default file falls back to built-in defaults (still subject
/// to environment overrides). A missing file named by `$QTRACK_CONFIG` is
/// an error.
fn load_config() -> Result<(QtrackConfig, PathBuf), ServerError> {
    if let Ok(explicit) = std::env::var("QTRACK_CONFIG") {
        let path = PathBuf::from(explicit);
        let config = QtrackConfig::from_file(&path)?;
        return Ok((config, path));
    }

    let path = Path::new(DEFAULT_CONFIG_PATH);
    if path.exists() {
        Ok((QtrackConfig::from_file(path)?, path.to_path_buf()))
    } else {
        Ok((QtrackConfig::parse("")?, PathBuf::from("<defaults>")))
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
}
