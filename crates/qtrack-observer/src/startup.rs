//! Observer server startup helper for embedding in the `qtrack` binary.
//!
//! [`spawn_observer`] binds eagerly, then serves on a background Tokio
//! task so the API runs alongside the live-sync loop.

use std::net::SocketAddr;
use std::sync::Arc;

use qtrack_core::config::ObserverConfig;
use qtrack_core::{PushSource, StatusProvider};
use tokio::task::JoinHandle;

use crate::server::{self, ServeError};
use crate::state::AppState;

/// A running Observer server.
#[derive(Debug)]
pub struct ObserverHandle {
    /// The address actually bound (resolves port `0`).
    pub addr: SocketAddr,
    /// The serving task. Abort it to shut the server down.
    pub task: JoinHandle<()>,
}

/// Spawn the Observer HTTP server on a background Tokio task.
///
/// # Errors
///
/// Returns [`ServeError::Bind`] if the address cannot be bound. This is
/// detected before the background task is spawned.
pub async fn spawn_observer<P: StatusProvider, S: PushSource>(
    config: &ObserverConfig,
    state: Arc<AppState<P, S>>,
) -> Result<ObserverHandle, ServeError> {
    let listener = server::bind(config).await?;
    let addr = listener
        .local_addr()
        .map_err(|e| ServeError::Bind(format!("no local address: {e}")))?;

    let task = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, state).await {
            tracing::error!(error = %e, "Observer server exited with error");
        }
    });

    tracing::info!(%addr, "Observer server spawned on background task");

    Ok(ObserverHandle { addr, task })
}
