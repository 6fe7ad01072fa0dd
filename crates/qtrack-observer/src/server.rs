//! Observer HTTP server lifecycle management.
//!
//! [`bind`] resolves and binds the listener so address problems surface
//! before anything is spawned; [`serve`] runs the router on it until the
//! task is aborted.

use std::net::SocketAddr;
use std::sync::Arc;

use qtrack_core::config::ObserverConfig;
use qtrack_core::{PushSource, StatusProvider};
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Errors that can occur when starting or running the Observer server.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}

/// Bind a listener on the configured host and port.
///
/// # Errors
///
/// Returns [`ServeError::Bind`] if the address does not parse or the
/// port cannot be bound.
pub async fn bind(config: &ObserverConfig) -> Result<TcpListener, ServeError> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| ServeError::Bind(format!("invalid address: {e}")))?;

    TcpListener::bind(addr)
        .await
        .map_err(|e| ServeError::Bind(format!("bind failed on {addr}: {e}")))
}

/// Serve the Observer router on an already-bound listener.
///
/// # Errors
///
/// Returns [`ServeError::Serve`] if the server hits a fatal I/O error.
pub async fn serve<P: StatusProvider, S: PushSource>(
    listener: TcpListener,
    state: Arc<AppState<P, S>>,
) -> Result<(), ServeError> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Observer server listening");
    }

    axum::serve(listener, build_router(state))
        .await
        .map_err(|e| ServeError::Serve(format!("serve error: {e}")))
}
