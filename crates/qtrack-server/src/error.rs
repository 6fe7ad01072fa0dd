//! Error types for the `qtrack` binary.
//!
//! [`ServerError`] is the top-level error type that wraps all possible
//! failure modes during startup.

/// Top-level error for the `qtrack` binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: qtrack_core::ConfigError,
    },

    /// The provider client or push transport could not be built.
    #[error("client error: {source}")]
    Client {
        /// The underlying client error.
        #[from]
        source: qtrack_client::ClientError,
    },

    /// Observer API server failed to start.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying server error.
        #[from]
        source: qtrack_observer::ServeError,
    },

    /// Waiting for the shutdown signal failed.
    #[error("signal error: {message}")]
    Signal {
        /// Description of the signal failure.
        message: String,
    },
}
