//! Error types for collaborator construction.
//!
//! Runtime failures are reported to the engine as
//! [`qtrack_core::ProviderError`]; only setup problems surface here.

/// Errors that can occur while building a collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The configured base URL cannot be parsed or cannot carry a path.
    #[error("invalid provider URL {url}: {reason}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
