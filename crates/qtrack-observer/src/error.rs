//! Error types for the Observer API server.
//!
//! [`ObserverError`] converts into an HTTP response whose body is the
//! uniform `{ ok: false, error }` envelope, so clients parse failures the
//! same way they parse successes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use qtrack_core::ProviderError;
use qtrack_types::Envelope;

/// Errors that can occur in the Observer API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// An invalid query parameter was provided.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The status provider failed to answer a passthrough request.
    #[error("provider error: {0}")]
    Upstream(#[from] ProviderError),

    /// A manual refresh could not pull the fleet.
    #[error("refresh failed: {0}")]
    RefreshFailed(String),
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) | Self::RefreshFailed(_) => StatusCode::BAD_GATEWAY,
        };
        let body = Envelope::<()>::failure(self.to_string());
        (status, axum::Json(body)).into_response()
    }
}
