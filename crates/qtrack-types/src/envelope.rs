//! The uniform `{ ok, data?, error? }` response envelope.
//!
//! Every collaborator response and every observer response body uses this
//! shape. `ok: false` and a missing payload are both recoverable failures.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Uniform response wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Envelope<T> {
    /// Whether the call succeeded.
    pub ok: bool,
    /// The payload, present on success.
    #[serde(default = "none")]
    pub data: Option<T>,
    /// Failure reason, present when `ok` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

const fn none<T>() -> Option<T> {
    None
}

/// Why an envelope could not be unwrapped into its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeFailure {
    /// The collaborator answered `ok: false`.
    Rejected(String),
    /// The collaborator answered `ok: true` without a payload.
    MissingData,
}

impl core::fmt::Display for EnvelopeFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Rejected(reason) => write!(f, "request rejected: {reason}"),
            Self::MissingData => write!(f, "response carried no data"),
        }
    }
}

impl<T> Envelope<T> {
    /// A successful envelope carrying `data`.
    pub const fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// A failed envelope carrying a reason.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Unwrap the payload.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeFailure::Rejected`] for `ok: false` and
    /// [`EnvelopeFailure::MissingData`] when a successful envelope has no
    /// payload.
    pub fn into_result(self) -> Result<T, EnvelopeFailure> {
        if !self.ok {
            let reason = self
                .error
                .unwrap_or_else(|| String::from("unspecified error"));
            return Err(EnvelopeFailure::Rejected(reason));
        }
        self.data.ok_or(EnvelopeFailure::MissingData)
    }
}
