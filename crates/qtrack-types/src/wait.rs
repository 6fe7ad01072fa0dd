//! Wait-time estimate payloads and their display form.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::lenient;

/// Raw estimate returned by the provider.
///
/// Both fields are optional on the wire; a missing or negative
/// `estimate_seconds` is rendered as `"N/A"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WaitEstimate {
    /// Estimated seconds until a newly submitted job would start.
    #[serde(default, deserialize_with = "lenient::seconds")]
    pub estimate_seconds: Option<f64>,
    /// Median queue length the estimate was derived from.
    #[serde(default, deserialize_with = "lenient::count")]
    pub median_queue_length: Option<u32>,
}

/// A presentation-safe estimate for one entity. Never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WaitReport {
    /// The entity the estimate is for.
    pub identity: String,
    /// Human-facing wait string (`"1h 30m"`, `"2m"`, `"< 1m"`, `"N/A"`).
    pub display: String,
    /// Raw estimate, when the provider supplied one.
    pub estimate: Option<WaitEstimate>,
    /// Why no estimate is available, if so.
    pub unavailable_reason: Option<String>,
}

impl WaitReport {
    /// Whether the provider produced an estimate.
    pub const fn is_available(&self) -> bool {
        self.unavailable_reason.is_none()
    }
}
