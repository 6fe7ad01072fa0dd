//! Historical queue-length samples for a single backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::lenient;

/// One `(timestamp, queue_length)` observation.
///
/// The provider reports timestamps as Unix seconds under `snapshot_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HistorySample {
    /// When the sample was taken.
    #[serde(rename = "snapshot_time", with = "chrono::serde::ts_seconds")]
    #[ts(type = "number")]
    pub timestamp: DateTime<Utc>,
    /// Pending jobs at that instant, when reported.
    #[serde(default, deserialize_with = "lenient::count")]
    pub queue_length: Option<u32>,
}

impl HistorySample {
    /// Build a sample from Unix seconds. Out-of-range timestamps yield `None`.
    pub fn from_unix(seconds: i64, queue_length: Option<u32>) -> Option<Self> {
        DateTime::from_timestamp(seconds, 0).map(|timestamp| Self {
            timestamp,
            queue_length,
        })
    }
}
