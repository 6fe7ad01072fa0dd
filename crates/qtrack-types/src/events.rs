//! Events delivered by the push subscription.
//!
//! The transport frames each event as a JSON object tagged by `type`:
//! `{"type": "snapshot", "time": 1700000000, "items": [...]}` or
//! `{"type": "error", "error": "..."}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::entity::EntitySnapshot;
use crate::lenient;

/// A single push-stream event for the whole fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushEvent {
    /// A full, internally consistent fleet snapshot.
    Snapshot {
        /// Producer timestamp, for display only. Ordering is by arrival.
        #[serde(default, with = "chrono::serde::ts_seconds_option")]
        #[ts(type = "number | null")]
        time: Option<DateTime<Utc>>,
        /// Every entity in the fleet at that instant.
        #[serde(default, deserialize_with = "lenient::entities")]
        items: Vec<EntitySnapshot>,
    },
    /// The producer failed to obtain a snapshot.
    Error {
        /// Failure reason reported by the producer.
        error: String,
    },
}

impl PushEvent {
    /// Build an error event.
    pub fn error(reason: impl Into<String>) -> Self {
        Self::Error {
            error: reason.into(),
        }
    }

    /// Build a snapshot event without a producer timestamp.
    pub const fn snapshot(items: Vec<EntitySnapshot>) -> Self {
        Self::Snapshot { time: None, items }
    }
}
