//! Read-model types derived from the fleet state.
//!
//! [`FleetView`] is published by the live-sync controller as an immutable
//! value. Consumers clone it out of the channel and never write back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::entity::EntitySnapshot;

/// Lifecycle state of the live-sync loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Not syncing. The view holds the last-known fleet.
    #[default]
    Stopped,
    /// Started, waiting for the first successful pull or push event.
    Starting,
    /// Push stream healthy and data flowing.
    Live,
    /// Push stream failed; periodic pulls keep refreshing the view.
    Degraded,
}

impl SyncState {
    /// Whether the sync loop is running in any form.
    pub const fn is_running(self) -> bool {
        !matches!(self, Self::Stopped)
    }
}

/// The canonical fleet plus freshness metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FleetView {
    /// Every entity from the most recently applied snapshot, provider order.
    pub entities: Vec<EntitySnapshot>,
    /// When the current entity list was applied.
    pub last_updated: Option<DateTime<Utc>>,
    /// Producer timestamp of the applied push snapshot, when it carried one.
    /// Display only; ordering is by arrival.
    pub snapshot_time: Option<DateTime<Utc>>,
    /// Whether the sync loop is currently running.
    pub is_live: bool,
    /// Current sync state.
    pub state: SyncState,
    /// Most recent failure reason, cleared by the next successful update.
    pub last_error: Option<String>,
    /// Generation of the sync session that produced this view.
    pub generation: u64,
}

impl FleetView {
    /// Look up an entity by identity.
    pub fn entity(&self, identity: &str) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|e| e.identity == identity)
    }
}

/// Fleet-wide counters, always a pure function of a [`FleetView`].
///
/// Wire names match the provider's summary layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AggregateSummary {
    /// Number of entities.
    #[serde(rename = "total_backends")]
    pub total_count: u32,
    /// Number of operational entities.
    #[serde(rename = "operational_backends")]
    pub operational_count: u32,
    /// Number of simulators.
    #[serde(rename = "simulators")]
    pub simulator_count: u32,
    /// Sum of known queue lengths.
    pub total_pending_jobs: u64,
}

impl AggregateSummary {
    /// Entities not currently operational.
    pub const fn non_operational_count(&self) -> u32 {
        self.total_count.saturating_sub(self.operational_count)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn summary_wire_names() {
        let summary = AggregateSummary {
            total_count: 3,
            operational_count: 2,
            simulator_count: 1,
            total_pending_jobs: 40,
        };
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["total_backends"], 3);
        assert_eq!(json["operational_backends"], 2);
        assert_eq!(json["simulators"], 1);
        assert_eq!(json["total_pending_jobs"], 40);
        assert_eq!(summary.non_operational_count(), 1);
    }

    #[test]
    fn default_view_is_stopped_and_empty() {
        let view = FleetView::default();
        assert!(view.entities.is_empty());
        assert!(!view.is_live);
        assert_eq!(view.state, SyncState::Stopped);
        assert!(!view.state.is_running());
    }
}
