//! The canonical shape of one backend's telemetry at an instant.
//!
//! Field names on the wire follow the status provider's JSON layout
//! (`name`, `num_qubits`, `queue_length`, ...). Numeric fields that are
//! absent, negative, or of the wrong JSON type decode as `None`, which
//! means "unknown" and is never conflated with zero.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::lenient;

/// One backend's observed state at a point in time.
///
/// Snapshots are replaced wholesale on each full fleet ingestion and are
/// never patched field by field from another source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EntitySnapshot {
    /// Stable unique backend name.
    #[serde(rename = "name")]
    pub identity: String,
    /// Number of qubits, when reported.
    #[serde(rename = "num_qubits", default, deserialize_with = "lenient::count")]
    pub capacity_qubits: Option<u32>,
    /// Number of pending jobs, when reported.
    #[serde(default, deserialize_with = "lenient::count")]
    pub queue_length: Option<u32>,
    /// Whether the backend accepts work. Unknown status decodes as `false`.
    #[serde(default, deserialize_with = "lenient::flag")]
    pub operational: bool,
    /// Whether the backend is a simulator rather than hardware.
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_simulator: bool,
    /// Opaque backend version label.
    #[serde(rename = "version", default, deserialize_with = "lenient::text")]
    pub version_label: Option<String>,
    /// Opaque status message reported by the provider.
    #[serde(rename = "status_msg", default, deserialize_with = "lenient::text")]
    pub status_message: Option<String>,
}

impl EntitySnapshot {
    /// Create a snapshot with only an identity; every other field is unknown.
    pub fn unknown(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            capacity_qubits: None,
            queue_length: None,
            operational: false,
            is_simulator: false,
            version_label: None,
            status_message: None,
        }
    }

    /// Builder-style setter for the qubit capacity.
    #[must_use]
    pub const fn with_qubits(mut self, qubits: u32) -> Self {
        self.capacity_qubits = Some(qubits);
        self
    }

    /// Builder-style setter for the queue length.
    #[must_use]
    pub const fn with_queue(mut self, queue_length: u32) -> Self {
        self.queue_length = Some(queue_length);
        self
    }

    /// Builder-style setter for the operational flag.
    #[must_use]
    pub const fn with_operational(mut self, operational: bool) -> Self {
        self.operational = operational;
        self
    }

    /// Builder-style setter for the simulator flag.
    #[must_use]
    pub const fn with_simulator(mut self, is_simulator: bool) -> Self {
        self.is_simulator = is_simulator;
        self
    }

    /// The entity type this snapshot belongs to.
    pub const fn entity_type(&self) -> EntityType {
        if self.is_simulator {
            EntityType::Simulator
        } else {
            EntityType::Hardware
        }
    }
}

/// Backend type selector used by filters.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// No type restriction.
    #[default]
    All,
    /// Physical quantum hardware only.
    Hardware,
    /// Simulators only.
    Simulator,
}

impl EntityType {
    /// Whether an entity of type `other` passes this selector.
    pub const fn admits(self, other: Self) -> bool {
        match self {
            Self::All => true,
            Self::Hardware => matches!(other, Self::Hardware),
            Self::Simulator => matches!(other, Self::Simulator),
        }
    }
}

/// Sort order applied after filtering.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Keep provider order.
    #[default]
    #[serde(alias = "none")]
    Unsorted,
    /// Shortest queue first; unknown queue lengths last.
    #[serde(alias = "queue")]
    ByQueueAscending,
    /// Largest qubit capacity first; unknown capacities last.
    #[serde(alias = "qubits")]
    ByQubitsDescending,
    /// Highest recommendation score first.
    #[serde(alias = "score")]
    ByScoreDescending,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn decodes_provider_layout() {
        let json = serde_json::json!({
            "name": "ibm_kyiv",
            "num_qubits": 127,
            "queue_length": 42,
            "operational": true,
            "is_simulator": false,
            "status_msg": "active",
            "version": "1.2.3"
        });
        let entity: EntitySnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(entity.identity, "ibm_kyiv");
        assert_eq!(entity.capacity_qubits, Some(127));
        assert_eq!(entity.queue_length, Some(42));
        assert!(entity.operational);
        assert_eq!(entity.version_label.as_deref(), Some("1.2.3"));
        assert_eq!(entity.entity_type(), EntityType::Hardware);
    }

    #[test]
    fn missing_and_malformed_fields_are_unknown() {
        let json = serde_json::json!({
            "name": "ibm_partial",
            "num_qubits": null,
            "queue_length": -3,
            "operational": "yes",
            "version": 7
        });
        let entity: EntitySnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(entity.capacity_qubits, None);
        assert_eq!(entity.queue_length, None);
        assert!(!entity.operational);
        assert!(!entity.is_simulator);
        assert_eq!(entity.version_label, None);
        assert_eq!(entity.status_message, None);
    }

    #[test]
    fn serializes_unknown_as_null() {
        let entity = EntitySnapshot::unknown("sim").with_simulator(true);
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["name"], "sim");
        assert!(json["num_qubits"].is_null());
        assert_eq!(json["is_simulator"], true);
    }

    #[test]
    fn entity_type_selector() {
        assert!(EntityType::All.admits(EntityType::Simulator));
        assert!(EntityType::Hardware.admits(EntityType::Hardware));
        assert!(!EntityType::Hardware.admits(EntityType::Simulator));
        assert!(!EntityType::Simulator.admits(EntityType::Hardware));
    }

    #[test]
    fn sort_key_wire_names() {
        let key: SortKey = serde_json::from_str("\"by_score_descending\"").unwrap();
        assert_eq!(key, SortKey::ByScoreDescending);
        let ty: EntityType = serde_json::from_str("\"simulator\"").unwrap();
        assert_eq!(ty, EntityType::Simulator);
    }
}
