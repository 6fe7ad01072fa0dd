//! Opaque per-entity records passed through from the provider.
//!
//! Detail (configuration, status, calibration) and analytics
//! (distributions, summaries) are not interpreted by the engine.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Full configuration, status and calibration record of one backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(transparent)]
pub struct DetailRecord(pub serde_json::Value);

/// Analytics record (calibration distributions, queue summaries) of one backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(transparent)]
pub struct AnalyticsRecord(pub serde_json::Value);
