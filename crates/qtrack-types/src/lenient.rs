//! Field-level tolerant decoders for provider payloads.
//!
//! A malformed field degrades to "unknown" instead of failing the whole
//! snapshot. A malformed entry in a fleet list is dropped on its own.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::entity::EntitySnapshot;

/// Decode a non-negative integer that fits in `u32`, or `None`.
pub fn count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok()))
}

/// Decode any JSON number as `f64`, or `None`.
pub fn seconds<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_f64))
}

/// Decode a boolean; anything else is `false`.
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_bool).unwrap_or(false))
}

/// Decode a string, or `None` when absent or not a string.
pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Decode a fleet list, dropping entries that are not entity objects.
pub fn entities<'de, D>(deserializer: D) -> Result<Vec<EntitySnapshot>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(decode_entities(values.unwrap_or_default()))
}

/// Convert raw JSON values into snapshots, skipping undecodable entries.
pub fn decode_entities(values: Vec<Value>) -> Vec<EntitySnapshot> {
    values
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_without_identity_are_dropped() {
        let values = vec![
            serde_json::json!({"name": "a", "queue_length": 1}),
            serde_json::json!({"queue_length": 2}),
            serde_json::json!("garbage"),
            serde_json::json!({"name": "b"}),
        ];
        let decoded = decode_entities(values);
        let names: Vec<&str> = decoded.iter().map(|e| e.identity.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn oversized_counts_are_unknown() {
        let value = serde_json::json!({"name": "x", "num_qubits": 5_000_000_000_u64});
        let decoded = decode_entities(vec![value]);
        assert_eq!(decoded.first().and_then(|e| e.capacity_qubits), None);
    }
}
