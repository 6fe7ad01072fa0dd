//! Recommendation scoring.
//!
//! `score = capacity_qubits * qubit_weight + queue_term`, where
//! `queue_term = queue_bonus / (1 + queue_length)` for a non-empty queue and
//! `queue_bonus` for an empty one. The constants are a replaceable policy
//! loaded from configuration; [`ScoringPolicy::default`] carries the
//! observed values (2 and 1000).
//!
//! Unknown capacity counts as zero qubits. An unknown queue length earns no
//! queue term at all: an entity that does not report its queue is never
//! ranked as if it were idle.

use qtrack_types::EntitySnapshot;
use serde::Deserialize;

/// Weights applied when scoring an entity.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ScoringPolicy {
    /// Points per qubit of capacity.
    #[serde(default = "default_qubit_weight")]
    pub qubit_weight: f64,

    /// Points for an empty queue; divided by `1 + queue_length` otherwise.
    #[serde(default = "default_queue_bonus")]
    pub queue_bonus: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            qubit_weight: default_qubit_weight(),
            queue_bonus: default_queue_bonus(),
        }
    }
}

impl ScoringPolicy {
    /// Score one entity. Higher is better.
    pub fn score(&self, entity: &EntitySnapshot) -> f64 {
        let qubits = f64::from(entity.capacity_qubits.unwrap_or(0));
        let queue_term = match entity.queue_length {
            Some(0) => self.queue_bonus,
            Some(queue) => self.queue_bonus / (1.0 + f64::from(queue)),
            None => 0.0,
        };
        qubits.mul_add(self.qubit_weight, queue_term)
    }
}

const fn default_qubit_weight() -> f64 {
    2.0
}

const fn default_queue_bonus() -> f64 {
    1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn idle_entity_gets_full_bonus() {
        let policy = ScoringPolicy::default();
        let entity = EntitySnapshot::unknown("B").with_qubits(20).with_queue(0);
        assert!(approx(policy.score(&entity), 1040.0));
    }

    #[test]
    fn busy_entity_bonus_decays_with_queue() {
        let policy = ScoringPolicy::default();
        let entity = EntitySnapshot::unknown("A").with_qubits(5).with_queue(10);
        assert!(approx(policy.score(&entity), 10.0 + 1000.0 / 11.0));
    }

    #[test]
    fn unknown_fields_score_conservatively() {
        let policy = ScoringPolicy::default();
        let entity = EntitySnapshot::unknown("X");
        assert!(approx(policy.score(&entity), 0.0));
        let queue_only = EntitySnapshot::unknown("Y").with_queue(0);
        assert!(approx(policy.score(&queue_only), 1000.0));
    }

    #[test]
    fn custom_policy_weights() {
        let policy = ScoringPolicy {
            qubit_weight: 1.0,
            queue_bonus: 10.0,
        };
        let entity = EntitySnapshot::unknown("C").with_qubits(7).with_queue(4);
        assert!(approx(policy.score(&entity), 9.0));
    }
}
