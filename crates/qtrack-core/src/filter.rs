//! Stateless filter/sort pipeline and recommendation selection.
//!
//! Predicates compose with logical AND. Sorting is orthogonal to filtering
//! and always stable. A default [`FilterPredicate`] is the identity on the
//! entity list.

use qtrack_types::{EntitySnapshot, EntityType, SortKey};
use serde::Serialize;

use crate::scoring::ScoringPolicy;

/// User-supplied filter criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPredicate {
    /// Inclusive lower bound on qubit capacity; 0 disables the bound.
    /// Unknown capacity counts as 0.
    pub min_qubits: u32,
    /// Inclusive upper bound on queue length; `None` disables the bound.
    /// Entities with an unknown queue length never satisfy a bound.
    pub max_queue: Option<u32>,
    /// Hardware/simulator selector.
    pub entity_type: EntityType,
    /// Case-insensitive substring of the identity; empty disables the match.
    pub name_contains: String,
}

impl FilterPredicate {
    /// A predicate carrying only the quota bounds used for recommendations.
    pub const fn quota(min_qubits: u32, max_queue: Option<u32>) -> Self {
        Self {
            min_qubits,
            max_queue,
            entity_type: EntityType::All,
            name_contains: String::new(),
        }
    }

    /// Whether `entity` passes every active criterion.
    pub fn matches(&self, entity: &EntitySnapshot) -> bool {
        self.matches_quota(entity)
            && self.entity_type.admits(entity.entity_type())
            && self.matches_name(entity)
    }

    fn matches_quota(&self, entity: &EntitySnapshot) -> bool {
        let qubits_ok =
            self.min_qubits == 0 || entity.capacity_qubits.unwrap_or(0) >= self.min_qubits;
        let queue_ok = self
            .max_queue
            .is_none_or(|max| entity.queue_length.is_some_and(|queue| queue <= max));
        qubits_ok && queue_ok
    }

    fn matches_name(&self, entity: &EntitySnapshot) -> bool {
        if self.name_contains.is_empty() {
            return true;
        }
        entity
            .identity
            .to_lowercase()
            .contains(&self.name_contains.to_lowercase())
    }
}

/// Entities passing `predicate`, in fleet order.
pub fn filter(entities: &[EntitySnapshot], predicate: &FilterPredicate) -> Vec<EntitySnapshot> {
    entities
        .iter()
        .filter(|e| predicate.matches(e))
        .cloned()
        .collect()
}

/// Stable in-place sort by `key`.
pub fn sort_entities(entities: &mut [EntitySnapshot], key: SortKey, policy: &ScoringPolicy) {
    match key {
        SortKey::Unsorted => {}
        SortKey::ByQueueAscending => {
            entities.sort_by_key(|e| (e.queue_length.is_none(), e.queue_length));
        }
        SortKey::ByQubitsDescending => {
            entities.sort_by_key(|e| core::cmp::Reverse(e.capacity_qubits));
        }
        SortKey::ByScoreDescending => {
            entities.sort_by(|a, b| policy.score(b).total_cmp(&policy.score(a)));
        }
    }
}

/// Filter then sort in one pass.
pub fn filter_and_sort(
    entities: &[EntitySnapshot],
    predicate: &FilterPredicate,
    key: SortKey,
    policy: &ScoringPolicy,
) -> Vec<EntitySnapshot> {
    let mut selected = filter(entities, predicate);
    sort_entities(&mut selected, key, policy);
    selected
}

/// The chosen entity and its score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// The highest-scoring entity among those passing the quota bounds.
    pub entity: EntitySnapshot,
    /// Its recommendation score.
    pub score: f64,
}

/// Pick the single highest-scoring entity passing the quota bounds.
///
/// Type and name criteria do not apply. Ties go to the first occurrence.
/// `None` means nothing passed the bounds, which is an expected outcome.
pub fn recommend(
    entities: &[EntitySnapshot],
    min_qubits: u32,
    max_queue: Option<u32>,
    policy: &ScoringPolicy,
) -> Option<Recommendation> {
    let quota = FilterPredicate::quota(min_qubits, max_queue);
    entities
        .iter()
        .filter(|e| quota.matches_quota(e))
        .fold(None, |best: Option<Recommendation>, entity| {
            let score = policy.score(entity);
            match best {
                Some(current) if current.score >= score => Some(current),
                _ => Some(Recommendation {
                    entity: entity.clone(),
                    score,
                }),
            }
        })
}
