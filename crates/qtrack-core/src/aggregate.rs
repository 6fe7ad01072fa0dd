//! Fleet-wide counters and busiest rankings.
//!
//! Pure, synchronous functions over an entity slice. Both are recomputed on
//! every fleet change; nothing here is cached.

use qtrack_types::{AggregateSummary, EntitySnapshot};

/// Count entities and sum their known queue lengths.
///
/// An empty fleet yields an all-zero summary.
pub fn summarize(entities: &[EntitySnapshot]) -> AggregateSummary {
    entities
        .iter()
        .fold(AggregateSummary::default(), |mut summary, entity| {
            summary.total_count = summary.total_count.saturating_add(1);
            if entity.operational {
                summary.operational_count = summary.operational_count.saturating_add(1);
            }
            if entity.is_simulator {
                summary.simulator_count = summary.simulator_count.saturating_add(1);
            }
            if let Some(queue) = entity.queue_length {
                summary.total_pending_jobs =
                    summary.total_pending_jobs.saturating_add(u64::from(queue));
            }
            summary
        })
}

/// The `n` entities with the longest queues, longest first.
///
/// Ties keep their fleet order (stable sort). Entities with an unknown queue
/// length are not ranked.
pub fn top_busiest(entities: &[EntitySnapshot], n: usize) -> Vec<EntitySnapshot> {
    let mut ranked: Vec<&EntitySnapshot> = entities
        .iter()
        .filter(|e| e.queue_length.is_some())
        .collect();
    ranked.sort_by(|a, b| b.queue_length.cmp(&a.queue_length));
    ranked.into_iter().take(n).cloned().collect()
}
