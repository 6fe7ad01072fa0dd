//! Bounded per-entity history cache with request de-duplication.
//!
//! Only the currently inspected entity is fetched. Concurrent callers for
//! the same identity share one outbound request through a
//! [`futures::future::Shared`] future. Switching the inspected entity bumps
//! a generation counter; a fetch that resolves under an older generation
//! neither writes the cache nor reaches its callers as data.
//!
//! Each cache entry is written only by the fetch that was created for it.
//! Failures never escape: callers get [`HistoryOutcome::Unavailable`] and
//! the cache stays usable.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use qtrack_types::HistorySample;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::HistoryConfig;
use crate::provider::StatusProvider;

/// Result of a history request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryOutcome {
    /// Samples ascending by timestamp, at most the requested limit.
    Samples(Vec<HistorySample>),
    /// The provider failed; the reason is suitable for display.
    Unavailable(String),
    /// The inspected entity changed before the fetch resolved.
    Superseded,
}

impl HistoryOutcome {
    /// The samples, or an empty slice for failures and superseded fetches.
    pub fn samples(&self) -> &[HistorySample] {
        match self {
            Self::Samples(samples) => samples,
            Self::Unavailable(_) | Self::Superseded => &[],
        }
    }

    /// The failure reason, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Unavailable(reason) => Some(reason),
            Self::Samples(_) | Self::Superseded => None,
        }
    }

    /// Keep only the most recent `limit` samples.
    fn limited(self, limit: usize) -> Self {
        match self {
            Self::Samples(samples) => Self::Samples(most_recent(samples, limit)),
            other => other,
        }
    }
}

type SharedFetch = Shared<BoxFuture<'static, HistoryOutcome>>;

struct CachedSeries {
    samples: Vec<HistorySample>,
    stored_at: Instant,
    /// Insertion order; breaks ties between equal `stored_at` instants.
    sequence: u64,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CachedSeries>,
    in_flight: HashMap<String, (u64, SharedFetch)>,
    inspected: Option<String>,
    generation: u64,
    next_request: u64,
    next_sequence: u64,
}

impl CacheState {
    /// Make `identity` the inspected entity, invalidating any other.
    fn inspect(&mut self, identity: &str) {
        if self.inspected.as_deref() == Some(identity) {
            return;
        }
        self.generation = self.generation.saturating_add(1);
        if let Some(previous) = self.inspected.replace(identity.to_owned()) {
            if self.in_flight.remove(&previous).is_some() {
                debug!(entity = %previous, "Dropped interest in in-flight history fetch");
            }
        }
    }

    fn fresh(&self, identity: &str, ttl: Duration) -> Option<&[HistorySample]> {
        self.entries
            .get(identity)
            .filter(|entry| entry.stored_at.elapsed() < ttl)
            .map(|entry| entry.samples.as_slice())
    }

    fn store(&mut self, identity: String, samples: Vec<HistorySample>, max_entities: usize) {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);
        self.entries.insert(
            identity,
            CachedSeries {
                samples,
                stored_at: Instant::now(),
                sequence,
            },
        );
        while self.entries.len() > max_entities.max(1) {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| (entry.stored_at, entry.sequence))
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

/// On-demand history cache for the inspected entity.
pub struct HistoryCache<P> {
    provider: Arc<P>,
    config: HistoryConfig,
    state: Arc<Mutex<CacheState>>,
}

impl<P> Clone for HistoryCache<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            config: self.config,
            state: Arc::clone(&self.state),
        }
    }
}

impl<P: StatusProvider> HistoryCache<P> {
    /// Create an empty cache over `provider`.
    pub fn new(provider: Arc<P>, config: HistoryConfig) -> Self {
        Self {
            provider,
            config,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    /// History of `identity`, ascending by timestamp, at most `limit` long.
    ///
    /// Makes `identity` the inspected entity. A retained series younger
    /// than the TTL is served directly; otherwise the caller joins the
    /// in-flight fetch for `identity` or starts one.
    pub async fn get_history(&self, identity: &str, limit: usize) -> HistoryOutcome {
        let fetch = {
            let mut state = self.state.lock().await;
            state.inspect(identity);

            let ttl = Duration::from_millis(self.config.ttl_ms);
            if let Some(samples) = state.fresh(identity, ttl) {
                debug!(entity = %identity, "History served from cache");
                return HistoryOutcome::Samples(most_recent(samples.to_vec(), limit));
            }

            if let Some((_, fetch)) = state.in_flight.get(identity) {
                debug!(entity = %identity, "Joining in-flight history fetch");
                fetch.clone()
            } else {
                let request_id = state.next_request;
                state.next_request = state.next_request.saturating_add(1);
                let fetch = self.spawn_fetch(identity, state.generation, request_id);
                state
                    .in_flight
                    .insert(identity.to_owned(), (request_id, fetch.clone()));
                fetch
            }
        };

        fetch.await.limited(limit)
    }

    /// The currently inspected identity, if any.
    pub async fn inspected(&self) -> Option<String> {
        self.state.lock().await.inspected.clone()
    }

    fn spawn_fetch(&self, identity: &str, generation: u64, request_id: u64) -> SharedFetch {
        let provider = Arc::clone(&self.provider);
        let state = Arc::clone(&self.state);
        let capacity = self.config.capacity;
        let max_entities = self.config.max_entities;
        let identity = identity.to_owned();

        async move {
            let result = provider.history(&identity, capacity).await;

            let mut state = state.lock().await;
            if state
                .in_flight
                .get(&identity)
                .is_some_and(|(id, _)| *id == request_id)
            {
                state.in_flight.remove(&identity);
            }

            if state.generation != generation {
                debug!(
                    entity = %identity,
                    issued = generation,
                    current = state.generation,
                    "Discarding superseded history result"
                );
                return HistoryOutcome::Superseded;
            }

            match result {
                Ok(samples) => {
                    let samples = normalize(samples, capacity);
                    debug!(entity = %identity, count = samples.len(), "History fetched");
                    state.store(identity, samples.clone(), max_entities);
                    HistoryOutcome::Samples(samples)
                }
                Err(e) => {
                    warn!(entity = %identity, error = %e, "History fetch failed");
                    HistoryOutcome::Unavailable(e.to_string())
                }
            }
        }
        .boxed()
        .shared()
    }
}

/// Sort ascending by timestamp and evict the oldest beyond `capacity`.
fn normalize(mut samples: Vec<HistorySample>, capacity: usize) -> Vec<HistorySample> {
    samples.sort_by_key(|s| s.timestamp);
    most_recent(samples, capacity)
}

/// The last `limit` elements of an ascending series.
fn most_recent(mut samples: Vec<HistorySample>, limit: usize) -> Vec<HistorySample> {
    let excess = samples.len().saturating_sub(limit);
    samples.drain(..excess);
    samples
}
