//! Live fleet synchronisation.
//!
//! [`LiveSyncController`] is the single writer of the [`FleetView`]. It
//! reconciles two sources:
//!
//! - a push subscription delivering whole-fleet [`PushEvent`]s, re-opened
//!   after a delay whenever it fails or ends;
//! - a periodic full pull that keeps running regardless of push health.
//!   Its first tick fires immediately and seeds the view.
//!
//! Every update replaces the entity list wholesale and is applied in
//! arrival order. Each `start`/`stop` bumps the view's generation; a
//! result is applied only if the generation it was issued under is still
//! current at apply time, so nothing from a stopped session can leak into
//! the next one.
//!
//! # State machine
//!
//! ```text
//! Stopped --start--> Starting --first snapshot/pull--> Live
//!                        |                               |
//!                        +---push or pull failure--> Degraded <--+
//!                                                    |  push snapshot, or a
//!                                                    |  pull while push is healthy
//!                                                    +--> Live
//! any --stop--> Stopped (view retained, not live)
//! ```
//!
//! A push failure is sticky: pulls keep refreshing the entity list but only
//! a push snapshot clears it. A pull failure clears with the next good pull.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use futures::StreamExt;
use qtrack_types::{EntitySnapshot, FleetView, PushEvent, SyncState};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::SyncTiming;
use crate::provider::{ProviderError, PushSource, StatusProvider};

/// Result of a single full pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    /// The pulled fleet replaced the view.
    Applied,
    /// The pull failed; the view was left as it was.
    Failed(String),
    /// The session changed while the pull was in flight; result discarded.
    Stale,
}

// ---------------------------------------------------------------------------
// Shared core (owned by the spawned tasks)
// ---------------------------------------------------------------------------

struct SyncCore<P, S> {
    provider: Arc<P>,
    push: Arc<S>,
    timing: SyncTiming,
    view: watch::Sender<FleetView>,
    /// Whether the push channel of the current session has failed. Only
    /// read and written inside view updates.
    push_failed: AtomicBool,
}

impl<P: StatusProvider, S: PushSource> SyncCore<P, S> {
    /// Run `update` against the view only if `generation` is still current.
    fn apply(&self, generation: u64, update: impl FnOnce(&mut FleetView)) -> bool {
        self.view.send_if_modified(|view| {
            if view.generation != generation {
                return false;
            }
            update(view);
            true
        })
    }

    fn is_current(&self, generation: u64) -> bool {
        self.view.borrow().generation == generation
    }

    async fn pull(&self, generation: u64) -> PullOutcome {
        let result = self.provider.list_entities().await;
        self.apply_pull(generation, result)
    }

    fn apply_pull(
        &self,
        generation: u64,
        result: Result<Vec<EntitySnapshot>, ProviderError>,
    ) -> PullOutcome {
        match result {
            Ok(entities) => {
                let entities = normalize_snapshot(entities);
                let count = entities.len();
                let applied = self.apply(generation, |view| {
                    view.entities = entities;
                    view.last_updated = Some(Utc::now());
                    view.snapshot_time = None;
                    // A failed push channel keeps the session degraded until
                    // a push snapshot arrives.
                    if !self.push_failed.load(Ordering::Relaxed) {
                        view.last_error = None;
                        if matches!(view.state, SyncState::Starting | SyncState::Degraded) {
                            transition(view, SyncState::Live);
                        }
                    }
                });
                if applied {
                    debug!(generation, entities = count, "Applied full pull");
                    PullOutcome::Applied
                } else {
                    debug!(generation, "Discarding stale pull result");
                    PullOutcome::Stale
                }
            }
            Err(e) => {
                let reason = e.to_string();
                let applied = self.apply(generation, |view| {
                    view.last_error = Some(reason.clone());
                    if view.state.is_running() {
                        transition(view, SyncState::Degraded);
                    }
                });
                if applied {
                    warn!(generation, error = %e, "Full pull failed, keeping last-known fleet");
                    PullOutcome::Failed(reason)
                } else {
                    debug!(generation, error = %e, "Discarding stale pull failure");
                    PullOutcome::Stale
                }
            }
        }
    }

    /// Apply one push event. Returns `false` once the session is stale.
    fn apply_push(&self, generation: u64, event: PushEvent) -> bool {
        match event {
            PushEvent::Snapshot { time, items } => {
                let entities = normalize_snapshot(items);
                let count = entities.len();
                let applied = self.apply(generation, |view| {
                    view.entities = entities;
                    view.last_updated = Some(Utc::now());
                    view.snapshot_time = time;
                    view.last_error = None;
                    self.push_failed.store(false, Ordering::Relaxed);
                    transition(view, SyncState::Live);
                });
                if applied {
                    debug!(generation, entities = count, "Applied push snapshot");
                }
                applied
            }
            PushEvent::Error { error } => {
                warn!(generation, error = %error, "Push source reported an error");
                self.degrade_push(generation, error)
            }
        }
    }

    /// Record a push channel failure and move to `Degraded` without
    /// touching the entity list.
    fn degrade_push(&self, generation: u64, reason: String) -> bool {
        self.apply(generation, |view| {
            view.last_error = Some(reason);
            self.push_failed.store(true, Ordering::Relaxed);
            transition(view, SyncState::Degraded);
        })
    }

    async fn run_poll(self: Arc<Self>, generation: u64) {
        let mut ticker = tokio::time::interval(self.timing.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if self.pull(generation).await == PullOutcome::Stale {
                break;
            }
        }
        debug!(generation, "Poll loop exited");
    }

    async fn run_push(self: Arc<Self>, generation: u64) {
        loop {
            match self.push.subscribe().await {
                Ok(mut stream) => {
                    debug!(generation, "Push subscription opened");
                    while let Some(event) = stream.next().await {
                        if !self.apply_push(generation, event) {
                            debug!(generation, "Push loop exited");
                            return;
                        }
                    }
                    warn!(generation, "Push stream closed");
                    self.degrade_push(generation, String::from("push stream closed"));
                }
                Err(e) => {
                    warn!(generation, error = %e, "Push subscription failed");
                    self.degrade_push(generation, e.to_string());
                }
            }

            if !self.is_current(generation) {
                debug!(generation, "Push loop exited");
                return;
            }
            tokio::time::sleep(self.timing.reconnect_delay).await;
        }
    }
}

fn transition(view: &mut FleetView, next: SyncState) {
    if view.state != next {
        info!(
            generation = view.generation,
            from = ?view.state,
            to = ?next,
            "Sync state changed"
        );
        view.state = next;
    }
}

/// Drop duplicate identities (first occurrence wins) and empty identities.
fn normalize_snapshot(entities: Vec<EntitySnapshot>) -> Vec<EntitySnapshot> {
    let mut seen = HashSet::with_capacity(entities.len());
    entities
        .into_iter()
        .filter(|entity| {
            if entity.identity.is_empty() {
                warn!("Dropping entity without identity from snapshot");
                return false;
            }
            if !seen.insert(entity.identity.clone()) {
                warn!(entity = %entity.identity, "Dropping duplicate identity from snapshot");
                return false;
            }
            true
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

struct SyncTasks {
    poll: JoinHandle<()>,
    push: JoinHandle<()>,
}

impl SyncTasks {
    fn abort(&self) {
        self.poll.abort();
        self.push.abort();
    }
}

/// Owner of the canonical [`FleetView`].
///
/// Consumers read immutable snapshots through [`view`](Self::view) or
/// follow changes through [`subscribe`](Self::subscribe). Dropping the
/// controller aborts its background tasks.
pub struct LiveSyncController<P, S> {
    core: Arc<SyncCore<P, S>>,
    tasks: Mutex<Option<SyncTasks>>,
}

impl<P: StatusProvider, S: PushSource> LiveSyncController<P, S> {
    /// Create a stopped controller with an empty view.
    pub fn new(provider: Arc<P>, push: Arc<S>, timing: SyncTiming) -> Self {
        let (view, _) = watch::channel(FleetView::default());
        Self {
            core: Arc::new(SyncCore {
                provider,
                push,
                timing,
                view,
                push_failed: AtomicBool::new(false),
            }),
            tasks: Mutex::new(None),
        }
    }

    /// Start syncing: seed with a full pull, open the push subscription and
    /// arm the fallback poll. No-op if already running.
    pub async fn start(&self) {
        let mut tasks = self.tasks.lock().await;
        self.start_locked(&mut tasks);
    }

    /// Stop syncing. The view keeps its last-known fleet but is marked not
    /// live; in-flight results are discarded. No-op if already stopped.
    pub async fn stop(&self) {
        let mut tasks = self.tasks.lock().await;
        self.stop_locked(&mut tasks);
    }

    /// Stop if running, start otherwise. Returns whether sync is now running.
    pub async fn toggle(&self) -> bool {
        let mut tasks = self.tasks.lock().await;
        if tasks.is_some() {
            self.stop_locked(&mut tasks);
            false
        } else {
            self.start_locked(&mut tasks);
            true
        }
    }

    /// Issue a one-off full pull under the current generation.
    ///
    /// Works whether or not sync is running. A `stop` or `start` while the
    /// pull is in flight makes its result [`PullOutcome::Stale`].
    pub async fn refresh(&self) -> PullOutcome {
        let generation = self.core.view.borrow().generation;
        debug!(generation, "Manual refresh requested");
        self.core.pull(generation).await
    }

    /// A consistent snapshot of the current view.
    pub fn view(&self) -> FleetView {
        self.core.view.borrow().clone()
    }

    /// Current sync state.
    pub fn state(&self) -> SyncState {
        self.core.view.borrow().state
    }

    /// Follow view changes. Every received value is a whole view.
    pub fn subscribe(&self) -> watch::Receiver<FleetView> {
        self.core.view.subscribe()
    }

    /// When the entity list was last replaced.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.core.view.borrow().last_updated
    }

    fn start_locked(&self, tasks: &mut Option<SyncTasks>) {
        if tasks.is_some() {
            debug!("Live sync already running");
            return;
        }

        let mut generation = 0;
        self.core.view.send_modify(|view| {
            view.generation = view.generation.saturating_add(1);
            generation = view.generation;
            view.is_live = true;
            self.core.push_failed.store(false, Ordering::Relaxed);
            transition(view, SyncState::Starting);
        });

        let poll = tokio::spawn(Arc::clone(&self.core).run_poll(generation));
        let push = tokio::spawn(Arc::clone(&self.core).run_push(generation));
        *tasks = Some(SyncTasks { poll, push });

        info!(
            generation,
            poll_interval_ms = u64::try_from(self.core.timing.poll_interval.as_millis())
                .unwrap_or(u64::MAX),
            "Live sync started"
        );
    }

    fn stop_locked(&self, tasks: &mut Option<SyncTasks>) {
        let Some(running) = tasks.take() else {
            debug!("Live sync already stopped");
            return;
        };
        running.abort();

        let mut generation = 0;
        self.core.view.send_modify(|view| {
            view.generation = view.generation.saturating_add(1);
            generation = view.generation;
            view.is_live = false;
            self.core.push_failed.store(false, Ordering::Relaxed);
            transition(view, SyncState::Stopped);
        });
        info!(generation, "Live sync stopped");
    }
}

impl<P, S> Drop for LiveSyncController<P, S> {
    fn drop(&mut self) {
        if let Some(running) = self.tasks.get_mut().take() {
            running.abort();
        }
    }
}
