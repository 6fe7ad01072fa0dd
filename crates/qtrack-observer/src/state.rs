//! Shared application state for the Observer API server.
//!
//! [`AppState`] bundles the live-sync controller with the on-demand
//! history cache and wait estimator. Handlers only ever read immutable
//! projections out of it; the controller remains the single writer of the
//! fleet view.

use std::sync::Arc;
use std::time::Duration;

use qtrack_core::{
    HistoryCache, LiveSyncController, PushSource, QtrackConfig, ScoringPolicy, StatusProvider,
    WaitEstimator,
};
use qtrack_types::FleetView;
use tokio::sync::watch;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
pub struct AppState<P, S> {
    /// Owner of the canonical fleet view.
    pub sync: Arc<LiveSyncController<P, S>>,
    /// Pull-style provider for detail and analytics passthrough.
    pub provider: Arc<P>,
    /// History cache for the inspected entity.
    pub history: HistoryCache<P>,
    /// Wait-time estimator.
    pub wait: WaitEstimator<P>,
    /// Recommendation scoring weights.
    pub scoring: ScoringPolicy,
    /// Default size of the busiest list.
    pub busiest_n: usize,
    /// Default and maximum history length per request.
    pub history_limit: usize,
    /// Refresh interval for streamed wait estimates.
    pub wait_refresh: Duration,
}

impl<P: StatusProvider, S: PushSource> AppState<P, S> {
    /// Wire a stopped controller, history cache and estimator over the
    /// given collaborators.
    pub fn new(provider: Arc<P>, push: Arc<S>, config: &QtrackConfig) -> Self {
        let sync = LiveSyncController::new(Arc::clone(&provider), push, config.sync_timing());
        Self {
            sync: Arc::new(sync),
            history: HistoryCache::new(Arc::clone(&provider), config.history),
            wait: WaitEstimator::new(Arc::clone(&provider)),
            provider,
            scoring: config.scoring,
            busiest_n: config.busiest.top_n,
            history_limit: config.history.capacity,
            wait_refresh: Duration::from_millis(config.wait.refresh_interval_ms),
        }
    }

    /// A consistent snapshot of the fleet view.
    pub fn view(&self) -> FleetView {
        self.sync.view()
    }

    /// Follow fleet view changes.
    pub fn subscribe(&self) -> watch::Receiver<FleetView> {
        self.sync.subscribe()
    }
}
