//! Presentation-safe wait-time estimates.
//!
//! The provider computes the estimate; this module only turns it into a
//! coarse human string and converts every failure into a displayable
//! "unavailable" report. There is no retry beyond the periodic refresh of
//! [`WaitEstimator::watch`].

use std::sync::Arc;
use std::time::Duration;

use qtrack_types::WaitReport;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::provider::StatusProvider;

/// Display string for an unknown wait.
pub const NOT_AVAILABLE: &str = "N/A";

/// Render seconds as `"{h}h {m}m"`, `"{m}m"` or `"< 1m"`.
///
/// Whole minutes and hours are taken by flooring. Missing, negative or
/// non-finite input renders as [`NOT_AVAILABLE`].
pub fn format_seconds(seconds: Option<f64>) -> String {
    let Some(seconds) = seconds.filter(|s| s.is_finite() && *s >= 0.0) else {
        return String::from(NOT_AVAILABLE);
    };

    // Non-negative and finite; saturates at u64::MAX for absurd inputs.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let minutes = (seconds / 60.0).floor() as u64;
    let hours = minutes / 60;

    if hours > 0 {
        format!("{hours}h {}m", minutes % 60)
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        String::from("< 1m")
    }
}

/// Fetches and formats wait estimates for one entity at a time.
pub struct WaitEstimator<P> {
    provider: Arc<P>,
}

impl<P> Clone for WaitEstimator<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<P: StatusProvider> WaitEstimator<P> {
    /// Create an estimator over `provider`.
    pub const fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Fetch and format the estimate for `identity`. Never fails.
    pub async fn estimate(&self, identity: &str) -> WaitReport {
        match self.provider.wait_estimate(identity).await {
            Ok(estimate) => {
                debug!(
                    entity = %identity,
                    seconds = ?estimate.estimate_seconds,
                    median_queue = ?estimate.median_queue_length,
                    "Wait estimate fetched"
                );
                WaitReport {
                    identity: identity.to_owned(),
                    display: format_seconds(estimate.estimate_seconds),
                    estimate: Some(estimate),
                    unavailable_reason: None,
                }
            }
            Err(e) => {
                warn!(entity = %identity, error = %e, "Wait estimate unavailable");
                WaitReport {
                    identity: identity.to_owned(),
                    display: String::from(NOT_AVAILABLE),
                    estimate: None,
                    unavailable_reason: Some(e.to_string()),
                }
            }
        }
    }

    /// Re-fetch the estimate for `identity` every `interval`.
    ///
    /// The first fetch starts immediately. The returned handle owns the
    /// timer; dropping it stops the refresh.
    pub fn watch(&self, identity: &str, interval: Duration) -> WaitWatch {
        let (tx, rx) = watch::channel(None);
        let estimator = self.clone();
        let identity = identity.to_owned();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let report = estimator.estimate(&identity).await;
                if tx.send(Some(report)).is_err() {
                    break;
                }
            }
        });

        WaitWatch { receiver: rx, task }
    }
}

/// A running periodic estimate. Dropping it cancels the refresh timer.
pub struct WaitWatch {
    receiver: watch::Receiver<Option<WaitReport>>,
    task: JoinHandle<()>,
}

impl WaitWatch {
    /// The most recent report, `None` until the first fetch completes.
    pub fn latest(&self) -> Option<WaitReport> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next report.
    ///
    /// Returns `None` once the refresh task has stopped.
    pub async fn next(&mut self) -> Option<WaitReport> {
        self.receiver.changed().await.ok()?;
        self.receiver.borrow_and_update().clone()
    }
}

impl Drop for WaitWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}
