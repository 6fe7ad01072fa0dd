//! Live telemetry aggregation and recommendation engine for QTrack.
//!
//! This crate owns the canonical fleet view and everything derived from it.
//! It never performs I/O itself: collaborators are injected through the
//! [`provider::StatusProvider`] and [`provider::PushSource`] traits.
//!
//! # Modules
//!
//! - [`sync`] -- [`LiveSyncController`], the single writer of the fleet view
//! - [`aggregate`] -- summary counters and the busiest ranking
//! - [`scoring`] -- the recommendation score policy
//! - [`filter`] -- the stateless filter/sort pipeline and recommendation
//! - [`history`] -- the de-duplicating per-entity history cache
//! - [`wait`] -- wait-time formatting and periodic estimates
//! - [`provider`] -- collaborator traits and [`ProviderError`]
//! - [`config`] -- YAML configuration with environment overrides

pub mod aggregate;
pub mod config;
pub mod filter;
pub mod history;
pub mod provider;
pub mod scoring;
pub mod sync;
pub mod wait;

pub use config::{ConfigError, QtrackConfig, SyncTiming};
pub use filter::{FilterPredicate, Recommendation};
pub use history::{HistoryCache, HistoryOutcome};
pub use provider::{ProviderError, PushSource, PushStream, StatusProvider};
pub use scoring::ScoringPolicy;
pub use sync::{LiveSyncController, PullOutcome};
pub use wait::{WaitEstimator, WaitWatch, format_seconds};
