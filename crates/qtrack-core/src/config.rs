//! Configuration loading and typed config structures for QTrack.
//!
//! The canonical configuration lives in `qtrack-config.yaml` in the working
//! directory (or wherever `QTRACK_CONFIG` points). Every section and field
//! has a default, so an empty or missing file yields a working setup that
//! talks to a provider on localhost.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::scoring::ScoringPolicy;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but is unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level QTrack configuration.
///
/// Mirrors the structure of `qtrack-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QtrackConfig {
    /// Pull-style status provider.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Push subscription transport.
    #[serde(default)]
    pub push: PushConfig,

    /// Live-sync timing.
    #[serde(default)]
    pub sync: SyncConfig,

    /// History cache bounds.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Wait-estimate refresh.
    #[serde(default)]
    pub wait: WaitConfig,

    /// Recommendation scoring weights.
    #[serde(default)]
    pub scoring: ScoringPolicy,

    /// Busiest-entity ranking.
    #[serde(default)]
    pub busiest: BusiestConfig,

    /// Observer HTTP server.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Logging output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl QtrackConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `QTRACK_API_URL` overrides `provider.base_url`
    /// - `NATS_URL` overrides `push.nats_url`
    /// - `QTRACK_OBSERVER_PORT` overrides `observer.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides in place.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("QTRACK_API_URL") {
            self.provider.base_url = val;
        }
        if let Ok(val) = std::env::var("NATS_URL") {
            self.push.nats_url = val;
        }
        if let Ok(port) = std::env::var("QTRACK_OBSERVER_PORT") {
            match port.parse() {
                Ok(port) => self.observer.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring unparseable QTRACK_OBSERVER_PORT"),
            }
        }
    }

    /// Reject settings the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(String::from(
                "sync.poll_interval_ms must be greater than zero",
            )));
        }
        if self.history.capacity == 0 {
            return Err(ConfigError::Invalid(String::from(
                "history.capacity must be greater than zero",
            )));
        }
        if self.push.transport == PushTransportKind::Nats && self.push.subject.trim().is_empty() {
            return Err(ConfigError::Invalid(String::from(
                "push.subject is required for the nats transport",
            )));
        }
        Ok(())
    }

    /// Timing knobs consumed by the live-sync controller.
    pub const fn sync_timing(&self) -> SyncTiming {
        SyncTiming {
            poll_interval: Duration::from_millis(self.sync.poll_interval_ms),
            reconnect_delay: Duration::from_millis(self.push.reconnect_delay_ms),
        }
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Pull-style status provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the provider's REST API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

// ---------------------------------------------------------------------------
// Push
// ---------------------------------------------------------------------------

/// Which push transport to subscribe with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushTransportKind {
    /// Server-sent events from the provider's stream endpoint.
    #[default]
    Sse,
    /// A NATS subject carrying JSON push events.
    Nats,
    /// No push channel; periodic pulls only.
    None,
}

/// Push subscription settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PushConfig {
    /// Transport selector.
    #[serde(default)]
    pub transport: PushTransportKind,

    /// SSE endpoint path, relative to `provider.base_url`.
    #[serde(default = "default_stream_path")]
    pub stream_path: String,

    /// NATS server URL.
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// NATS subject carrying push events.
    #[serde(default = "default_subject")]
    pub subject: String,

    /// Delay before re-subscribing after the stream fails or ends.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            transport: PushTransportKind::default(),
            stream_path: default_stream_path(),
            nats_url: default_nats_url(),
            subject: default_subject(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sync
// ---------------------------------------------------------------------------

/// Live-sync settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SyncConfig {
    /// Fallback pull interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Resolved durations for the live-sync controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTiming {
    /// Interval between fallback pulls. The first pull fires immediately.
    pub poll_interval: Duration,
    /// Delay before re-subscribing to the push source.
    pub reconnect_delay: Duration,
}

impl Default for SyncTiming {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(default_poll_interval_ms()),
            reconnect_delay: Duration::from_millis(default_reconnect_delay_ms()),
        }
    }
}

// ---------------------------------------------------------------------------
// History, wait, busiest
// ---------------------------------------------------------------------------

/// History cache bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HistoryConfig {
    /// Samples fetched and retained per entity; oldest evicted beyond this.
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,

    /// How long a retained series is served without refetching.
    #[serde(default = "default_history_ttl_ms")]
    pub ttl_ms: u64,

    /// Maximum number of entities with a retained series.
    #[serde(default = "default_history_max_entities")]
    pub max_entities: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
            ttl_ms: default_history_ttl_ms(),
            max_entities: default_history_max_entities(),
        }
    }
}

/// Wait-estimate refresh settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WaitConfig {
    /// Interval between estimate refreshes for a watched entity.
    #[serde(default = "default_wait_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_wait_refresh_interval_ms(),
        }
    }
}

/// Busiest-entity ranking settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BusiestConfig {
    /// Entities included in the busiest list.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for BusiestConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

// ---------------------------------------------------------------------------
// Observer, logging
// ---------------------------------------------------------------------------

/// Observer HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Bind address.
    #[serde(default = "default_observer_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            host: default_observer_host(),
            port: default_observer_port(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_base_url() -> String {
    String::from("http://127.0.0.1:8000")
}

const fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_stream_path() -> String {
    String::from("/api/stream")
}

fn default_nats_url() -> String {
    String::from("nats://localhost:4222")
}

fn default_subject() -> String {
    String::from("qtrack.fleet")
}

const fn default_reconnect_delay_ms() -> u64 {
    3_000
}

const fn default_poll_interval_ms() -> u64 {
    30_000
}

const fn default_history_capacity() -> usize {
    200
}

const fn default_history_ttl_ms() -> u64 {
    60_000
}

const fn default_history_max_entities() -> usize {
    32
}

const fn default_wait_refresh_interval_ms() -> u64 {
    60_000
}

const fn default_top_n() -> usize {
    8
}

fn default_observer_host() -> String {
    String::from("0.0.0.0")
}

const fn default_observer_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    String::from("info")
}
