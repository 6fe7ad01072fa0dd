//! Push transport selection.
//!
//! Uses enum dispatch instead of trait objects because async methods are
//! not dyn-compatible. The variant is picked once from configuration.

use std::time::Duration;

use futures::StreamExt;
use qtrack_core::config::{PushConfig, PushTransportKind};
use qtrack_core::{ProviderError, PushSource, PushStream};
use qtrack_types::PushEvent;
use tracing::debug;

use crate::error::ClientError;
use crate::http::endpoint;
use crate::nats::NatsPushSource;
use crate::sse::SsePushSource;

/// The configured push channel.
#[derive(Debug, Clone)]
pub enum PushTransport {
    /// Server-sent events from the provider.
    Sse(SsePushSource),
    /// A NATS subject.
    Nats(NatsPushSource),
    /// No push channel. Subscriptions stay open and silent, leaving the
    /// periodic pull as the only source.
    Disabled,
}

impl PushTransport {
    /// Build the transport selected by `push`.
    ///
    /// The SSE stream path is resolved against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the SSE URL or HTTP client cannot be built.
    pub fn from_config(
        base_url: &reqwest::Url,
        push: &PushConfig,
        connect_timeout: Duration,
    ) -> Result<Self, ClientError> {
        match push.transport {
            PushTransportKind::Sse => {
                let segments: Vec<&str> = push
                    .stream_path
                    .split('/')
                    .filter(|s| !s.is_empty())
                    .collect();
                let url = endpoint(base_url, &segments).map_err(|e| ClientError::InvalidUrl {
                    url: base_url.to_string(),
                    reason: e.to_string(),
                })?;
                Ok(Self::Sse(SsePushSource::new(url, connect_timeout)?))
            }
            PushTransportKind::Nats => Ok(Self::Nats(NatsPushSource::new(
                push.nats_url.clone(),
                push.subject.clone(),
            ))),
            PushTransportKind::None => Ok(Self::Disabled),
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::Sse(_) => "sse",
            Self::Nats(_) => "nats",
            Self::Disabled => "disabled",
        }
    }
}

impl PushSource for PushTransport {
    async fn subscribe(&self) -> Result<PushStream, ProviderError> {
        match self {
            Self::Sse(source) => source.subscribe().await,
            Self::Nats(source) => source.subscribe().await,
            Self::Disabled => {
                debug!("Push transport disabled, relying on periodic pulls");
                Ok(futures::stream::pending().boxed())
            }
        }
    }
}

/// Decode one JSON push event, or `None` if the payload is unusable.
pub(crate) fn decode_event(payload: &[u8]) -> Option<PushEvent> {
    serde_json::from_slice(payload).ok()
}
