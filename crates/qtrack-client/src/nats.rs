//! NATS push subscription.
//!
//! Each message on the configured subject carries one JSON push event.
//! A fresh connection is opened per subscription; the client handle rides
//! along in the stream state so the connection lives as long as the
//! stream does.

use futures::StreamExt;
use qtrack_core::{ProviderError, PushSource, PushStream};
use tracing::{debug, info, warn};

use crate::transport::decode_event;

/// [`PushSource`] backed by a NATS subject.
#[derive(Debug, Clone)]
pub struct NatsPushSource {
    url: String,
    subject: String,
}

impl NatsPushSource {
    /// Create a source for `subject` on the server at `url`.
    pub fn new(url: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            subject: subject.into(),
        }
    }
}

impl PushSource for NatsPushSource {
    async fn subscribe(&self) -> Result<PushStream, ProviderError> {
        info!(url = %self.url, subject = %self.subject, "Connecting to NATS for push events");
        let client = async_nats::connect(self.url.as_str()).await.map_err(|e| {
            ProviderError::Transport(format!("failed to connect to {}: {e}", self.url))
        })?;
        let subscriber = client.subscribe(self.subject.clone()).await.map_err(|e| {
            ProviderError::Transport(format!("failed to subscribe to {}: {e}", self.subject))
        })?;
        debug!(subject = %self.subject, "NATS subscription open");

        let stream = futures::stream::unfold(
            (client, subscriber),
            |(client, mut subscriber)| async move {
                loop {
                    let message = subscriber.next().await?;
                    match decode_event(&message.payload) {
                        Some(event) => return Some((event, (client, subscriber))),
                        None => warn!(
                            subject = %message.subject,
                            bytes = message.payload.len(),
                            "Dropping undecodable push message"
                        ),
                    }
                }
            },
        );
        Ok(stream.boxed())
    }
}
