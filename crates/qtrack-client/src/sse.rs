//! Server-sent-events push subscription.
//!
//! The provider frames each event as `data: {json}` followed by a blank
//! line. Chunks from the HTTP body are fed to an [`SseDecoder`], which
//! buffers partial frames across chunk boundaries and yields complete
//! [`PushEvent`]s.

use std::collections::VecDeque;
use std::time::Duration;

use futures::StreamExt;
use qtrack_core::{ProviderError, PushSource, PushStream};
use qtrack_types::PushEvent;
use reqwest::Url;
use reqwest::header::ACCEPT;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::transport::decode_event;

/// Incremental decoder for a `text/event-stream` body.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feed one body chunk and return every event it completes.
    ///
    /// Comment lines and fields other than `data` are ignored. Frames whose
    /// data is not a valid push event are dropped with a warning.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<PushEvent> {
        self.buffer.extend(chunk.iter().copied().filter(|&b| b != b'\r'));

        let mut events = Vec::new();
        while let Some(end) = find_frame_end(&self.buffer) {
            let frame: Vec<u8> = self.buffer.drain(..end.saturating_add(2)).collect();
            if let Some(data) = frame_data(&frame) {
                match decode_event(data.as_bytes()) {
                    Some(event) => events.push(event),
                    None => warn!(bytes = data.len(), "Dropping undecodable SSE frame"),
                }
            }
        }
        events
    }

    /// Bytes held back waiting for the end of a frame.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }
}

fn find_frame_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

/// Join the frame's `data:` lines, or `None` if it carries no data.
fn frame_data(frame: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(frame);
    let lines: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.strip_prefix(' ').unwrap_or(value))
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// [`PushSource`] reading the provider's SSE endpoint.
#[derive(Debug, Clone)]
pub struct SsePushSource {
    client: reqwest::Client,
    url: Url,
}

impl SsePushSource {
    /// Build a source for `url`.
    ///
    /// Only the connect phase is bounded by `connect_timeout`; the stream
    /// itself stays open indefinitely.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the HTTP client cannot be built.
    pub fn new(url: Url, connect_timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self { client, url })
    }

    /// The stream endpoint.
    pub const fn url(&self) -> &Url {
        &self.url
    }
}

impl PushSource for SsePushSource {
    async fn subscribe(&self) -> Result<PushStream, ProviderError> {
        info!(url = %self.url, "Opening SSE subscription");
        let response = self
            .client
            .get(self.url.clone())
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("SSE connect failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Transport(format!(
                "SSE endpoint returned {status}"
            )));
        }

        let body = response.bytes_stream().boxed();
        let state = (body, SseDecoder::default(), VecDeque::new());
        let stream = futures::stream::unfold(state, |(mut body, mut decoder, mut ready)| async move {
            loop {
                if let Some(event) = ready.pop_front() {
                    return Some((event, (body, decoder, ready)));
                }
                match body.next().await {
                    Some(Ok(chunk)) => ready.extend(decoder.push(&chunk)),
                    Some(Err(e)) => {
                        warn!(error = %e, "SSE body read failed");
                        return None;
                    }
                    None => {
                        debug!("SSE body ended");
                        return None;
                    }
                }
            }
        });
        Ok(stream.boxed())
    }
}
