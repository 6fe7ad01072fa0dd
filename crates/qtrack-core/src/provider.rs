//! Collaborator interfaces consumed by the engine.
//!
//! The engine never talks to a network directly. It is handed a
//! [`StatusProvider`] for pull-style queries and a [`PushSource`] for the
//! fleet event stream. Concrete HTTP, SSE and NATS implementations live in
//! `qtrack-client`; tests use in-memory fakes.
//!
//! Trait methods return `impl Future + Send` so controllers can drive them
//! from spawned Tokio tasks.

use std::future::Future;

use futures::stream::BoxStream;
use qtrack_types::{
    AnalyticsRecord, DetailRecord, EntitySnapshot, EnvelopeFailure, HistorySample, PushEvent,
    WaitEstimate,
};

/// A recoverable collaborator failure.
///
/// The engine treats every variant the same way: log it, record it on the
/// relevant read model, keep serving last-known-good data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The collaborator could not be reached or the connection broke.
    #[error("transport error: {0}")]
    Transport(String),

    /// The collaborator answered with `ok: false`.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The response could not be decoded or lacked its payload.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<EnvelopeFailure> for ProviderError {
    fn from(failure: EnvelopeFailure) -> Self {
        match failure {
            EnvelopeFailure::Rejected(reason) => Self::Rejected(reason),
            EnvelopeFailure::MissingData => Self::Malformed(failure.to_string()),
        }
    }
}

/// Pull-style backend status provider.
pub trait StatusProvider: Send + Sync + 'static {
    /// List every entity in the fleet.
    fn list_entities(
        &self,
    ) -> impl Future<Output = Result<Vec<EntitySnapshot>, ProviderError>> + Send;

    /// Fetch the opaque detail record of one entity.
    fn entity_detail(
        &self,
        identity: &str,
    ) -> impl Future<Output = Result<DetailRecord, ProviderError>> + Send;

    /// Fetch the opaque analytics record of one entity.
    fn entity_analytics(
        &self,
        identity: &str,
    ) -> impl Future<Output = Result<AnalyticsRecord, ProviderError>> + Send;

    /// Fetch up to `limit` historical samples of one entity.
    fn history(
        &self,
        identity: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<HistorySample>, ProviderError>> + Send;

    /// Fetch the wait-time estimate of one entity.
    fn wait_estimate(
        &self,
        identity: &str,
    ) -> impl Future<Output = Result<WaitEstimate, ProviderError>> + Send;
}

/// An open push subscription. Ends when the transport closes.
pub type PushStream = BoxStream<'static, PushEvent>;

/// Source of push subscriptions delivering whole-fleet events.
///
/// Transport-level failures after the subscription is open are delivered
/// in-band as [`PushEvent::Error`], or by ending the stream.
pub trait PushSource: Send + Sync + 'static {
    /// Open a new subscription.
    fn subscribe(&self) -> impl Future<Output = Result<PushStream, ProviderError>> + Send;
}
