//! Concrete collaborators for the QTrack engine.
//!
//! - [`http`] -- [`HttpStatusProvider`], the pull-style REST provider
//! - [`sse`] -- [`SsePushSource`] and its incremental [`SseDecoder`]
//! - [`nats`] -- [`NatsPushSource`], push events from a NATS subject
//! - [`transport`] -- [`PushTransport`], the configured push channel
//! - [`error`] -- [`ClientError`] for construction failures

pub mod error;
pub mod http;
pub mod nats;
pub mod sse;
pub mod transport;

pub use error::ClientError;
pub use http::HttpStatusProvider;
pub use nats::NatsPushSource;
pub use sse::{SseDecoder, SsePushSource};
pub use transport::PushTransport;
