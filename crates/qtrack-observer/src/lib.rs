//! Observer API server for QTrack.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **REST endpoints** for fleet projections (filtered list, summary,
//!   busiest, recommendation) and per-backend pulls (history, wait
//!   estimate, detail and analytics passthrough)
//! - **Sync control endpoints** to start, stop, toggle and refresh the
//!   live-sync loop
//! - **`WebSocket` endpoints** streaming every published fleet view
//!   (`/ws/fleet`) and periodic wait estimates (`/ws/wait`)
//!
//! Every response body uses the uniform `{ ok, data?, error? }` envelope.
//! Handlers are generic over the provider and push collaborators, so the
//! same router serves the real HTTP client and in-memory fakes.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

pub use error::ObserverError;
pub use router::build_router;
pub use server::ServeError;
pub use startup::{ObserverHandle, spawn_observer};
pub use state::AppState;
