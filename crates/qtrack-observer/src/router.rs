//! Axum router construction for the Observer API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin dashboard access.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use qtrack_core::{PushSource, StatusProvider};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the Observer server.
///
/// See [`handlers`] for the REST endpoint table. `WebSocket` routes are
/// `GET /ws/fleet` and `GET /ws/wait`.
///
/// CORS allows any origin so the dashboard can be served from elsewhere.
pub fn build_router<P: StatusProvider, S: PushSource>(state: Arc<AppState<P, S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // WebSocket
        .route("/ws/fleet", get(ws::ws_fleet::<P, S>))
        .route("/ws/wait", get(ws::ws_wait::<P, S>))
        // Fleet projections
        .route("/api/backends", get(handlers::list_backends::<P, S>))
        .route("/api/summary", get(handlers::summary::<P, S>))
        .route("/api/top", get(handlers::top::<P, S>))
        .route("/api/recommendation", get(handlers::recommendation::<P, S>))
        // Per-backend pulls
        .route("/api/history", get(handlers::history::<P, S>))
        .route("/api/predict_wait", get(handlers::predict_wait::<P, S>))
        .route(
            "/api/backends/{name}/details",
            get(handlers::backend_details::<P, S>),
        )
        .route(
            "/api/backends/{name}/analytics",
            get(handlers::backend_analytics::<P, S>),
        )
        // Sync control
        .route("/api/status", get(handlers::status::<P, S>))
        .route("/api/live/start", post(handlers::live_start::<P, S>))
        .route("/api/live/stop", post(handlers::live_stop::<P, S>))
        .route("/api/live/toggle", post(handlers::live_toggle::<P, S>))
        .route("/api/refresh", post(handlers::refresh::<P, S>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
