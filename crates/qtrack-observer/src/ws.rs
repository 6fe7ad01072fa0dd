//! `WebSocket` handlers for real-time fleet and wait-estimate streaming.
//!
//! `GET /ws/fleet` sends the current [`FleetView`] as soon as the client
//! connects, then one frame every time the live-sync controller publishes
//! a new view. The view travels through a [`watch`] channel, so a slow
//! client only ever sees the latest value and never a backlog.
//!
//! `GET /ws/wait?backend_name=` streams a refreshed wait estimate for one
//! backend. The refresh timer lives exactly as long as the connection.
//!
//! [`FleetView`]: qtrack_types::FleetView
//! [`watch`]: tokio::sync::watch

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use qtrack_core::{PushSource, StatusProvider};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ObserverError;
use crate::handlers::WaitQuery;
use crate::state::AppState;

/// What the client did while we were waiting on the producer side.
enum ClientAction {
    Continue,
    Disconnect,
}

/// Upgrade to a `WebSocket` and stream fleet views.
///
/// # Route
///
/// `GET /ws/fleet`
pub async fn ws_fleet<P: StatusProvider, S: PushSource>(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState<P, S>>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_fleet(socket, state))
}

async fn handle_fleet<P: StatusProvider, S: PushSource>(
    mut socket: WebSocket,
    state: Arc<AppState<P, S>>,
) {
    debug!("Fleet WebSocket client connected");

    let mut rx = state.subscribe();
    let initial = rx.borrow_and_update().clone();
    if !send_json(&mut socket, &initial).await {
        return;
    }

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    debug!("Fleet view channel closed, shutting down WebSocket");
                    return;
                }
                let view = rx.borrow_and_update().clone();
                if !send_json(&mut socket, &view).await {
                    return;
                }
            }
            msg = socket.recv() => {
                if matches!(on_client_message(&mut socket, msg).await, ClientAction::Disconnect) {
                    return;
                }
            }
        }
    }
}

/// Upgrade to a `WebSocket` and stream wait estimates for one backend.
///
/// # Route
///
/// `GET /ws/wait?backend_name=`
pub async fn ws_wait<P: StatusProvider, S: PushSource>(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState<P, S>>>,
    query: Result<Query<WaitQuery>, QueryRejection>,
) -> Response {
    let params = match query {
        Ok(Query(params)) => params,
        Err(rejection) => {
            return ObserverError::InvalidQuery(rejection.body_text()).into_response();
        }
    };
    ws.on_upgrade(move |socket| handle_wait(socket, state, params.backend_name))
}

async fn handle_wait<P: StatusProvider, S: PushSource>(
    mut socket: WebSocket,
    state: Arc<AppState<P, S>>,
    backend_name: String,
) {
    debug!(backend = %backend_name, "Wait WebSocket client connected");

    let mut watch = state.wait.watch(&backend_name, state.wait_refresh);

    loop {
        tokio::select! {
            report = watch.next() => {
                let Some(report) = report else {
                    debug!(backend = %backend_name, "Wait refresh stopped");
                    return;
                };
                if !send_json(&mut socket, &report).await {
                    return;
                }
            }
            msg = socket.recv() => {
                if matches!(on_client_message(&mut socket, msg).await, ClientAction::Disconnect) {
                    return;
                }
            }
        }
    }
}

/// Serialize `value` and send it as a text frame. Returns `false` once
/// the client is gone.
async fn send_json<T: Serialize>(socket: &mut WebSocket, value: &T) -> bool {
    let json = match serde_json::to_string(value) {
        Ok(j) => j,
        Err(e) => {
            warn!("Failed to serialize WebSocket frame: {e}");
            return true;
        }
    };
    if socket.send(Message::Text(json.into())).await.is_err() {
        debug!("WebSocket client disconnected (send failed)");
        return false;
    }
    true
}

async fn on_client_message(
    socket: &mut WebSocket,
    msg: Option<Result<Message, axum::Error>>,
) -> ClientAction {
    match msg {
        Some(Ok(Message::Close(_))) | None => {
            debug!("WebSocket client disconnected");
            ClientAction::Disconnect
        }
        Some(Ok(Message::Ping(data))) => {
            if socket.send(Message::Pong(data)).await.is_err() {
                debug!("WebSocket client disconnected (pong failed)");
                return ClientAction::Disconnect;
            }
            ClientAction::Continue
        }
        Some(Err(e)) => {
            debug!("WebSocket error: {e}");
            ClientAction::Disconnect
        }
        // Client text and binary frames are ignored.
        Some(Ok(_)) => ClientAction::Continue,
    }
}
