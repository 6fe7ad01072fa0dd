//! REST API endpoint handlers for the Observer server.
//!
//! Fleet projections are computed from an immutable [`FleetView`] snapshot
//! on every request. Every body is wrapped in the uniform envelope.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/backends` | Fleet, optionally filtered and sorted |
//! | `GET` | `/api/summary` | Aggregate counters plus the busiest list |
//! | `GET` | `/api/top` | The `n` busiest backends |
//! | `GET` | `/api/recommendation` | Best backend within quota bounds |
//! | `GET` | `/api/history` | History of the inspected backend |
//! | `GET` | `/api/predict_wait` | Formatted wait estimate |
//! | `GET` | `/api/backends/{name}/details` | Provider detail passthrough |
//! | `GET` | `/api/backends/{name}/analytics` | Provider analytics passthrough |
//! | `GET` | `/api/status` | Sync state and freshness |
//! | `POST` | `/api/live/start` | Start live sync |
//! | `POST` | `/api/live/stop` | Stop live sync |
//! | `POST` | `/api/live/toggle` | Toggle live sync |
//! | `POST` | `/api/refresh` | One-off full pull |

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use chrono::{DateTime, Utc};
use qtrack_core::aggregate::{summarize, top_busiest};
use qtrack_core::filter::{FilterPredicate, Recommendation, filter_and_sort, recommend};
use qtrack_core::{HistoryOutcome, PullOutcome, PushSource, StatusProvider};
use qtrack_types::{
    AggregateSummary, AnalyticsRecord, DetailRecord, EntitySnapshot, EntityType, Envelope,
    FleetView, HistorySample, SortKey, SyncState, WaitReport,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ObserverError;
use crate::state::AppState;

/// Upper bound on `GET /api/top?n=`.
const MAX_TOP_N: usize = 50;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for `GET /api/backends`.
#[derive(Debug, Default, Deserialize)]
pub struct BackendsQuery {
    /// Inclusive lower bound on qubits.
    pub min_qubits: Option<u32>,
    /// Inclusive upper bound on queue length.
    pub max_queue: Option<u32>,
    /// `all`, `hardware` or `simulator`.
    #[serde(rename = "type")]
    pub entity_type: Option<EntityType>,
    /// Case-insensitive name substring.
    pub search: Option<String>,
    /// Sort key.
    pub sort: Option<SortKey>,
}

/// Query parameters for `GET /api/top`.
#[derive(Debug, Default, Deserialize)]
pub struct TopQuery {
    /// Number of backends to return.
    pub n: Option<usize>,
}

/// Query parameters for `GET /api/recommendation`.
#[derive(Debug, Default, Deserialize)]
pub struct RecommendationQuery {
    /// Inclusive lower bound on qubits.
    pub min_qubits: Option<u32>,
    /// Inclusive upper bound on queue length.
    pub max_queue: Option<u32>,
}

/// Query parameters for `GET /api/history`.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Backend to inspect.
    pub backend_name: String,
    /// Maximum number of samples.
    pub limit: Option<usize>,
}

/// Query parameters for `GET /api/predict_wait` and `GET /ws/wait`.
#[derive(Debug, Deserialize)]
pub struct WaitQuery {
    /// Backend to estimate.
    pub backend_name: String,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// Body of `GET /api/summary`.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    /// Fleet counters.
    #[serde(flatten)]
    pub summary: AggregateSummary,
    /// Backends not currently operational.
    pub non_operational_backends: u32,
    /// The busiest backends, longest queue first.
    pub busiest: Vec<EntitySnapshot>,
    /// When the fleet was last replaced.
    pub last_updated: Option<DateTime<Utc>>,
}

/// Sync status, returned by `GET /api/status` and the control endpoints.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Current sync state.
    pub state: SyncState,
    /// Whether sync is running.
    pub is_live: bool,
    /// When the fleet was last replaced.
    pub last_updated: Option<DateTime<Utc>>,
    /// Producer time of the applied push snapshot.
    pub snapshot_time: Option<DateTime<Utc>>,
    /// Most recent failure reason.
    pub last_error: Option<String>,
    /// Current sync session.
    pub generation: u64,
    /// Number of backends in the view.
    pub backends: usize,
}

impl From<&FleetView> for StatusResponse {
    fn from(view: &FleetView) -> Self {
        Self {
            state: view.state,
            is_live: view.is_live,
            last_updated: view.last_updated,
            snapshot_time: view.snapshot_time,
            last_error: view.last_error.clone(),
            generation: view.generation,
            backends: view.entities.len(),
        }
    }
}

fn parse_query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ObserverError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| ObserverError::InvalidQuery(rejection.body_text()))
}

// ---------------------------------------------------------------------------
// Fleet projections
// ---------------------------------------------------------------------------

/// List the fleet, filtered and sorted by the query.
pub async fn list_backends<P: StatusProvider, S: PushSource>(
    State(state): State<Arc<AppState<P, S>>>,
    query: Result<Query<BackendsQuery>, QueryRejection>,
) -> Result<Json<Envelope<Vec<EntitySnapshot>>>, ObserverError> {
    let params = parse_query(query)?;
    let predicate = FilterPredicate {
        min_qubits: params.min_qubits.unwrap_or(0),
        max_queue: params.max_queue,
        entity_type: params.entity_type.unwrap_or_default(),
        name_contains: params.search.unwrap_or_default(),
    };
    let view = state.view();
    let entities = filter_and_sort(
        &view.entities,
        &predicate,
        params.sort.unwrap_or_default(),
        &state.scoring,
    );
    Ok(Json(Envelope::success(entities)))
}

/// Aggregate counters plus the busiest list.
pub async fn summary<P: StatusProvider, S: PushSource>(
    State(state): State<Arc<AppState<P, S>>>,
) -> Json<Envelope<SummaryResponse>> {
    let view = state.view();
    let summary = summarize(&view.entities);
    Json(Envelope::success(SummaryResponse {
        summary,
        non_operational_backends: summary.non_operational_count(),
        busiest: top_busiest(&view.entities, state.busiest_n),
        last_updated: view.last_updated,
    }))
}

/// The `n` busiest backends (default from configuration, at most 50).
pub async fn top<P: StatusProvider, S: PushSource>(
    State(state): State<Arc<AppState<P, S>>>,
    query: Result<Query<TopQuery>, QueryRejection>,
) -> Result<Json<Envelope<Vec<EntitySnapshot>>>, ObserverError> {
    let params = parse_query(query)?;
    let n = params.n.unwrap_or(state.busiest_n).clamp(1, MAX_TOP_N);
    let view = state.view();
    Ok(Json(Envelope::success(top_busiest(&view.entities, n))))
}

/// Best backend within the quota bounds; `data` is `null` when none fits.
pub async fn recommendation<P: StatusProvider, S: PushSource>(
    State(state): State<Arc<AppState<P, S>>>,
    query: Result<Query<RecommendationQuery>, QueryRejection>,
) -> Result<Json<Envelope<Option<Recommendation>>>, ObserverError> {
    let params = parse_query(query)?;
    let view = state.view();
    let chosen = recommend(
        &view.entities,
        params.min_qubits.unwrap_or(0),
        params.max_queue,
        &state.scoring,
    );
    debug!(
        min_qubits = ?params.min_qubits,
        max_queue = ?params.max_queue,
        chosen = ?chosen.as_ref().map(|r| r.entity.identity.as_str()),
        "Recommendation computed"
    );
    Ok(Json(Envelope::success(chosen)))
}

// ---------------------------------------------------------------------------
// Per-entity pulls
// ---------------------------------------------------------------------------

/// History of the inspected backend, ascending by time.
///
/// Failures come back as `ok: false` with an empty `data` list and the
/// reason in `error`.
pub async fn history<P: StatusProvider, S: PushSource>(
    State(state): State<Arc<AppState<P, S>>>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Envelope<Vec<HistorySample>>>, ObserverError> {
    let params = parse_query(query)?;
    let limit = params
        .limit
        .unwrap_or(state.history_limit)
        .min(state.history_limit);

    let body = match state.history.get_history(&params.backend_name, limit).await {
        HistoryOutcome::Samples(samples) => Envelope::success(samples),
        HistoryOutcome::Unavailable(reason) => empty_with_error(reason),
        HistoryOutcome::Superseded => {
            empty_with_error(String::from("superseded by a request for another backend"))
        }
    };
    Ok(Json(body))
}

fn empty_with_error(reason: String) -> Envelope<Vec<HistorySample>> {
    Envelope {
        ok: false,
        data: Some(Vec::new()),
        error: Some(reason),
    }
}

/// Formatted wait estimate. Always `ok`; unavailability is in the report.
pub async fn predict_wait<P: StatusProvider, S: PushSource>(
    State(state): State<Arc<AppState<P, S>>>,
    query: Result<Query<WaitQuery>, QueryRejection>,
) -> Result<Json<Envelope<WaitReport>>, ObserverError> {
    let params = parse_query(query)?;
    let report = state.wait.estimate(&params.backend_name).await;
    Ok(Json(Envelope::success(report)))
}

/// Provider detail record for one backend.
pub async fn backend_details<P: StatusProvider, S: PushSource>(
    State(state): State<Arc<AppState<P, S>>>,
    Path(name): Path<String>,
) -> Result<Json<Envelope<DetailRecord>>, ObserverError> {
    let record = state.provider.entity_detail(&name).await?;
    Ok(Json(Envelope::success(record)))
}

/// Provider analytics record for one backend.
pub async fn backend_analytics<P: StatusProvider, S: PushSource>(
    State(state): State<Arc<AppState<P, S>>>,
    Path(name): Path<String>,
) -> Result<Json<Envelope<AnalyticsRecord>>, ObserverError> {
    let record = state.provider.entity_analytics(&name).await?;
    Ok(Json(Envelope::success(record)))
}

// ---------------------------------------------------------------------------
// Sync status and control
// ---------------------------------------------------------------------------

/// Current sync state and freshness.
pub async fn status<P: StatusProvider, S: PushSource>(
    State(state): State<Arc<AppState<P, S>>>,
) -> Json<Envelope<StatusResponse>> {
    Json(Envelope::success(StatusResponse::from(&state.view())))
}

/// Start live sync. Idempotent.
pub async fn live_start<P: StatusProvider, S: PushSource>(
    State(state): State<Arc<AppState<P, S>>>,
) -> Json<Envelope<StatusResponse>> {
    state.sync.start().await;
    Json(Envelope::success(StatusResponse::from(&state.view())))
}

/// Stop live sync. Idempotent.
pub async fn live_stop<P: StatusProvider, S: PushSource>(
    State(state): State<Arc<AppState<P, S>>>,
) -> Json<Envelope<StatusResponse>> {
    state.sync.stop().await;
    Json(Envelope::success(StatusResponse::from(&state.view())))
}

/// Toggle live sync.
pub async fn live_toggle<P: StatusProvider, S: PushSource>(
    State(state): State<Arc<AppState<P, S>>>,
) -> Json<Envelope<StatusResponse>> {
    state.sync.toggle().await;
    Json(Envelope::success(StatusResponse::from(&state.view())))
}

/// Issue a one-off full pull.
///
/// A stale result (sync restarted meanwhile) still reports success with
/// the current status.
pub async fn refresh<P: StatusProvider, S: PushSource>(
    State(state): State<Arc<AppState<P, S>>>,
) -> Result<Json<Envelope<StatusResponse>>, ObserverError> {
    match state.sync.refresh().await {
        PullOutcome::Applied | PullOutcome::Stale => {
            Ok(Json(Envelope::success(StatusResponse::from(&state.view()))))
        }
        PullOutcome::Failed(reason) => Err(ObserverError::RefreshFailed(reason)),
    }
}
