//! Integration tests for the live-sync controller.
//!
//! The controller runs against scripted in-memory collaborators. Results
//! are released through gates so each test decides exactly when a pull or
//! push lands relative to `start`/`stop`.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakeProvider, FakePush, names, wait_for_view, wait_until};
use qtrack_core::aggregate::{summarize, top_busiest};
use qtrack_core::filter::recommend;
use qtrack_core::{LiveSyncController, ProviderError, PullOutcome, ScoringPolicy, SyncTiming};
use qtrack_types::{AggregateSummary, EntitySnapshot, PushEvent, SyncState};

type Controller = LiveSyncController<FakeProvider, FakePush>;

fn timing() -> SyncTiming {
    SyncTiming {
        poll_interval: Duration::from_secs(3600),
        reconnect_delay: Duration::from_millis(10),
    }
}

fn controller(provider: &Arc<FakeProvider>, push: &Arc<FakePush>) -> Arc<Controller> {
    Arc::new(LiveSyncController::new(
        Arc::clone(provider),
        Arc::clone(push),
        timing(),
    ))
}

fn fleet_a() -> Vec<EntitySnapshot> {
    vec![
        EntitySnapshot::unknown("ibm_kyiv")
            .with_qubits(127)
            .with_queue(12)
            .with_operational(true),
        EntitySnapshot::unknown("ibm_brisbane")
            .with_qubits(127)
            .with_queue(3)
            .with_operational(true),
    ]
}

fn fleet_b() -> Vec<EntitySnapshot> {
    vec![EntitySnapshot::unknown("ibm_sherbrooke")
        .with_qubits(127)
        .with_queue(0)
        .with_operational(true)]
}

#[tokio::test]
async fn start_seeds_view_and_goes_live() {
    let provider = Arc::new(FakeProvider::default());
    let push = Arc::new(FakePush::default());
    provider.pulls.ready(Ok(fleet_a()));

    let sync = controller(&provider, &push);
    let mut rx = sync.subscribe();
    assert_eq!(sync.state(), SyncState::Stopped);

    sync.start().await;
    let view = wait_for_view(&mut rx, |v| v.state == SyncState::Live).await;

    assert_eq!(names(&view.entities), vec!["ibm_kyiv", "ibm_brisbane"]);
    assert!(view.is_live);
    assert!(view.last_updated.is_some());
    assert_eq!(view.generation, 1);
    assert_eq!(provider.pulls.calls(), 1);
}

#[tokio::test]
async fn push_snapshot_replaces_view_wholesale() {
    let provider = Arc::new(FakeProvider::default());
    let push = Arc::new(FakePush::default());
    provider.pulls.ready(Ok(fleet_a()));
    let events = push.channel();

    let sync = controller(&provider, &push);
    let mut rx = sync.subscribe();
    sync.start().await;
    wait_for_view(&mut rx, |v| v.entities.len() == 2).await;

    events
        .unbounded_send(PushEvent::snapshot(fleet_b()))
        .unwrap();
    let view = wait_for_view(&mut rx, |v| v.entities.len() == 1).await;

    assert_eq!(names(&view.entities), vec!["ibm_sherbrooke"]);
    assert_eq!(view.state, SyncState::Live);
}

#[tokio::test]
async fn push_error_degrades_without_clearing_view() {
    let provider = Arc::new(FakeProvider::default());
    let push = Arc::new(FakePush::default());
    let events = push.channel();

    let sync = controller(&provider, &push);
    let mut rx = sync.subscribe();
    sync.start().await;

    events
        .unbounded_send(PushEvent::snapshot(fleet_a()))
        .unwrap();
    wait_for_view(&mut rx, |v| v.state == SyncState::Live).await;

    events.unbounded_send(PushEvent::error("x")).unwrap();
    let view = wait_for_view(&mut rx, |v| v.state == SyncState::Degraded).await;

    assert_eq!(names(&view.entities), vec!["ibm_kyiv", "ibm_brisbane"]);
    assert_eq!(view.last_error.as_deref(), Some("x"));
    assert!(view.is_live);

    events
        .unbounded_send(PushEvent::snapshot(fleet_b()))
        .unwrap();
    let view = wait_for_view(&mut rx, |v| v.state == SyncState::Live).await;
    assert_eq!(view.last_error, None);
}

#[tokio::test]
async fn pull_issued_before_stop_cannot_alter_next_session() {
    let provider = Arc::new(FakeProvider::default());
    let push = Arc::new(FakePush::default());
    provider.pulls.ready(Ok(fleet_a()));
    let late = provider.pulls.gated();
    provider.pulls.ready(Ok(fleet_b()));

    let sync = controller(&provider, &push);
    let mut rx = sync.subscribe();
    sync.start().await;
    wait_for_view(&mut rx, |v| v.state == SyncState::Live).await;

    // A manual refresh is left in flight across stop/start.
    let refreshing = {
        let sync = Arc::clone(&sync);
        tokio::spawn(async move { sync.refresh().await })
    };
    wait_until(|| provider.pulls.calls() == 2).await;

    sync.stop().await;
    sync.start().await;
    let view = wait_for_view(&mut rx, |v| {
        v.state == SyncState::Live && v.entities.len() == 1
    })
    .await;
    assert_eq!(view.generation, 3);

    late.send(Ok(Vec::new())).unwrap();
    assert_eq!(refreshing.await.unwrap(), PullOutcome::Stale);

    let view = sync.view();
    assert_eq!(names(&view.entities), vec!["ibm_sherbrooke"]);
    assert_eq!(view.generation, 3);
}

#[tokio::test]
async fn failed_pull_keeps_last_known_fleet() {
    let provider = Arc::new(FakeProvider::default());
    let push = Arc::new(FakePush::default());
    provider.pulls.ready(Ok(fleet_a()));
    provider
        .pulls
        .ready(Err(ProviderError::Transport(String::from("connection refused"))));

    let sync = controller(&provider, &push);
    let mut rx = sync.subscribe();
    sync.start().await;
    wait_for_view(&mut rx, |v| v.state == SyncState::Live).await;

    let outcome = sync.refresh().await;
    assert!(matches!(outcome, PullOutcome::Failed(ref reason) if reason.contains("connection refused")));

    let view = sync.view();
    assert_eq!(view.entities.len(), 2);
    assert_eq!(view.state, SyncState::Degraded);
    assert!(view.last_error.is_some());
}

#[tokio::test]
async fn next_good_pull_recovers_from_pull_failure() {
    let provider = Arc::new(FakeProvider::default());
    let push = Arc::new(FakePush::default());
    provider.pulls.ready(Ok(fleet_a()));
    provider
        .pulls
        .ready(Err(ProviderError::Transport(String::from("blip"))));
    provider.pulls.ready(Ok(fleet_b()));

    let sync = controller(&provider, &push);
    let mut rx = sync.subscribe();
    sync.start().await;
    wait_for_view(&mut rx, |v| v.state == SyncState::Live).await;
    let seeded = sync.last_updated();
    assert!(seeded.is_some());

    assert!(matches!(sync.refresh().await, PullOutcome::Failed(_)));
    assert_eq!(sync.state(), SyncState::Degraded);
    assert_eq!(sync.last_updated(), seeded);

    assert_eq!(sync.refresh().await, PullOutcome::Applied);
    let view = sync.view();
    assert_eq!(view.state, SyncState::Live);
    assert_eq!(view.last_error, None);
    assert_eq!(names(&view.entities), vec!["ibm_sherbrooke"]);
}

#[tokio::test]
async fn push_failure_outlasts_good_pulls() {
    let provider = Arc::new(FakeProvider::default());
    let push = Arc::new(FakePush::default());
    let events = push.channel();

    let sync = controller(&provider, &push);
    let mut rx = sync.subscribe();
    sync.start().await;
    events
        .unbounded_send(PushEvent::snapshot(fleet_a()))
        .unwrap();
    wait_for_view(&mut rx, |v| v.state == SyncState::Live).await;
    events.unbounded_send(PushEvent::error("x")).unwrap();
    wait_for_view(&mut rx, |v| v.state == SyncState::Degraded).await;

    // The seeding pull found an empty script and is still pending.
    wait_until(|| provider.pulls.calls() == 1).await;
    provider.pulls.ready(Ok(fleet_b()));
    assert_eq!(sync.refresh().await, PullOutcome::Applied);

    let view = sync.view();
    assert_eq!(names(&view.entities), vec!["ibm_sherbrooke"]);
    assert_eq!(view.state, SyncState::Degraded);
    assert_eq!(view.last_error.as_deref(), Some("x"));
}

#[tokio::test]
async fn stop_retains_view_and_repeats_are_noops() {
    let provider = Arc::new(FakeProvider::default());
    let push = Arc::new(FakePush::default());
    provider.pulls.ready(Ok(fleet_a()));

    let sync = controller(&provider, &push);
    let mut rx = sync.subscribe();
    sync.start().await;
    sync.start().await;
    wait_for_view(&mut rx, |v| v.state == SyncState::Live).await;
    assert_eq!(sync.view().generation, 1);

    sync.stop().await;
    sync.stop().await;
    let view = sync.view();
    assert_eq!(view.state, SyncState::Stopped);
    assert!(!view.is_live);
    assert_eq!(view.entities.len(), 2);
    assert_eq!(view.generation, 2);
}

#[tokio::test]
async fn toggle_flips_running_state() {
    let provider = Arc::new(FakeProvider::default());
    let push = Arc::new(FakePush::default());

    let sync = controller(&provider, &push);
    assert!(sync.toggle().await);
    assert_eq!(sync.state(), SyncState::Starting);
    assert!(!sync.toggle().await);
    assert_eq!(sync.state(), SyncState::Stopped);
    assert!(sync.toggle().await);
    assert!(sync.view().is_live);
}

#[tokio::test]
async fn refresh_while_stopped_updates_view_only() {
    let provider = Arc::new(FakeProvider::default());
    let push = Arc::new(FakePush::default());
    provider.pulls.ready(Ok(fleet_a()));

    let sync = controller(&provider, &push);
    assert_eq!(sync.refresh().await, PullOutcome::Applied);

    let view = sync.view();
    assert_eq!(view.entities.len(), 2);
    assert_eq!(view.state, SyncState::Stopped);
    assert!(!view.is_live);
}

#[tokio::test]
async fn empty_fleet_yields_zero_summary() {
    let provider = Arc::new(FakeProvider::default());
    let push = Arc::new(FakePush::default());
    provider.pulls.ready(Ok(Vec::new()));

    let sync = controller(&provider, &push);
    let mut rx = sync.subscribe();
    sync.start().await;
    let view = wait_for_view(&mut rx, |v| v.state == SyncState::Live).await;

    assert_eq!(summarize(&view.entities), AggregateSummary::default());
    assert!(top_busiest(&view.entities, 8).is_empty());
    assert!(recommend(&view.entities, 0, None, &ScoringPolicy::default()).is_none());
}

#[tokio::test]
async fn recommendation_follows_pushed_fleet() {
    let provider = Arc::new(FakeProvider::default());
    let push = Arc::new(FakePush::default());
    let events = push.channel();

    let sync = controller(&provider, &push);
    let mut rx = sync.subscribe();
    sync.start().await;
    events
        .unbounded_send(PushEvent::snapshot(vec![
            EntitySnapshot::unknown("A").with_qubits(5).with_queue(10),
            EntitySnapshot::unknown("B").with_qubits(20).with_queue(0),
        ]))
        .unwrap();
    let view = wait_for_view(&mut rx, |v| v.entities.len() == 2).await;

    let rec = recommend(&view.entities, 0, None, &ScoringPolicy::default()).unwrap();
    assert_eq!(rec.entity.identity, "B");
}

#[tokio::test]
async fn duplicate_identities_keep_first_occurrence() {
    let provider = Arc::new(FakeProvider::default());
    let push = Arc::new(FakePush::default());
    let events = push.channel();

    let sync = controller(&provider, &push);
    let mut rx = sync.subscribe();
    sync.start().await;
    events
        .unbounded_send(PushEvent::snapshot(vec![
            EntitySnapshot::unknown("dup").with_queue(1),
            EntitySnapshot::unknown("dup").with_queue(99),
        ]))
        .unwrap();
    let view = wait_for_view(&mut rx, |v| v.state == SyncState::Live).await;

    assert_eq!(view.entities.len(), 1);
    assert_eq!(view.entity("dup").and_then(|e| e.queue_length), Some(1));
}

#[tokio::test]
async fn closed_stream_degrades_then_resubscribes() {
    let provider = Arc::new(FakeProvider::default());
    let push = Arc::new(FakePush::default());
    let first = push.channel();
    push.fail("broker unavailable");
    let second = push.channel();

    let sync = controller(&provider, &push);
    let mut rx = sync.subscribe();
    sync.start().await;

    first
        .unbounded_send(PushEvent::snapshot(fleet_a()))
        .unwrap();
    wait_for_view(&mut rx, |v| v.state == SyncState::Live).await;

    drop(first);
    let view = wait_for_view(&mut rx, |v| v.state == SyncState::Degraded).await;
    assert_eq!(view.entities.len(), 2);

    wait_until(|| push.subscribes() == 3).await;
    second
        .unbounded_send(PushEvent::snapshot(fleet_b()))
        .unwrap();
    let view = wait_for_view(&mut rx, |v| v.state == SyncState::Live).await;
    assert_eq!(names(&view.entities), vec!["ibm_sherbrooke"]);
}

#[tokio::test(start_paused = true)]
async fn fallback_poll_runs_on_interval() {
    let provider = Arc::new(FakeProvider::default());
    let push = Arc::new(FakePush::default());
    provider.pulls.ready(Ok(fleet_a()));
    provider.pulls.ready(Ok(fleet_b()));

    let sync = Arc::new(LiveSyncController::new(
        Arc::clone(&provider),
        Arc::clone(&push),
        SyncTiming {
            poll_interval: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(1),
        },
    ));
    let mut rx = sync.subscribe();
    sync.start().await;
    wait_for_view(&mut rx, |v| v.entities.len() == 2).await;
    assert_eq!(provider.pulls.calls(), 1);

    tokio::time::advance(Duration::from_secs(30)).await;
    let view = wait_for_view(&mut rx, |v| v.entities.len() == 1).await;
    assert_eq!(names(&view.entities), vec!["ibm_sherbrooke"]);
    assert_eq!(provider.pulls.calls(), 2);

    sync.stop().await;
    tokio::time::advance(Duration::from_secs(120)).await;
    assert_eq!(provider.pulls.calls(), 2);
}
