//! In-memory collaborators for the engine's integration tests.
//!
//! Every provider call pops the next scripted reply. A gated reply stays
//! pending until the test releases it through the returned `oneshot`
//! sender, which lets tests control exactly when results arrive. With the
//! script exhausted, calls never resolve.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::StreamExt;
use futures::channel::mpsc;
use qtrack_core::{ProviderError, PushSource, PushStream, StatusProvider};
use qtrack_types::{
    AnalyticsRecord, DetailRecord, EntitySnapshot, FleetView, HistorySample, PushEvent,
    WaitEstimate,
};
use tokio::sync::{oneshot, watch};

type Reply<T> = Result<T, ProviderError>;

enum Scripted<T> {
    Ready(Reply<T>),
    Gated(oneshot::Receiver<Reply<T>>),
}

/// A queue of replies for one provider operation.
pub struct Script<T> {
    replies: Mutex<VecDeque<Scripted<T>>>,
    calls: AtomicUsize,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl<T: Send + 'static> Script<T> {
    /// Queue an immediate reply.
    pub fn ready(&self, reply: Reply<T>) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Scripted::Ready(reply));
    }

    /// Queue a reply released by sending on the returned channel.
    pub fn gated(&self) -> oneshot::Sender<Reply<T>> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().unwrap().push_back(Scripted::Gated(rx));
        tx
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self) -> impl Future<Output = Reply<T>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.replies.lock().unwrap().pop_front();
        async move {
            match scripted {
                Some(Scripted::Ready(reply)) => reply,
                Some(Scripted::Gated(rx)) => rx
                    .await
                    .unwrap_or_else(|_| Err(ProviderError::Transport(String::from("gate dropped")))),
                None => std::future::pending().await,
            }
        }
    }
}

/// Scripted status provider.
#[derive(Default)]
pub struct FakeProvider {
    /// Replies to `list_entities`.
    pub pulls: Script<Vec<EntitySnapshot>>,
    /// Replies to `history`.
    pub history: Script<Vec<HistorySample>>,
    /// Replies to `wait_estimate`.
    pub waits: Script<WaitEstimate>,
}

impl StatusProvider for FakeProvider {
    fn list_entities(&self) -> impl Future<Output = Reply<Vec<EntitySnapshot>>> + Send {
        self.pulls.next()
    }

    fn entity_detail(&self, identity: &str) -> impl Future<Output = Reply<DetailRecord>> + Send {
        let record = DetailRecord(serde_json::json!({ "name": identity }));
        async move { Ok(record) }
    }

    fn entity_analytics(
        &self,
        identity: &str,
    ) -> impl Future<Output = Reply<AnalyticsRecord>> + Send {
        let record = AnalyticsRecord(serde_json::json!({ "name": identity }));
        async move { Ok(record) }
    }

    fn history(
        &self,
        _identity: &str,
        _limit: usize,
    ) -> impl Future<Output = Reply<Vec<HistorySample>>> + Send {
        self.history.next()
    }

    fn wait_estimate(&self, _identity: &str) -> impl Future<Output = Reply<WaitEstimate>> + Send {
        self.waits.next()
    }
}

/// Scripted push source. Each `subscribe` pops the next queued stream;
/// with none queued it hands out a stream that never yields.
#[derive(Default)]
pub struct FakePush {
    streams: Mutex<VecDeque<Reply<PushStream>>>,
    subscribes: AtomicUsize,
}

impl FakePush {
    /// Queue a subscription fed by the returned sender. Dropping the
    /// sender ends the stream.
    pub fn channel(&self) -> mpsc::UnboundedSender<PushEvent> {
        let (tx, rx) = mpsc::unbounded();
        self.streams.lock().unwrap().push_back(Ok(rx.boxed()));
        tx
    }

    /// Queue a failed subscription attempt.
    pub fn fail(&self, reason: &str) {
        self.streams
            .lock()
            .unwrap()
            .push_back(Err(ProviderError::Transport(reason.to_owned())));
    }

    /// Number of subscription attempts so far.
    pub fn subscribes(&self) -> usize {
        self.subscribes.load(Ordering::SeqCst)
    }
}

impl PushSource for FakePush {
    fn subscribe(&self) -> impl Future<Output = Reply<PushStream>> + Send {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        let next = self.streams.lock().unwrap().pop_front();
        async move { next.unwrap_or_else(|| Ok(futures::stream::pending().boxed())) }
    }
}

/// Wait (bounded) until the view satisfies `predicate`.
pub async fn wait_for_view(
    rx: &mut watch::Receiver<FleetView>,
    predicate: impl FnMut(&FleetView) -> bool,
) -> FleetView {
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .unwrap()
        .unwrap()
        .clone()
}

/// Wait (bounded) until `condition` holds, yielding between checks.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap();
}

/// Entity identities in order.
pub fn names(entities: &[EntitySnapshot]) -> Vec<String> {
    entities.iter().map(|e| e.identity.clone()).collect()
}
