//! # Watch feeds: where records come from.
//!
//! A [`WatchFeed`] produces `(key, record)` pairs for every observed change.
//! The controller pumps the stream into the [`ReconcileQueue`], which
//! coalesces bursts of updates for the same key.
//!
//! Two feeds ship with the crate:
//! - [`StaticFeed`]: replays a fixed list (tests, demos, one-shot runs)
//! - [`ChannelFeed`]: forwards whatever is sent on its [`FeedSender`]

use std::sync::{Arc, Mutex};

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use tokio::select;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::deployment::{DeploymentRecord, ObjectKey};
use crate::events::{Bus, Event, EventKind};
use crate::queue::{Enqueued, ReconcileQueue};

/// Source of observed deployment changes.
///
/// The stream ends when the source is exhausted or lost. Restarting a lost
/// watch is the feed's concern; the controller does not call `watch` twice.
pub trait WatchFeed: Send + Sync + 'static {
    fn watch(&self) -> BoxStream<'static, (ObjectKey, DeploymentRecord)>;
}

/// Shared handle to a watch feed.
pub type FeedRef = Arc<dyn WatchFeed>;

/// Feed that yields a fixed list of records, then ends.
#[derive(Clone, Debug, Default)]
pub struct StaticFeed {
    records: Vec<DeploymentRecord>,
}

impl StaticFeed {
    pub fn new(records: Vec<DeploymentRecord>) -> Self {
        Self { records }
    }
}

impl WatchFeed for StaticFeed {
    fn watch(&self) -> BoxStream<'static, (ObjectKey, DeploymentRecord)> {
        let items: Vec<_> = self
            .records
            .iter()
            .map(|r| (r.key().clone(), r.clone()))
            .collect();
        stream::iter(items).boxed()
    }
}

/// Sending half of a [`ChannelFeed`].
pub type FeedSender = mpsc::UnboundedSender<(ObjectKey, DeploymentRecord)>;

/// Feed backed by an unbounded channel. Ends when every sender is dropped.
pub struct ChannelFeed {
    rx: Mutex<Option<mpsc::UnboundedReceiver<(ObjectKey, DeploymentRecord)>>>,
}

impl ChannelFeed {
    pub fn new() -> (FeedSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx: Mutex::new(Some(rx)) })
    }
}

impl WatchFeed for ChannelFeed {
    /// The first call takes the receiver; later calls get an empty stream.
    fn watch(&self) -> BoxStream<'static, (ObjectKey, DeploymentRecord)> {
        let rx = self
            .rx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        match rx {
            Some(rx) => stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|item| (item, rx))
            })
            .boxed(),
            None => stream::empty().boxed(),
        }
    }
}

/// Publishes the queue event matching an enqueue result.
pub(crate) fn publish_enqueued(bus: &Bus, key: &ObjectKey, result: Enqueued) {
    let kind = match result {
        Enqueued::Added => EventKind::RecordEnqueued,
        Enqueued::Coalesced => EventKind::RecordCoalesced,
        Enqueued::AlreadyPending | Enqueued::Closed => return,
    };
    bus.publish(Event::new(kind).with_key(key.to_string()));
}

/// Moves records from `feed` into `queue` until the feed ends or `token` is cancelled.
pub(crate) async fn pump(
    feed: FeedRef,
    queue: Arc<ReconcileQueue>,
    bus: Bus,
    token: CancellationToken,
) -> anyhow::Result<()> {
    let mut stream = feed.watch();
    loop {
        let next = select! {
            biased;
            _ = token.cancelled() => return Ok(()),
            next = stream.next() => next,
        };
        let Some((key, record)) = next else {
            bus.publish(Event::new(EventKind::FeedClosed).with_reason("watch stream ended"));
            return Ok(());
        };
        let result = queue.enqueue(key.clone(), record);
        if result == Enqueued::Closed {
            if token.is_cancelled() {
                return Ok(());
            }
            anyhow::bail!("reconcile queue closed while feed still delivering ({key})");
        }
        publish_enqueued(&bus, &key, result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployment::StrategyDescriptor;

    fn record(name: &str, status: &str) -> DeploymentRecord {
        DeploymentRecord::new(ObjectKey::new("ns", name), StrategyDescriptor::Recreate)
            .with_status(status)
    }

    #[tokio::test]
    async fn pump_coalesces_and_reports_feed_end() {
        let feed: FeedRef = Arc::new(StaticFeed::new(vec![
            record("a", "v1"),
            record("b", "v1"),
            record("a", "v2"),
        ]));
        let queue = Arc::new(ReconcileQueue::new());
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();

        pump(feed, queue.clone(), bus, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(queue.len(), 2);
        let (key, rec) = queue.try_pop().unwrap();
        assert_eq!(key, ObjectKey::new("ns", "a"));
        assert_eq!(rec.status, "v2");

        let kinds: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok().map(|e| e.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::RecordEnqueued,
                EventKind::RecordEnqueued,
                EventKind::RecordCoalesced,
                EventKind::FeedClosed,
            ]
        );
    }

    #[tokio::test]
    async fn pump_fails_on_closed_queue() {
        let feed: FeedRef = Arc::new(StaticFeed::new(vec![record("a", "v1")]));
        let queue = Arc::new(ReconcileQueue::new());
        queue.close();

        let res = pump(feed, queue, Bus::new(4), CancellationToken::new()).await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn closed_queue_after_cancel_is_a_clean_stop() {
        let feed: FeedRef = Arc::new(StaticFeed::new(vec![record("a", "v1"), record("b", "v1")]));
        let queue = Arc::new(ReconcileQueue::new());
        let token = CancellationToken::new();
        token.cancel();
        queue.close();

        let res = pump(feed, queue.clone(), Bus::new(4), token).await;
        assert!(res.is_ok());
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn channel_feed_is_taken_once() {
        let (tx, feed) = ChannelFeed::new();
        tx.send((ObjectKey::new("ns", "a"), record("a", "v1"))).unwrap();
        drop(tx);

        let items: Vec<_> = feed.watch().collect().await;
        assert_eq!(items.len(), 1);
        assert!(feed.watch().next().await.is_none());
    }

    #[tokio::test]
    async fn pump_stops_on_cancel() {
        let (_tx, feed) = ChannelFeed::new();
        let token = CancellationToken::new();
        token.cancel();

        let res = pump(
            Arc::new(feed),
            Arc::new(ReconcileQueue::new()),
            Bus::new(4),
            token,
        )
        .await;
        assert!(res.is_ok());
    }
}
