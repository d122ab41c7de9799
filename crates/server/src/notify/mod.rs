//! Notification Channel: live fan-out of new scan events per owner.
//!
//! [`ScanFeed`] keeps one bounded `broadcast` channel per owner that currently
//! has at least one [`Subscription`]. Whatever observes committed scan inserts
//! (the Postgres [`listener`], or [`crate::db::MemoryStore`]) calls
//! [`ScanFeed::publish`]; every subscriber of that owner receives its own copy
//! in publish order.
//!
//! A `Subscription` is released when dropped. Releasing the last subscription
//! of an owner removes that owner's channel, so the feed only ever holds
//! channels somebody is listening on.

pub mod listener;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use lost_found_core::OwnerId;

use crate::models::ScanEvent;

type Channels = HashMap<OwnerId, broadcast::Sender<ScanEvent>>;

struct FeedInner {
    capacity: usize,
    channels: Mutex<Channels>,
}

impl FeedInner {
    fn channels(&self) -> MutexGuard<'_, Channels> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Process-wide hub of per-owner scan channels.
///
/// Cheaply cloneable; clones share the same channels.
#[derive(Clone)]
pub struct ScanFeed {
    inner: Arc<FeedInner>,
}

impl ScanFeed {
    /// Create a feed buffering up to `capacity` undelivered events per owner.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(FeedInner {
                capacity: capacity.max(1),
                channels: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Start receiving scans of `owner_id` published from now on.
    #[must_use]
    pub fn subscribe(&self, owner_id: OwnerId) -> Subscription {
        let receiver = {
            let mut channels = self.inner.channels();
            channels
                .entry(owner_id)
                .or_insert_with(|| broadcast::channel(self.inner.capacity).0)
                .subscribe()
        };
        tracing::debug!(%owner_id, "Scan subscription opened");

        Subscription {
            owner_id,
            receiver,
            feed: Arc::clone(&self.inner),
        }
    }

    /// Deliver `scan` to every current subscriber of its owner.
    ///
    /// Returns the number of subscribers it was delivered to.
    pub fn publish(&self, scan: &ScanEvent) -> usize {
        let channels = self.inner.channels();
        channels
            .get(&scan.owner_id)
            .map_or(0, |sender| sender.send(scan.clone()).unwrap_or(0))
    }

    /// Number of live subscriptions for `owner_id`.
    #[must_use]
    pub fn subscriber_count(&self, owner_id: OwnerId) -> usize {
        self.inner
            .channels()
            .get(&owner_id)
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Number of owners with at least one live subscription.
    #[must_use]
    pub fn watched_owners(&self) -> usize {
        self.inner.channels().len()
    }
}

/// A live subscription to one owner's scans.
///
/// Dropping it (or calling [`Subscription::close`]) releases it.
pub struct Subscription {
    owner_id: OwnerId,
    receiver: broadcast::Receiver<ScanEvent>,
    feed: Arc<FeedInner>,
}

impl Subscription {
    /// Owner this subscription follows.
    #[must_use]
    pub const fn owner_id(&self) -> OwnerId {
        self.owner_id
    }

    /// Wait for the next scan.
    ///
    /// A subscriber that falls more than the feed capacity behind skips the
    /// overwritten events and continues with the oldest one still buffered.
    /// Returns `None` once the feed is gone.
    pub async fn next(&mut self) -> Option<ScanEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(scan) => return Some(scan),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(owner_id = %self.owner_id, skipped, "Scan subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Return the next already-buffered scan without waiting.
    pub fn try_next(&mut self) -> Option<ScanEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(scan) => return Some(scan),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(owner_id = %self.owner_id, skipped, "Scan subscriber lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Release the subscription.
    pub fn close(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut channels = self.feed.channels();
        // Our own receiver is still alive here, hence `<= 1`.
        let last = channels
            .get(&self.owner_id)
            .is_some_and(|sender| sender.receiver_count() <= 1);
        if last {
            channels.remove(&self.owner_id);
        }
        tracing::debug!(owner_id = %self.owner_id, last, "Scan subscription released");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;

    use lost_found_core::ScanId;

    use super::*;

    fn scan_for(owner_id: OwnerId, ip: &str) -> ScanEvent {
        ScanEvent {
            id: ScanId::generate(),
            owner_id,
            scanned_at: Utc::now(),
            ip_address: ip.to_owned(),
            user_agent: "unknown".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_delivers_only_matching_owner() {
        let feed = ScanFeed::new(8);
        let x = OwnerId::generate();
        let y = OwnerId::generate();
        let mut sub_x = feed.subscribe(x);
        let mut sub_y = feed.subscribe(y);

        let scan = scan_for(x, "10.0.0.1");
        assert_eq!(feed.publish(&scan), 1);

        let received = tokio::time::timeout(Duration::from_secs(1), sub_x.next())
            .await
            .unwrap();
        assert_eq!(received, Some(scan));
        assert_eq!(sub_y.try_next(), None);
    }

    #[tokio::test]
    async fn test_each_subscriber_gets_a_copy_in_order() {
        let feed = ScanFeed::new(8);
        let owner = OwnerId::generate();
        let mut first = feed.subscribe(owner);
        let mut second = feed.subscribe(owner);

        let scans: Vec<_> = ["a", "b", "c"].iter().map(|ip| scan_for(owner, ip)).collect();
        for scan in &scans {
            assert_eq!(feed.publish(scan), 2);
        }

        for sub in [&mut first, &mut second] {
            for expected in &scans {
                assert_eq!(sub.next().await.as_ref(), Some(expected));
            }
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_dropped() {
        let feed = ScanFeed::new(8);
        let owner = OwnerId::generate();
        assert_eq!(feed.publish(&scan_for(owner, "a")), 0);
        assert_eq!(feed.watched_owners(), 0);
    }

    #[test]
    fn test_release_removes_channel_after_last_subscriber() {
        let feed = ScanFeed::new(8);
        let owner = OwnerId::generate();
        let first = feed.subscribe(owner);
        let second = feed.subscribe(owner);
        assert_eq!(feed.subscriber_count(owner), 2);

        first.close();
        assert_eq!(feed.subscriber_count(owner), 1);
        assert_eq!(feed.watched_owners(), 1);

        drop(second);
        assert_eq!(feed.subscriber_count(owner), 0);
        assert_eq!(feed.watched_owners(), 0);
    }

    #[test]
    fn test_subscription_only_sees_later_events() {
        let feed = ScanFeed::new(8);
        let owner = OwnerId::generate();
        let _early = feed.subscribe(owner);
        feed.publish(&scan_for(owner, "before"));

        let mut late = feed.subscribe(owner);
        assert_eq!(late.try_next(), None);
    }

    #[test]
    fn test_lagging_subscriber_skips_to_buffered() {
        let feed = ScanFeed::new(2);
        let owner = OwnerId::generate();
        let mut sub = feed.subscribe(owner);

        let scans: Vec<_> = ["1", "2", "3", "4"].iter().map(|ip| scan_for(owner, ip)).collect();
        for scan in &scans {
            feed.publish(scan);
        }

        assert_eq!(sub.try_next().as_ref(), scans.get(2));
        assert_eq!(sub.try_next().as_ref(), scans.get(3));
        assert_eq!(sub.try_next(), None);
    }
}
