//! Lookup-and-History Service backing the My-Activity view.

use tracing::instrument;

use super::{ServiceError, parse_code};
use crate::db::Store;
use crate::models::{Owner, ScanEvent};
use crate::notify::{ScanFeed, Subscription};

/// An owner together with every recorded scan, newest first.
#[derive(Debug, Clone)]
pub struct ActivityReport {
    pub owner: Owner,
    pub scans: Vec<ScanEvent>,
}

/// Read-only access to an owner's activity.
pub struct ActivityService<'a> {
    store: &'a dyn Store,
}

impl<'a> ActivityService<'a> {
    /// Create a new activity service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Owner of `code` and their full scan history.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidCode` for a blank code,
    /// `ServiceError::NotFound` when no owner holds it, and
    /// `ServiceError::Store` if a query fails.
    #[instrument(skip(self), fields(code = %code.trim()))]
    pub async fn lookup(&self, code: &str) -> Result<ActivityReport, ServiceError> {
        let owner = self.owner(code).await?;
        let scans = self.store.scans_for_owner(owner.id).await?;
        Ok(ActivityReport { owner, scans })
    }

    /// Subscribe to scans of the owner of `code` recorded from now on.
    ///
    /// # Errors
    ///
    /// Same as [`Self::lookup`]; no subscription is created on error.
    #[instrument(skip(self, feed), fields(code = %code.trim()))]
    pub async fn follow(&self, code: &str, feed: &ScanFeed) -> Result<Subscription, ServiceError> {
        let owner = self.owner(code).await?;
        Ok(feed.subscribe(owner.id))
    }

    async fn owner(&self, code: &str) -> Result<Owner, ServiceError> {
        let code = parse_code(code)?;
        self.store
            .owner_by_code(&code)
            .await?
            .ok_or(ServiceError::NotFound)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::ClientInfo;
    use crate::services::{RegistrationService, ScanService};

    #[tokio::test]
    async fn test_lookup_orders_history_newest_first() {
        let store = MemoryStore::new();
        let owner = RegistrationService::new(&store)
            .register("Jane Doe", "+1 555-0100")
            .await
            .unwrap();
        let scans = ScanService::new(&store);
        for ip in ["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4"] {
            scans
                .log_scan(owner.unique_code.as_str(), &ClientInfo::new(Some(ip), None))
                .await
                .unwrap();
        }

        let report = ActivityService::new(&store)
            .lookup(owner.unique_code.as_str())
            .await
            .unwrap();

        assert_eq!(report.owner.id, owner.id);
        let ips: Vec<_> = report.scans.iter().map(|s| s.ip_address.as_str()).collect();
        assert_eq!(ips, ["10.0.0.4", "10.0.0.3", "10.0.0.2", "10.0.0.1"]);
        assert!(
            report
                .scans
                .windows(2)
                .all(|w| w[0].scanned_at >= w[1].scanned_at)
        );
    }

    #[tokio::test]
    async fn test_lookup_unknown_code() {
        let store = MemoryStore::new();
        assert!(matches!(
            ActivityService::new(&store).lookup("ZZZZZZZZ").await,
            Err(ServiceError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_follow_receives_only_own_scans() {
        let feed = ScanFeed::new(8);
        let store = MemoryStore::with_feed(feed.clone());
        let registration = RegistrationService::new(&store);
        let x = registration.register("Owner X", "111").await.unwrap();
        let y = registration.register("Owner Y", "222").await.unwrap();

        let mut subscription = ActivityService::new(&store)
            .follow(x.unique_code.as_str(), &feed)
            .await
            .unwrap();
        assert_eq!(subscription.owner_id(), x.id);

        let scans = ScanService::new(&store);
        scans
            .log_scan(y.unique_code.as_str(), &ClientInfo::new(Some("y"), None))
            .await
            .unwrap();
        scans
            .log_scan(x.unique_code.as_str(), &ClientInfo::new(Some("x"), None))
            .await
            .unwrap();

        let received = subscription.try_next().unwrap();
        assert_eq!(received.owner_id, x.id);
        assert_eq!(received.ip_address, "x");
        assert_eq!(subscription.try_next(), None);
    }

    #[tokio::test]
    async fn test_follow_unknown_code_creates_no_channel() {
        let feed = ScanFeed::new(8);
        let store = MemoryStore::with_feed(feed.clone());
        let result = ActivityService::new(&store).follow("ZZZZZZZZ", &feed).await;

        assert!(matches!(result, Err(ServiceError::NotFound)));
        assert_eq!(feed.watched_owners(), 0);
    }
}
