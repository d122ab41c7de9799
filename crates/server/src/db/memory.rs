//! Process-local [`Store`].
//!
//! Backs `LOSTFOUND_STORE=memory` and the test suites. Scan inserts are
//! published straight to the [`ScanFeed`], playing the part of the Postgres
//! insert trigger. Writes can be made to fail on demand to exercise error
//! paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use lost_found_core::{OwnerId, ScanId, UniqueCode};

use super::{RepositoryError, Store};
use crate::models::{NewOwner, NewScan, Owner, ScanEvent};
use crate::notify::ScanFeed;

#[derive(Default)]
struct Tables {
    owners: Vec<Owner>,
    /// Insertion order.
    scans: Vec<ScanEvent>,
}

/// In-memory owner and scan tables.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    feed: Option<ScanFeed>,
    fail_owner_writes: AtomicBool,
    fail_scan_writes: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store that publishes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that publishes every scan insert to `feed`.
    #[must_use]
    pub fn with_feed(feed: ScanFeed) -> Self {
        Self {
            feed: Some(feed),
            ..Self::default()
        }
    }

    /// Make subsequent owner inserts fail (or succeed again).
    pub fn set_fail_owner_writes(&self, fail: bool) {
        self.fail_owner_writes.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent scan inserts fail (or succeed again).
    pub fn set_fail_scan_writes(&self, fail: bool) {
        self.fail_scan_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of stored owners.
    #[must_use]
    pub fn owner_count(&self) -> usize {
        self.tables().owners.len()
    }

    /// Number of stored scans across all owners.
    #[must_use]
    pub fn scan_count(&self) -> usize {
        self.tables().scans.len()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_owner(&self, owner: &NewOwner) -> Result<Owner, RepositoryError> {
        if self.fail_owner_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("owner writes disabled".to_owned()));
        }

        let mut tables = self.tables();
        if tables
            .owners
            .iter()
            .any(|o| o.unique_code == owner.unique_code)
        {
            return Err(RepositoryError::Conflict(
                "unique code already exists".to_owned(),
            ));
        }

        let stored = Owner {
            id: OwnerId::generate(),
            name: owner.name.clone(),
            phone: owner.phone.clone(),
            unique_code: owner.unique_code.clone(),
            created_at: Utc::now(),
        };
        tables.owners.push(stored.clone());
        Ok(stored)
    }

    async fn owner_by_code(&self, code: &UniqueCode) -> Result<Option<Owner>, RepositoryError> {
        Ok(self
            .tables()
            .owners
            .iter()
            .find(|o| &o.unique_code == code)
            .cloned())
    }

    async fn insert_scan(&self, scan: &NewScan) -> Result<ScanEvent, RepositoryError> {
        if self.fail_scan_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("scan writes disabled".to_owned()));
        }

        let mut tables = self.tables();
        if !tables.owners.iter().any(|o| o.id == scan.owner_id) {
            return Err(RepositoryError::NotFound);
        }

        let stored = ScanEvent {
            id: ScanId::generate(),
            owner_id: scan.owner_id,
            scanned_at: Utc::now(),
            ip_address: scan.ip_address.clone(),
            user_agent: scan.user_agent.clone(),
        };
        tables.scans.push(stored.clone());

        // Published under the table lock so subscribers see insertion order.
        // Lock order is always tables, then feed channels.
        if let Some(feed) = &self.feed {
            feed.publish(&stored);
        }
        drop(tables);

        Ok(stored)
    }

    async fn scans_for_owner(&self, owner_id: OwnerId) -> Result<Vec<ScanEvent>, RepositoryError> {
        // Walk newest insert first; the stable sort keeps that order for
        // identical timestamps.
        let mut scans: Vec<ScanEvent> = self
            .tables()
            .scans
            .iter()
            .rev()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        scans.sort_by(|a, b| b.scanned_at.cmp(&a.scanned_at));
        Ok(scans)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
