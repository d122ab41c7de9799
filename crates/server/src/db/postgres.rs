//! `PostgreSQL`-backed [`Store`].

use async_trait::async_trait;
use sqlx::PgPool;

use lost_found_core::{OwnerId, UniqueCode};

use super::{OwnerRepository, RepositoryError, ScanRepository, Store};
use crate::models::{NewOwner, NewScan, Owner, ScanEvent};

/// Store backed by two pools: a privileged writer and a restricted reader.
///
/// Inserts go through the writer. Lookups and history queries go through the
/// reader, which should connect as a role holding only `SELECT` on the two
/// tables. Without a separate reader both roles share the writer pool.
#[derive(Clone)]
pub struct PgStore {
    writer: PgPool,
    reader: PgPool,
}

impl PgStore {
    /// Create a store from a writer pool and an optional reader pool.
    #[must_use]
    pub fn new(writer: PgPool, reader: Option<PgPool>) -> Self {
        let reader = reader.unwrap_or_else(|| writer.clone());
        Self { writer, reader }
    }

    /// Pool used for read-only queries and the change listener.
    #[must_use]
    pub const fn reader(&self) -> &PgPool {
        &self.reader
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_owner(&self, owner: &NewOwner) -> Result<Owner, RepositoryError> {
        OwnerRepository::new(&self.writer).create(owner).await
    }

    async fn owner_by_code(&self, code: &UniqueCode) -> Result<Option<Owner>, RepositoryError> {
        OwnerRepository::new(&self.reader).get_by_code(code).await
    }

    async fn insert_scan(&self, scan: &NewScan) -> Result<ScanEvent, RepositoryError> {
        ScanRepository::new(&self.writer).create(scan).await
    }

    async fn scans_for_owner(&self, owner_id: OwnerId) -> Result<Vec<ScanEvent>, RepositoryError> {
        ScanRepository::new(&self.reader)
            .list_for_owner(owner_id)
            .await
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.writer).await?;
        Ok(())
    }
}
