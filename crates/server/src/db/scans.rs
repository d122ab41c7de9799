//! Scan log repository for `qr_scans`.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;

use lost_found_core::{OwnerId, ScanId};

use super::RepositoryError;
use crate::models::{NewScan, ScanEvent};

/// Raw `qr_scans` row.
///
/// Also the JSON shape published by the `qr_scans_insert` trigger.
#[derive(Debug, Clone, Deserialize, sqlx::FromRow)]
pub struct ScanRow {
    pub id: ScanId,
    pub qr_user_id: OwnerId,
    pub scanned_at: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: String,
}

impl From<ScanRow> for ScanEvent {
    fn from(row: ScanRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.qr_user_id,
            scanned_at: row.scanned_at,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
        }
    }
}

/// Repository for scan log database operations.
pub struct ScanRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ScanRepository<'a> {
    /// Create a new scan repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append a scan event.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails (including a
    /// foreign key violation for an unknown owner).
    pub async fn create(&self, scan: &NewScan) -> Result<ScanEvent, RepositoryError> {
        let row = sqlx::query_as::<_, ScanRow>(
            r"
            INSERT INTO qr_scans (qr_user_id, ip_address, user_agent)
            VALUES ($1, $2, $3)
            RETURNING id, qr_user_id, scanned_at, ip_address, user_agent
            ",
        )
        .bind(scan.owner_id)
        .bind(&scan.ip_address)
        .bind(&scan.user_agent)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// All scans of an owner, most recent first.
    ///
    /// `seq` breaks ties between rows sharing a timestamp so that the newest
    /// insert still sorts first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_owner(&self, owner_id: OwnerId) -> Result<Vec<ScanEvent>, RepositoryError> {
        let rows = sqlx::query_as::<_, ScanRow>(
            r"
            SELECT id, qr_user_id, scanned_at, ip_address, user_agent
            FROM qr_scans
            WHERE qr_user_id = $1
            ORDER BY scanned_at DESC, seq DESC
            ",
        )
        .bind(owner_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ScanEvent::from).collect())
    }
}
