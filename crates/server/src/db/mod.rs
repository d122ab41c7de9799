//! Persistence for owners and scan events.
//!
//! # Database
//!
//! ## Tables
//!
//! - `qr_users` - Registered owners (Identity Store)
//! - `qr_scans` - Append-only scan log referencing `qr_users`
//!
//! Inserts into `qr_scans` fire a trigger that publishes the new row on the
//! `qr_scans_insert` notification channel (see [`crate::notify::listener`]).
//!
//! # Backends
//!
//! Handlers talk to a [`Store`] trait object so the same service code runs
//! against [`PgStore`] in production and [`MemoryStore`] in tests and local
//! runs.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p lost-found-cli -- migrate
//! ```

pub mod memory;
pub mod owners;
pub mod postgres;
pub mod scans;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use lost_found_core::{OwnerId, UniqueCode};

use crate::models::{NewOwner, NewScan, Owner, ScanEvent};

pub use memory::MemoryStore;
pub use owners::OwnerRepository;
pub use postgres::PgStore;
pub use scans::ScanRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate unique code).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The backend refused the operation (used by the memory store).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Identity Store and Scan Log Store operations.
///
/// Owners and scans are insert-only; there is no update or delete path.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a new owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the unique code is already taken.
    async fn insert_owner(&self, owner: &NewOwner) -> Result<Owner, RepositoryError>;

    /// Find the owner holding `code`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup itself fails.
    async fn owner_by_code(&self, code: &UniqueCode) -> Result<Option<Owner>, RepositoryError>;

    /// Append a scan event and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the insert fails.
    async fn insert_scan(&self, scan: &NewScan) -> Result<ScanEvent, RepositoryError>;

    /// All scans of an owner, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    async fn scans_for_owner(&self, owner_id: OwnerId) -> Result<Vec<ScanEvent>, RepositoryError>;

    /// Check that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the backend cannot serve requests.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-constraint violation to `RepositoryError::Conflict`.
pub(crate) fn map_unique_violation(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

#[cfg(test)]
mod tests {
    const OWNERS_MIGRATION: &str =
        include_str!("../../migrations/20261001000001_create_qr_users.sql");

    #[test]
    fn test_owner_table_needs_no_extension() {
        // gen_random_uuid() is built in from PostgreSQL 13.
        assert!(OWNERS_MIGRATION.contains("gen_random_uuid()"));
        assert!(!OWNERS_MIGRATION.to_uppercase().contains("CREATE EXTENSION"));
    }
}
