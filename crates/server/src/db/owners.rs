//! Owner repository for `qr_users`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use lost_found_core::{OwnerId, OwnerName, Phone, UniqueCode};

use super::{RepositoryError, map_unique_violation};
use crate::models::{NewOwner, Owner};

/// Raw `qr_users` row.
#[derive(Debug, sqlx::FromRow)]
struct OwnerRow {
    id: OwnerId,
    name: String,
    phone: String,
    unique_code: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OwnerRow> for Owner {
    type Error = RepositoryError;

    fn try_from(row: OwnerRow) -> Result<Self, Self::Error> {
        let name = OwnerName::parse(&row.name).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid name in database: {e}"))
        })?;
        let phone = Phone::parse(&row.phone).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid phone in database: {e}"))
        })?;
        let unique_code = UniqueCode::parse(&row.unique_code).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid unique code in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            name,
            phone,
            unique_code,
            created_at: row.created_at,
        })
    }
}

/// Repository for owner database operations.
pub struct OwnerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OwnerRepository<'a> {
    /// Create a new owner repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the unique code already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, owner: &NewOwner) -> Result<Owner, RepositoryError> {
        let row = sqlx::query_as::<_, OwnerRow>(
            r"
            INSERT INTO qr_users (name, phone, unique_code)
            VALUES ($1, $2, $3)
            RETURNING id, name, phone, unique_code, created_at
            ",
        )
        .bind(owner.name.as_str())
        .bind(owner.phone.as_str())
        .bind(owner.unique_code.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "unique code"))?;

        Owner::try_from(row)
    }

    /// Get an owner by their public unique code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_code(&self, code: &UniqueCode) -> Result<Option<Owner>, RepositoryError> {
        let row = sqlx::query_as::<_, OwnerRow>(
            r"
            SELECT id, name, phone, unique_code, created_at
            FROM qr_users
            WHERE unique_code = $1
            ",
        )
        .bind(code.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(Owner::try_from).transpose()
    }
}
