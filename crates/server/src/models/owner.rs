//! Owner domain types.

use chrono::{DateTime, Utc};

use lost_found_core::{OwnerId, OwnerName, Phone, UniqueCode};

/// A registered owner (domain type).
///
/// Created once at registration and never updated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    /// Internal ID. Never shown in the public scan flow.
    pub id: OwnerId,
    /// Name shown to whoever scans the tag.
    pub name: OwnerName,
    /// Contact number shown to whoever scans the tag.
    pub phone: Phone,
    /// Public lookup key embedded in the QR image.
    pub unique_code: UniqueCode,
    /// When the owner registered.
    pub created_at: DateTime<Utc>,
}

/// Values needed to insert an owner.
#[derive(Debug, Clone)]
pub struct NewOwner {
    pub name: OwnerName,
    pub phone: Phone,
    pub unique_code: UniqueCode,
}
