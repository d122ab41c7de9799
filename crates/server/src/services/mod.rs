//! Business logic services.
//!
//! # Services
//!
//! - [`registration`] - Validate a new owner, generate a code, persist it
//! - [`scan`] - Resolve a scanned code to contact info and log the scan
//! - [`activity`] - Owner lookup, scan history and live scan subscriptions
//!
//! Services borrow a [`Store`](crate::db::Store) trait object and are cheap to
//! construct per request.

pub mod activity;
pub mod registration;
pub mod scan;

pub use activity::{ActivityReport, ActivityService};
pub use registration::RegistrationService;
pub use scan::{Contact, ScanService};

use thiserror::Error;

use lost_found_core::{OwnerNameError, PhoneError, UniqueCode, UniqueCodeError};

use crate::db::RepositoryError;

/// Errors returned by the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Owner name failed validation.
    #[error("invalid name: {0}")]
    InvalidName(#[from] OwnerNameError),

    /// Phone number failed validation.
    #[error("invalid phone: {0}")]
    InvalidPhone(#[from] PhoneError),

    /// Unique code was missing.
    #[error("invalid unique code: {0}")]
    InvalidCode(#[from] UniqueCodeError),

    /// No owner holds the requested code.
    #[error("owner not found")]
    NotFound,

    /// Every generated code collided with an existing one.
    #[error("no free unique code after {0} attempts")]
    CodeExhausted(usize),

    /// The store failed.
    #[error("store error: {0}")]
    Store(#[from] RepositoryError),
}

impl ServiceError {
    /// Whether the caller supplied invalid input.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidName(_) | Self::InvalidPhone(_) | Self::InvalidCode(_)
        )
    }
}

/// Parse a code supplied by a caller.
///
/// A blank code is a validation error. A code too long to have ever been
/// issued cannot match an owner and is reported as not found.
pub(crate) fn parse_code(raw: &str) -> Result<UniqueCode, ServiceError> {
    match UniqueCode::parse(raw) {
        Ok(code) => Ok(code),
        Err(UniqueCodeError::TooLong { .. }) => Err(ServiceError::NotFound),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_code() {
        assert_eq!(parse_code(" abcd1234 ").unwrap().as_str(), "abcd1234");
        assert!(matches!(
            parse_code("   "),
            Err(ServiceError::InvalidCode(UniqueCodeError::Empty))
        ));
        assert!(matches!(
            parse_code(&"x".repeat(UniqueCode::MAX_LENGTH + 1)),
            Err(ServiceError::NotFound)
        ));
    }

    #[test]
    fn test_is_validation() {
        assert!(ServiceError::InvalidName(OwnerNameError::Empty).is_validation());
        assert!(ServiceError::InvalidPhone(PhoneError::InvalidCharacter('x')).is_validation());
        assert!(!ServiceError::NotFound.is_validation());
        assert!(!ServiceError::CodeExhausted(5).is_validation());
    }
}
