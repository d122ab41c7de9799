//! Registration Service.

use tracing::{info, instrument, warn};

use lost_found_core::{OwnerName, Phone, UniqueCode};

use super::ServiceError;
use crate::db::{RepositoryError, Store};
use crate::models::{NewOwner, Owner};

/// How many freshly generated codes to try before giving up.
pub const MAX_CODE_ATTEMPTS: usize = 5;

/// Source of candidate unique codes.
pub type CodeGenerator = dyn Fn() -> UniqueCode + Send + Sync;

static DEFAULT_GENERATOR: fn() -> UniqueCode = UniqueCode::generate;

/// Registers new owners.
pub struct RegistrationService<'a> {
    store: &'a dyn Store,
    generate: &'a CodeGenerator,
}

impl<'a> RegistrationService<'a> {
    /// Create a registration service issuing random codes.
    #[must_use]
    pub fn new(store: &'a dyn Store) -> Self {
        Self {
            store,
            generate: &DEFAULT_GENERATOR,
        }
    }

    /// Create a registration service drawing codes from `generate`.
    #[must_use]
    pub fn with_generator(store: &'a dyn Store, generate: &'a CodeGenerator) -> Self {
        Self { store, generate }
    }

    /// Validate and persist a new owner.
    ///
    /// Input is validated before the store is touched. When the store reports
    /// that a generated code is taken, a new code is generated, up to
    /// [`MAX_CODE_ATTEMPTS`] times.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidName` or `ServiceError::InvalidPhone` for
    /// invalid input, `ServiceError::CodeExhausted` when every attempt
    /// collided, and `ServiceError::Store` for other store failures.
    #[instrument(skip_all)]
    pub async fn register(&self, name: &str, phone: &str) -> Result<Owner, ServiceError> {
        let name = OwnerName::parse(name)?;
        let phone = Phone::parse(phone)?;

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let new_owner = NewOwner {
                name: name.clone(),
                phone: phone.clone(),
                unique_code: (self.generate)(),
            };

            match self.store.insert_owner(&new_owner).await {
                Ok(owner) => {
                    info!(owner_id = %owner.id, code = %owner.unique_code, "Owner registered");
                    return Ok(owner);
                }
                Err(RepositoryError::Conflict(_)) => {
                    warn!(attempt, code = %new_owner.unique_code, "Unique code collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::CodeExhausted(MAX_CODE_ATTEMPTS))
    }
}
