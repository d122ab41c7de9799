//! Scan Service: what happens when a stranger scans a tag.

use tracing::{error, info, instrument};

use lost_found_core::{OwnerName, Phone};

use super::{ServiceError, parse_code};
use crate::db::Store;
use crate::models::{ClientInfo, NewScan};

/// Public contact details revealed to whoever scans a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub name: OwnerName,
    pub phone: Phone,
}

/// Resolves scanned codes and records scan events.
pub struct ScanService<'a> {
    store: &'a dyn Store,
}

impl<'a> ScanService<'a> {
    /// Create a new scan service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Look up the owner of `code`, record the scan and return their contact.
    ///
    /// Recording the scan is best effort: a failed insert is logged and
    /// reported to Sentry, and the contact is still returned.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidCode` for a blank code,
    /// `ServiceError::NotFound` when no owner holds it, and
    /// `ServiceError::Store` if the lookup fails.
    #[instrument(skip(self, client), fields(code = %code.trim()))]
    pub async fn log_scan(&self, code: &str, client: &ClientInfo) -> Result<Contact, ServiceError> {
        let code = parse_code(code)?;
        let owner = self
            .store
            .owner_by_code(&code)
            .await?
            .ok_or(ServiceError::NotFound)?;

        match self.store.insert_scan(&NewScan::new(owner.id, client)).await {
            Ok(scan) => {
                info!(owner_id = %owner.id, scan_id = %scan.id, "Scan recorded");
            }
            Err(e) => {
                let event_id = sentry::capture_error(&e);
                error!(
                    owner_id = %owner.id,
                    error = %e,
                    sentry_event_id = %event_id,
                    "Failed to record scan"
                );
            }
        }

        Ok(Contact {
            name: owner.name,
            phone: owner.phone,
        })
    }
}
