//! Presentation views of owners and scans.
//!
//! Shared by the JSON API, the SSE stream and the HTML templates so that a
//! scan rendered on page load and one pushed live look identical. Owner ids
//! are never part of a view.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Owner, ScanEvent};

/// Display format for timestamps, e.g. `Oct 14, 2026, 9:30 AM`.
pub const DISPLAY_TIME_FORMAT: &str = "%b %-d, %Y, %-I:%M %p";

/// Format a timestamp for display (UTC).
#[must_use]
pub fn display_time(at: &DateTime<Utc>) -> String {
    format!("{} UTC", at.format(DISPLAY_TIME_FORMAT))
}

/// Public fields of an owner.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OwnerView {
    pub name: String,
    pub phone: String,
    pub unique_code: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Owner> for OwnerView {
    fn from(owner: &Owner) -> Self {
        Self {
            name: owner.name.to_string(),
            phone: owner.phone.to_string(),
            unique_code: owner.unique_code.to_string(),
            created_at: owner.created_at,
        }
    }
}

/// One scan as shown in the activity list.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScanView {
    pub id: String,
    pub scanned_at: DateTime<Utc>,
    pub display_time: String,
    pub ip_address: String,
    pub user_agent: String,
    pub browser: &'static str,
}

impl From<&ScanEvent> for ScanView {
    fn from(scan: &ScanEvent) -> Self {
        Self {
            id: scan.id.to_string(),
            scanned_at: scan.scanned_at,
            display_time: display_time(&scan.scanned_at),
            ip_address: scan.ip_address.clone(),
            user_agent: scan.user_agent.clone(),
            browser: scan.browser(),
        }
    }
}

/// "1 scan recorded" or "N scans recorded".
#[must_use]
pub fn scan_count_label(count: usize) -> String {
    if count == 1 {
        "1 scan recorded".to_string()
    } else {
        format!("{count} scans recorded")
    }
}
