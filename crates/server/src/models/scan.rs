//! Scan event domain types.

use chrono::{DateTime, Utc};

use lost_found_core::{OwnerId, ScanId};

/// Placeholder stored when a piece of request metadata is unavailable.
pub const UNKNOWN: &str = "unknown";

/// Maximum stored length of an IP address string, in characters.
pub const MAX_IP_ADDRESS_LENGTH: usize = 255;

/// Maximum stored length of a user agent string, in characters.
pub const MAX_USER_AGENT_LENGTH: usize = 512;

/// One recorded scan of an owner's tag (domain type).
///
/// Scan events are append-only: never updated, never deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEvent {
    pub id: ScanId,
    /// Owner whose code was scanned (`qr_user_id`).
    pub owner_id: OwnerId,
    pub scanned_at: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: String,
}

impl ScanEvent {
    /// Browser family guessed from the user agent.
    #[must_use]
    pub fn browser(&self) -> &'static str {
        browser_family(&self.user_agent)
    }
}

/// Best-effort network metadata of the party scanning a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: String,
    pub user_agent: String,
}

impl ClientInfo {
    /// Build client info, substituting [`UNKNOWN`] for missing or blank values.
    #[must_use]
    pub fn new(ip_address: Option<&str>, user_agent: Option<&str>) -> Self {
        let or_unknown = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(UNKNOWN)
                .to_owned()
        };
        Self {
            ip_address: or_unknown(ip_address),
            user_agent: or_unknown(user_agent),
        }
    }

    /// Client info with nothing known about the caller.
    #[must_use]
    pub fn unknown() -> Self {
        Self::new(None, None)
    }
}

/// Values needed to append a scan event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScan {
    pub owner_id: OwnerId,
    pub ip_address: String,
    pub user_agent: String,
}

impl NewScan {
    /// Build a scan row for `owner_id`, bounding the client metadata.
    #[must_use]
    pub fn new(owner_id: OwnerId, client: &ClientInfo) -> Self {
        Self {
            owner_id,
            ip_address: truncate_chars(&client.ip_address, MAX_IP_ADDRESS_LENGTH),
            user_agent: truncate_chars(&client.user_agent, MAX_USER_AGENT_LENGTH),
        }
    }
}

/// Truncate to at most `max` characters without splitting a character.
fn truncate_chars(value: &str, max: usize) -> String {
    value
        .char_indices()
        .nth(max)
        .map_or(value, |(end, _)| value.get(..end).unwrap_or(value))
        .to_owned()
}

/// Coarse browser family from a user agent string.
///
/// Chrome is checked before Safari because Chrome's user agent also contains
/// "Safari".
#[must_use]
pub fn browser_family(user_agent: &str) -> &'static str {
    if user_agent.contains("Chrome") {
        "Chrome"
    } else if user_agent.contains("Safari") {
        "Safari"
    } else if user_agent.contains("Firefox") {
        "Firefox"
    } else {
        "Unknown Browser"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_info_defaults_to_unknown() {
        let info = ClientInfo::new(None, Some("   "));
        assert_eq!(info.ip_address, "unknown");
        assert_eq!(info.user_agent, "unknown");
    }

    #[test]
    fn test_new_scan_truncates_metadata() {
        let client = ClientInfo::new(Some("203.0.113.7"), Some(&"é".repeat(600)));
        let scan = NewScan::new(OwnerId::generate(), &client);
        assert_eq!(scan.ip_address, "203.0.113.7");
        assert_eq!(scan.user_agent.chars().count(), MAX_USER_AGENT_LENGTH);
    }

    #[test]
    fn test_browser_family() {
        let chrome = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
        let safari = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
        let firefox = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";

        assert_eq!(browser_family(chrome), "Chrome");
        assert_eq!(browser_family(safari), "Safari");
        assert_eq!(browser_family(firefox), "Firefox");
        assert_eq!(browser_family("unknown"), "Unknown Browser");
        assert_eq!(browser_family(""), "Unknown Browser");
    }
}
