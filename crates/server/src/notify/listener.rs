//! Bridge from Postgres `LISTEN/NOTIFY` to the in-process [`ScanFeed`].
//!
//! The `qr_scans_insert` trigger publishes every committed scan row as JSON.
//! A single background task listens on that channel and republishes each
//! payload to local subscribers.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgListener;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::ScanFeed;
use crate::db::scans::ScanRow;
use crate::models::ScanEvent;

/// Notification channel the insert trigger publishes on.
pub const SCAN_CHANNEL: &str = "qr_scans_insert";

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Spawn the listener task.
///
/// The task reconnects after connection loss and runs until aborted.
/// Scans committed while disconnected are not replayed to live subscribers;
/// they are still in the history.
#[must_use]
pub fn spawn(pool: PgPool, feed: ScanFeed) -> JoinHandle<()> {
    info!(channel = SCAN_CHANNEL, "Spawning scan notification listener");
    tokio::spawn(async move {
        loop {
            if let Err(e) = run(&pool, &feed).await {
                error!(error = %e, "Scan notification listener failed, reconnecting");
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    })
}

#[instrument(skip_all)]
async fn run(pool: &PgPool, feed: &ScanFeed) -> Result<(), sqlx::Error> {
    let mut listener = PgListener::connect_with(pool).await?;
    listener.listen(SCAN_CHANNEL).await?;
    info!(channel = SCAN_CHANNEL, "Listening for scan inserts");

    loop {
        let notification = listener.recv().await?;
        match parse_payload(notification.payload()) {
            Ok(scan) => {
                let delivered = feed.publish(&scan);
                debug!(owner_id = %scan.owner_id, delivered, "Published scan event");
            }
            Err(e) => {
                warn!(error = %e, "Ignoring malformed scan notification");
            }
        }
    }
}

fn parse_payload(payload: &str) -> Result<ScanEvent, serde_json::Error> {
    serde_json::from_str::<ScanRow>(payload).map(ScanEvent::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payload() {
        let payload = r#"{"id":"5b6f0c1e-8f3a-4d5e-9a51-0f8f0a5a3c11","qr_user_id":"0d7c5a7e-2f11-4a77-b2b7-2a4e6a0b9f20","scanned_at":"2026-10-14T09:30:12.345678+00:00","ip_address":"unknown","user_agent":"unknown"}"#;
        let scan = parse_payload(payload).unwrap();
        assert_eq!(scan.ip_address, "unknown");
        assert_eq!(scan.id.to_string(), "5b6f0c1e-8f3a-4d5e-9a51-0f8f0a5a3c11");
    }

    #[test]
    fn test_parse_payload_rejects_garbage() {
        assert!(parse_payload("not json").is_err());
        assert!(parse_payload(r#"{"id":"x"}"#).is_err());
    }
}
