//! JSON API handlers.
//!
//! Every failure is answered with `{"error": "<message>"}` (see
//! [`AppError`]).

use std::convert::Infallible;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::error::{AppError, Result};
use crate::models::ClientInfo;
use crate::services::{ActivityService, RegistrationService, ScanService};
use crate::state::AppState;
use crate::views::{OwnerView, ScanView};

/// Message for bodies that are not valid JSON of the expected shape.
pub const INVALID_BODY_MESSAGE: &str = "Invalid request body";

/// Name of the SSE event carrying a new scan.
pub const SCAN_EVENT: &str = "scan";

/// Create-identity request.
#[derive(Debug, Deserialize)]
pub struct CreateIdentityRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Create-identity response. Never includes the phone number.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIdentityResponse {
    pub id: String,
    pub unique_code: String,
    pub name: String,
}

/// Log-scan request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogScanRequest {
    #[serde(default)]
    pub unique_code: Option<String>,
}

/// Contact details returned to whoever scanned a tag.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub name: String,
    pub phone: String,
}

/// Owner with their scan history, newest first.
#[derive(Debug, Serialize)]
pub struct OwnerActivityResponse {
    pub owner: OwnerView,
    pub scans: Vec<ScanView>,
}

fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| {
            warn!(error = %rejection, "Rejected request body");
            AppError::BadRequest(INVALID_BODY_MESSAGE.to_string())
        })
}

/// Register a new owner.
///
/// POST /api/create-identity
#[instrument(skip_all)]
pub async fn create_identity(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateIdentityRequest>, JsonRejection>,
) -> Result<Json<CreateIdentityResponse>> {
    let request = body(payload)?;
    let owner = RegistrationService::new(state.store())
        .register(
            request.name.as_deref().unwrap_or_default(),
            request.phone.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(CreateIdentityResponse {
        id: owner.id.to_string(),
        unique_code: owner.unique_code.into_inner(),
        name: owner.name.into_inner(),
    }))
}

/// Resolve a scanned code to contact details and log the scan.
///
/// POST /api/log-scan
#[instrument(skip_all)]
pub async fn log_scan(
    State(state): State<AppState>,
    client: ClientInfo,
    payload: std::result::Result<Json<LogScanRequest>, JsonRejection>,
) -> Result<Json<ContactResponse>> {
    let request = body(payload)?;
    let contact = ScanService::new(state.store())
        .log_scan(request.unique_code.as_deref().unwrap_or_default(), &client)
        .await?;

    Ok(Json(ContactResponse {
        name: contact.name.into_inner(),
        phone: contact.phone.into_inner(),
    }))
}

/// Owner and full scan history.
///
/// GET /api/owners/{code}
#[instrument(skip(state))]
pub async fn owner_activity(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<OwnerActivityResponse>> {
    let report = ActivityService::new(state.store()).lookup(&code).await?;

    Ok(Json(OwnerActivityResponse {
        owner: OwnerView::from(&report.owner),
        scans: report.scans.iter().map(ScanView::from).collect(),
    }))
}

/// Live stream of new scans for an owner.
///
/// GET /api/owners/{code}/scans/stream
///
/// Each scan is sent as an `event: scan` with a [`ScanView`] JSON payload.
/// The subscription is released when the client disconnects.
#[instrument(skip(state))]
pub async fn scan_stream(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let mut subscription = ActivityService::new(state.store())
        .follow(&code, state.feed())
        .await?;

    let stream = async_stream::stream! {
        while let Some(scan) = subscription.next().await {
            match Event::default().event(SCAN_EVENT).json_data(ScanView::from(&scan)) {
                Ok(event) => yield Ok::<_, Infallible>(event),
                Err(e) => warn!(error = %e, "Failed to encode scan event"),
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_tolerate_missing_fields() {
        let request: CreateIdentityRequest = serde_json::from_str("{}").unwrap();
        assert!(request.name.is_none());

        let request: LogScanRequest =
            serde_json::from_str(r#"{"uniqueCode":"1a2b3c4d"}"#).unwrap();
        assert_eq!(request.unique_code.as_deref(), Some("1a2b3c4d"));
    }

    #[test]
    fn test_create_response_is_camel_case() {
        let json = serde_json::to_value(CreateIdentityResponse {
            id: "id".to_string(),
            unique_code: "1a2b3c4d".to_string(),
            name: "Jane".to_string(),
        })
        .unwrap();
        assert_eq!(json["uniqueCode"], "1a2b3c4d");
        assert!(json.get("phone").is_none());
    }
}
