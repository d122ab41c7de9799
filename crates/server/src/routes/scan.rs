//! Scan-Landing view: what a stranger sees after scanning a tag.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::PageError;
use crate::filters;
use crate::models::ClientInfo;
use crate::services::{ScanService, ServiceError};
use crate::state::AppState;

/// Shown when the link carries no code.
pub const INVALID_CODE_MESSAGE: &str = "Invalid QR code";

/// Shown when the code matches no owner.
pub const UNKNOWN_CODE_MESSAGE: &str = "QR code not found or invalid";

/// Owner contact page.
#[derive(Template, WebTemplate)]
#[template(path = "scan.html")]
pub struct ScanTemplate {
    pub name: String,
    pub phone: String,
    pub tel_href: String,
}

/// Query string of a scanned link.
#[derive(Debug, Deserialize)]
pub struct ScanQuery {
    pub code: Option<String>,
}

/// `tel:` link for a phone number as typed by its owner.
#[must_use]
pub fn tel_href(phone: &str) -> String {
    let dialable: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    format!("tel:{dialable}")
}

/// Resolve the scanned code, log the scan and show the owner's contact.
///
/// GET /scan?code=<code>
#[instrument(skip_all)]
pub async fn landing(
    State(state): State<AppState>,
    client: ClientInfo,
    Query(query): Query<ScanQuery>,
) -> Result<impl IntoResponse, PageError> {
    let code = query.code.unwrap_or_default();
    let contact = ScanService::new(state.store())
        .log_scan(&code, &client)
        .await
        .map_err(|e| match e {
            ServiceError::InvalidCode(_) => {
                PageError::new(StatusCode::BAD_REQUEST, INVALID_CODE_MESSAGE)
            }
            ServiceError::NotFound => PageError::new(StatusCode::NOT_FOUND, UNKNOWN_CODE_MESSAGE),
            other => other.into(),
        })?;

    let phone = contact.phone.into_inner();
    Ok(ScanTemplate {
        name: contact.name.into_inner(),
        tel_href: tel_href(&phone),
        phone,
    })
}
