//! My-Activity view: an owner's scan log with live updates.
//!
//! The page lists the history at load time; `static/js/activity.js` then
//! opens the scan stream for the same code and prepends new scans.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, PageError};
use crate::filters;
use crate::services::{ActivityService, ServiceError};
use crate::state::AppState;
use crate::views::{OwnerView, ScanView, scan_count_label};

/// Activity page, either the code entry form or an owner's log.
#[derive(Template, WebTemplate)]
#[template(path = "activity.html")]
pub struct ActivityTemplate {
    pub error: Option<String>,
    pub code: String,
    pub report: Option<ActivityView>,
}

/// What the page shows about a found owner.
pub struct ActivityView {
    pub owner: OwnerView,
    pub scans: Vec<ScanView>,
    pub count_label: String,
}

/// Query string of the activity page.
#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub code: Option<String>,
}

/// Show the code form, or the activity of the owner of `code`.
///
/// GET /my-activity[?code=<code>]
#[instrument(skip_all)]
pub async fn page(
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> Result<Response, PageError> {
    let code = query.code.unwrap_or_default().trim().to_string();
    if code.is_empty() {
        return Ok(ActivityTemplate {
            error: None,
            code,
            report: None,
        }
        .into_response());
    }

    match ActivityService::new(state.store()).lookup(&code).await {
        Ok(report) => {
            let scans: Vec<ScanView> = report.scans.iter().map(ScanView::from).collect();
            let view = ActivityView {
                owner: OwnerView::from(&report.owner),
                count_label: scan_count_label(scans.len()),
                scans,
            };
            Ok(ActivityTemplate {
                error: None,
                code,
                report: Some(view),
            }
            .into_response())
        }
        Err(e @ ServiceError::NotFound) => {
            let page = ActivityTemplate {
                error: Some(AppError::from(e).public_message()),
                code,
                report: None,
            };
            Ok((StatusCode::NOT_FOUND, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}
