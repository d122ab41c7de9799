//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Pages
//! GET  /                              - Create form
//! POST /                              - Register, show QR code
//! GET  /scan?code=<code>              - Scan landing (logs a scan)
//! GET  /my-activity[?code=<code>]     - Owner activity, live updates
//!
//! # JSON API (CORS enabled)
//! POST /api/create-identity           - Register an owner
//! POST /api/log-scan                  - Resolve a code, log a scan
//! GET  /api/owners/{code}             - Owner and scan history
//! GET  /api/owners/{code}/scans/stream - Server-Sent Events of new scans
//!
//! # Operational
//! GET  /health                        - Liveness
//! GET  /health/ready                  - Store readiness
//! GET  /static/*                      - CSS and scripts
//! ```

pub mod activity;
pub mod api;
pub mod create;
pub mod health;
pub mod scan;

use std::time::Duration;

use axum::{
    Router,
    http::{HeaderName, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Directory served under `/static`.
pub const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/create-identity", post(api::create_identity))
        .route("/log-scan", post(api::log_scan))
        .route("/owners/{code}", get(api::owner_activity))
        .route("/owners/{code}/scans/stream", get(api::scan_stream))
        .layer(cors_layer())
}

/// Create the HTML page router.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(create::form).post(create::submit))
        .route("/scan", get(scan::landing))
        .route("/my-activity", get(activity::page))
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(middleware::from_fn(security_headers_middleware))
}

/// Permissive CORS for browser clients on other origins.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
}

/// Build the complete application.
///
/// Sentry layers are added by the binary so tests run without a client.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes())
        .merge(page_routes())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
