//! Integration tests for Lost & Found QR.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p lost-found-integration-tests
//! ```
//!
//! No database is needed: every test builds the full router over a
//! [`MemoryStore`] wired to its own [`ScanFeed`], exactly as
//! `LOSTFOUND_STORE=memory` does.
//!
//! # Test Categories
//!
//! - `api_*` - JSON API through `tower::ServiceExt::oneshot`
//! - `scan_stream` - Server-Sent Events
//! - `pages` - HTML views
//! - `http_server` - A real listener driven with `reqwest`

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;
use url::Url;

use lost_found_server::config::AppConfig;
use lost_found_server::db::MemoryStore;
use lost_found_server::notify::ScanFeed;
use lost_found_server::routes;
use lost_found_server::state::AppState;

/// Base URL embedded in QR codes during tests.
pub const TEST_BASE_URL: &str = "https://tags.example.com";

/// The application over a fresh in-memory store.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub feed: ScanFeed,
    pub state: AppState,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// Build an app with default configuration.
    #[must_use]
    pub fn new() -> Self {
        let base_url = Url::parse(TEST_BASE_URL).expect("valid test base URL");
        let config = AppConfig::in_memory(base_url);
        let feed = ScanFeed::new(config.feed_capacity);
        let store = Arc::new(MemoryStore::with_feed(feed.clone()));
        let state = AppState::new(config, store.clone(), feed.clone());
        Self { store, feed, state }
    }

    /// A fresh router sharing this app's state.
    #[must_use]
    pub fn router(&self) -> Router {
        routes::app(self.state.clone())
    }

    /// Send one request through the router.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// `GET uri`.
    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("valid request"),
        )
        .await
    }

    /// `POST uri` with a JSON body, returning status and parsed body.
    pub async fn post_json(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        self.post_raw_json(uri, body.to_string()).await
    }

    /// `POST uri` with an arbitrary body labelled as JSON.
    pub async fn post_raw_json(&self, uri: &str, body: String) -> (StatusCode, Value) {
        let response = self
            .send(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .expect("valid request"),
            )
            .await;
        let status = response.status();
        (status, body_json(response).await)
    }

    /// `POST uri` with a urlencoded form.
    pub async fn post_form(&self, uri: &str, form: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_owned()))
                .expect("valid request"),
        )
        .await
    }

    /// Register an owner through the API and return their unique code.
    pub async fn create_identity(&self, name: &str, phone: &str) -> String {
        let (status, body) = self
            .post_json(
                "/api/create-identity",
                &serde_json::json!({ "name": name, "phone": phone }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create-identity failed: {body}");
        body["uniqueCode"]
            .as_str()
            .expect("uniqueCode in response")
            .to_owned()
    }

    /// Log a scan of `code` through the API.
    pub async fn log_scan(&self, code: &str) -> (StatusCode, Value) {
        self.post_json("/api/log-scan", &serde_json::json!({ "uniqueCode": code }))
            .await
    }

    /// Fetch `/api/owners/{code}`.
    pub async fn owner_activity(&self, code: &str) -> (StatusCode, Value) {
        let response = self.get(&format!("/api/owners/{code}")).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    /// Serve the app on an ephemeral local port.
    ///
    /// The server runs until the test runtime shuts down.
    pub async fn spawn(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local address");
        let app = self.router();
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("test server");
        });
        addr
    }
}

/// Read a response body to a string.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

/// Read a response body as JSON (`Value::Null` when empty).
pub async fn body_json(response: Response<Body>) -> Value {
    let text = body_text(response).await;
    if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).expect("JSON body")
    }
}
