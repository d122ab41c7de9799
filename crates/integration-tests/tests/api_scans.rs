//! Scan logging and activity lookup through the JSON API.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;

use lost_found_integration_tests::{TestApp, body_json};

#[tokio::test]
async fn test_register_scan_and_review_history() {
    let app = TestApp::new();
    let code = app.create_identity("Jane Doe", "+1 555-0100").await;
    assert_eq!(code.len(), 8);

    let (status, contact) = app.log_scan(&code).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(contact, json!({ "name": "Jane Doe", "phone": "+1 555-0100" }));

    let (_, activity) = app.owner_activity(&code).await;
    assert_eq!(activity["scans"].as_array().map(Vec::len), Some(1));

    let (status, body) = app.log_scan("ZZZZZZZZ").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "QR code not found");

    let (_, activity) = app.owner_activity(&code).await;
    assert_eq!(activity["scans"].as_array().map(Vec::len), Some(1));
    assert_eq!(app.store.scan_count(), 1);
}

#[tokio::test]
async fn test_missing_code_is_a_bad_request() {
    let app = TestApp::new();

    for payload in [json!({}), json!({ "uniqueCode": "" })] {
        let (status, body) = app.post_json("/api/log-scan", &payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload: {payload}");
        assert_eq!(body["error"], "Unique code is required");
    }
    assert_eq!(app.store.scan_count(), 0);
}

#[tokio::test]
async fn test_overlong_code_is_not_found() {
    let app = TestApp::new();

    let (status, body) = app.log_scan(&"a".repeat(65)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "QR code not found");
}

#[tokio::test]
async fn test_failed_scan_write_still_returns_contact() {
    let app = TestApp::new();
    let code = app.create_identity("Jane Doe", "+1 555-0100").await;
    app.store.set_fail_scan_writes(true);

    let (status, contact) = app.log_scan(&code).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(contact["name"], "Jane Doe");
    assert_eq!(contact["phone"], "+1 555-0100");
    assert_eq!(app.store.scan_count(), 0);
}

#[tokio::test]
async fn test_scans_are_listed_newest_first() {
    let app = TestApp::new();
    let code = app.create_identity("Jane Doe", "+1 555-0100").await;

    for n in 1..=4 {
        let response = app
            .send(
                Request::builder()
                    .method("POST")
                    .uri("/api/log-scan")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header("x-forwarded-for", format!("10.0.0.{n}"))
                    .body(Body::from(json!({ "uniqueCode": code }).to_string()))
                    .expect("valid request"),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let (_, activity) = app.owner_activity(&code).await;
    let scans = activity["scans"].as_array().expect("scans array");
    let ips: Vec<&str> = scans
        .iter()
        .filter_map(|s| s["ipAddress"].as_str())
        .collect();
    assert_eq!(ips, ["10.0.0.4", "10.0.0.3", "10.0.0.2", "10.0.0.1"]);

    let times: Vec<&str> = scans
        .iter()
        .filter_map(|s| s["scannedAt"].as_str())
        .collect();
    assert_eq!(times.len(), 4);
}

#[tokio::test]
async fn test_scan_records_client_metadata() {
    let app = TestApp::new();
    let code = app.create_identity("Jane Doe", "+1 555-0100").await;

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/log-scan")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
                .header(
                    header::USER_AGENT,
                    "Mozilla/5.0 (iPhone) AppleWebKit/605.1.15 Version/17.0 Mobile Safari/604.1",
                )
                .body(Body::from(json!({ "uniqueCode": code }).to_string()))
                .expect("valid request"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let _ = body_json(response).await;

    let (_, activity) = app.owner_activity(&code).await;
    let scan = &activity["scans"][0];
    assert_eq!(scan["ipAddress"], "203.0.113.7");
    assert_eq!(scan["browser"], "Safari");
    assert!(scan["displayTime"].as_str().is_some_and(|t| t.ends_with("UTC")));
}

#[tokio::test]
async fn test_scan_without_metadata_records_unknown() {
    let app = TestApp::new();
    let code = app.create_identity("Jane Doe", "+1 555-0100").await;

    let (status, _) = app.log_scan(&code).await;
    assert_eq!(status, StatusCode::OK);

    let (_, activity) = app.owner_activity(&code).await;
    let scan = &activity["scans"][0];
    assert_eq!(scan["ipAddress"], "unknown");
    assert_eq!(scan["userAgent"], "unknown");
}

#[tokio::test]
async fn test_activity_for_unknown_code_is_not_found() {
    let app = TestApp::new();

    let (status, body) = app.owner_activity("ZZZZZZZZ").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "QR code not found");
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();

    let live = app.get("/health").await;
    assert_eq!(live.status(), StatusCode::OK);

    let ready = app.get("/health/ready").await;
    assert_eq!(ready.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = TestApp::new();

    let response = app
        .send(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "trace-123")
                .body(Body::empty())
                .expect("valid request"),
        )
        .await;

    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("trace-123")
    );
}
