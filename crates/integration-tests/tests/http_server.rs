//! End-to-end over a real socket with `reqwest`.

use serde_json::{Value, json};

use lost_found_core::UniqueCode;
use lost_found_integration_tests::TestApp;

async fn register(client: &reqwest::Client, base: &str) -> String {
    let response = client
        .post(format!("{base}/api/create-identity"))
        .json(&json!({ "name": "Jane Doe", "phone": "+1 555-0100" }))
        .send()
        .await
        .expect("create-identity request");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.expect("JSON body");
    body["uniqueCode"].as_str().expect("uniqueCode").to_owned()
}

#[tokio::test]
async fn test_peer_address_is_recorded_without_proxy_headers() {
    let app = TestApp::new();
    let addr = app.spawn().await;
    let base = format!("http://{addr}");
    let client = reqwest::Client::new();

    let code = register(&client, &base).await;
    assert!(UniqueCode::parse(&code).is_ok());

    let response = client
        .post(format!("{base}/api/log-scan"))
        .header(reqwest::header::USER_AGENT, "integration-agent")
        .json(&json!({ "uniqueCode": code }))
        .send()
        .await
        .expect("log-scan request");
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let activity: Value = client
        .get(format!("{base}/api/owners/{code}"))
        .send()
        .await
        .expect("activity request")
        .json()
        .await
        .expect("JSON body");
    let scan = &activity["scans"][0];
    assert_eq!(scan["ipAddress"], "127.0.0.1");
    assert_eq!(scan["userAgent"], "integration-agent");
}

#[tokio::test]
async fn test_forwarded_address_wins_over_peer() {
    let app = TestApp::new();
    let addr = app.spawn().await;
    let base = format!("http://{addr}");
    let client = reqwest::Client::new();
    let code = register(&client, &base).await;

    let response = client
        .post(format!("{base}/api/log-scan"))
        .header("x-forwarded-for", "198.51.100.23")
        .json(&json!({ "uniqueCode": code }))
        .send()
        .await
        .expect("log-scan request");
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let activity: Value = client
        .get(format!("{base}/api/owners/{code}"))
        .send()
        .await
        .expect("activity request")
        .json()
        .await
        .expect("JSON body");
    assert_eq!(activity["scans"][0]["ipAddress"], "198.51.100.23");
}

#[tokio::test]
async fn test_scan_link_from_created_page_resolves() {
    let app = TestApp::new();
    let addr = app.spawn().await;
    let base = format!("http://{addr}");
    let client = reqwest::Client::new();
    let code = register(&client, &base).await;

    let response = client
        .get(format!("{base}/scan"))
        .query(&[("code", code.as_str())])
        .send()
        .await
        .expect("scan request");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(
        response
            .headers()
            .get("x-frame-options")
            .is_some()
    );
    let html = response.text().await.expect("HTML body");
    assert!(html.contains("Call Owner"));
    assert_eq!(app.store.scan_count(), 1);
}
