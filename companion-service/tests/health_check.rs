mod common;

use axum::http::StatusCode;
use common::{ScriptedChatProvider, TestApp};

#[tokio::test]
async fn test_health_check_works() {
    let app = TestApp::spawn(ScriptedChatProvider::new(vec![]), &[]);

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "companion-service");
}

#[tokio::test]
async fn test_readiness_follows_diary_store() {
    let app = TestApp::spawn(ScriptedChatProvider::new(vec![]), &[]);

    let (status, body) = app.get("/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");

    *app.store.unavailable.lock().unwrap() = true;
    let (status, body) = app.get("/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unavailable");
}

#[tokio::test]
async fn test_metrics_endpoint_exports_http_requests() {
    let app = TestApp::spawn(ScriptedChatProvider::new(vec![]), &[]);

    app.get("/health").await;
    app.get("/health").await;
    let (status, body) = app.get_text("/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("http_requests_total"));
    assert!(body.contains("path=\"/health\""));
    assert!(body.contains("companion_sessions_active"));
}
