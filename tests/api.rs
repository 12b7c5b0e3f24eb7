use axum::body::Body;
use axum::http::StatusCode;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use stagecraft::api::{build_router, AppState};
use stagecraft::db::PersistentHistory;
use stagecraft::models::report::{Report, ReportStatus};
use stagecraft::reporting::write_report;
use tempfile::TempDir;
use tower::ServiceExt;

fn create_test_state(dir: &TempDir, history: Option<PersistentHistory>) -> AppState {
    AppState {
        report_dir: dir.path().to_path_buf(),
        history,
    }
}

fn get(uri: &str) -> axum::http::Request<Body> {
    axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn response_json(response: axum::http::Response<Body>) -> Value {
    let (parts, body) = response.into_parts();
    let bytes = body.collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        panic!("Empty response body. Status: {}", parts.status);
    }
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("JSON parse error: {}. Body: {:?}", e, String::from_utf8_lossy(&bytes)))
}

async fn seed_report(dir: &TempDir, agent: &str, file: &str, status: ReportStatus) {
    let mut report = Report::new(agent);
    report.set_status(status);
    report.set_field("image", "ghcr.io/me/myimage:latest");
    write_report(&mut report, dir.path(), file).await;
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = TempDir::new().unwrap();
    let response = build_router(create_test_state(&dir, None))
        .oneshot(get("/api/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_reports_lists_only_existing_stages() {
    let dir = TempDir::new().unwrap();
    seed_report(&dir, "build", "build_report.json", ReportStatus::Success).await;

    let response = build_router(create_test_state(&dir, None))
        .oneshot(get("/api/reports"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    let stages = body.as_object().unwrap();
    assert_eq!(stages.len(), 1);
    assert_eq!(body["build"]["status"], "success");
    assert_eq!(body["build"]["image"], "ghcr.io/me/myimage:latest");
}

#[tokio::test]
async fn test_report_by_stage() {
    let dir = TempDir::new().unwrap();
    seed_report(&dir, "log-analysis", "log_analysis_report.json", ReportStatus::Success).await;
    let app = build_router(create_test_state(&dir, None));

    let response = app.clone().oneshot(get("/api/reports/log-analysis")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["agent"], "log-analysis");

    let response = app.clone().oneshot(get("/api/reports/deploy")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(get("/api/reports/lint")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response_json(response).await["error"].as_str().unwrap().contains("Unknown stage"));
}

#[tokio::test]
async fn test_history_and_trend() {
    let dir = TempDir::new().unwrap();
    let history = PersistentHistory::in_memory().unwrap();
    for status in ["success", "failed", "success"] {
        history
            .append_history("deploy", &json!({"status": status, "issues": []}))
            .unwrap();
    }
    let app = build_router(create_test_state(&dir, Some(history)));

    let response = app.clone().oneshot(get("/api/history/deploy?limit=2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let records = response_json(response).await;
    assert_eq!(records.as_array().unwrap().len(), 2);
    assert_eq!(records[0]["summary"]["status"], "success");

    let response = app.oneshot(get("/api/history/deploy/trend")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let trend = response_json(response).await;
    assert_eq!(trend["runs"], 3);
    assert_eq!(trend["success"], 2);
    assert_eq!(trend["failed"], 1);
}

#[tokio::test]
async fn test_history_without_store_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let response = build_router(create_test_state(&dir, None))
        .oneshot(get("/api/history/build"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
