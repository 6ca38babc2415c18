use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use benchdash::{
    build_router,
    store::{FileStore, SessionCoordinator, SessionStore},
    AppState,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt;

const BOUNDARY: &str = "benchdash-test-boundary";

/// Router over a single file backend in a fresh directory. The directory
/// lives as long as the returned guard.
fn setup_app() -> (TempDir, Router) {
    let tmp = TempDir::new().unwrap();
    let backends: Vec<Arc<dyn SessionStore>> = vec![Arc::new(FileStore::new(tmp.path()))];
    let coordinator = SessionCoordinator::new(backends).unwrap();
    (tmp, build_router(AppState::new(coordinator), 1024 * 1024))
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn upload_request(file_contents: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"cpu.json\"\r\n\
         Content-Type: application/json\r\n\r\n\
         {file_contents}\r\n\
         --{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Two runs at the same 100 Mbps step; the second one burns 15 % CPU where
/// the baseline burns 10 %.
fn compared_session() -> Value {
    let run = |id: i64, name: &str, cpu: f64| {
        json!({
            "id": id,
            "name": name,
            "data": [{ "Requested_Throughput": 100000000.0, "Receive_Throughput": 99000000.0 }],
            "cpuData": {
                "tests": [{
                    "throughput_mbps": 100.0,
                    "system": { "cpu_utilization": cpu },
                    "cores": [],
                }],
            },
        })
    };

    json!({
        "id": "compared",
        "name": "CPU comparison",
        "runs": [run(1, "baseline", 10.0), run(2, "candidate", 15.0)],
        "customPlots": [{
            "id": 7,
            "name": "System CPU",
            "selectedRuns": [1, 2],
            "plotType": "throughput-cpu",
            "cpuType": "total",
        }],
    })
}

#[tokio::test]
async fn health_reports_module_and_version() {
    let (_tmp, app) = setup_app();

    let (status, body) = send(&app, empty_request("GET", "/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "benchdash");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn save_requires_id_and_name() {
    let (_tmp, app) = setup_app();

    let no_id = json!({ "name": "x" });
    let (status, body) = send(&app, json_request("POST", "/sessions", &no_id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        json_request("POST", "/sessions", &json!({ "id": "a", "name": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        json_request("POST", "/sessions", &json!({ "id": "../etc", "name": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn save_rejects_malformed_json() {
    let (_tmp, app) = setup_app();
    let request = Request::builder()
        .method("POST")
        .uri("/sessions")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();

    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid session body"));
}

#[tokio::test]
async fn saved_session_can_be_read_back() {
    let (_tmp, app) = setup_app();

    let (status, saved) = send(
        &app,
        json_request("POST", "/sessions", &json!({ "id": "s1", "name": "first" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["id"], "s1");
    assert!(saved["createdAt"].is_string());
    assert!(saved["updatedAt"].is_string());

    let (status, fetched) = send(&app, empty_request("GET", "/sessions/s1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, saved);
}

#[tokio::test]
async fn saving_the_same_id_twice_keeps_one_session() {
    let (_tmp, app) = setup_app();

    for name in ["first", "second"] {
        let (status, _) = send(
            &app,
            json_request("POST", "/sessions", &json!({ "id": "same", "name": name })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, all) = send(&app, empty_request("GET", "/sessions")).await;
    assert_eq!(status, StatusCode::OK);
    let all = all.as_object().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all["same"]["name"], "second");
}

#[tokio::test]
async fn recent_order_lists_newest_first() {
    let (_tmp, app) = setup_app();

    for id in ["older", "newer"] {
        send(
            &app,
            json_request("POST", "/sessions", &json!({ "id": id, "name": id })),
        )
        .await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let (status, recent) = send(&app, empty_request("GET", "/sessions?order=recent")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = recent
        .as_array()
        .unwrap()
        .iter()
        .map(|session| session["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["newer", "older"]);

    let (status, _) = send(&app, empty_request("GET", "/sessions?order=sideways")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_sessions_are_not_found() {
    let (_tmp, app) = setup_app();

    let (status, body) = send(&app, empty_request("GET", "/sessions/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, empty_request("DELETE", "/sessions/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "success": false }));
}

#[tokio::test]
async fn delete_removes_the_session() {
    let (_tmp, app) = setup_app();
    send(
        &app,
        json_request("POST", "/sessions", &json!({ "id": "gone", "name": "soon" })),
    )
    .await;

    let (status, body) = send(&app, empty_request("DELETE", "/sessions/gone")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (status, _) = send(&app, empty_request("GET", "/sessions/gone")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_echoes_parsed_json() {
    let (_tmp, app) = setup_app();

    let document = r#"{"tests": [], "pmu_data": {"l1d": [1.0]}}"#;
    let (status, body) = send(&app, upload_request(document)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pmu_data"]["l1d"][0], 1.0);
}

#[tokio::test]
async fn upload_rejects_invalid_json_and_missing_file() {
    let (_tmp, app) = setup_app();

    let (status, body) = send(&app, upload_request("{ broken")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid JSON file"));

    let empty = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(format!("--{BOUNDARY}--\r\n")))
        .unwrap();
    let (status, body) = send(&app, empty).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn plot_statistics_compare_against_the_first_selected_run() {
    let (_tmp, app) = setup_app();
    let (status, _) = send(&app, json_request("POST", "/sessions", &compared_session())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        empty_request("GET", "/sessions/compared/plots/7/statistics"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plotType"], "throughput-cpu");

    let metrics = body["metrics"].as_array().unwrap();
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0]["metric"], "system");
    assert_eq!(metrics[0]["baseline"]["name"], "baseline");

    let comparison = &metrics[0]["comparisons"][0];
    assert_eq!(comparison["runId"], 2);
    assert_eq!(comparison["matchedPoints"], 1);
    assert!((comparison["meanRelativeDiff"].as_f64().unwrap() - 50.0).abs() < 1e-9);
    assert!((comparison["meanAbsoluteDiff"].as_f64().unwrap() - 5.0).abs() < 1e-9);
}

#[tokio::test]
async fn plot_statistics_for_unknown_plot_is_not_found() {
    let (_tmp, app) = setup_app();
    send(&app, json_request("POST", "/sessions", &compared_session())).await;

    let (status, _) = send(
        &app,
        empty_request("GET", "/sessions/compared/plots/99/statistics"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        empty_request("GET", "/sessions/missing/plots/7/statistics"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn null_cells_and_client_fields_survive_a_save() {
    let (_tmp, app) = setup_app();
    let session = json!({
        "id": "extras",
        "name": "client fields",
        "theme": "dark",
        "runs": [{
            "id": 1,
            "name": "baseline",
            "color": "#1f77b4",
            "data": [{
                "Requested_Throughput": 100000000.0,
                "Average_RTT": null,
                "Throughput_Loss": 0.02
            }],
            "cpuData": {
                "tests": [{ "throughput_mbps": 100.0, "cores": [{ "core_id": 3 }] }]
            }
        }]
    });

    let (status, _) = send(&app, json_request("POST", "/sessions", &session)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, fetched) = send(&app, empty_request("GET", "/sessions/extras")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["theme"], "dark");

    let run = &fetched["runs"][0];
    assert_eq!(run["color"], "#1f77b4");
    assert_eq!(run["data"][0]["Throughput_Loss"], 0.02);
    assert!(run["data"][0].get("Average_RTT").is_none());
    assert!(run["data"][0].get("Receive_Throughput").is_none());
    assert_eq!(run["cpuData"]["tests"][0]["cores"][0]["core_id"], 3);
}
