//! Login, audit and incident endpoints driven through the router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use compliance_tracker::auth::UserRepository;
use compliance_tracker::blob::MemoryBlobStore;
use compliance_tracker::clock::SystemClock;
use compliance_tracker::db::DbPool;
use compliance_tracker::http_server::{build_router, AppState, HttpServerConfig};

const BOUNDARY: &str = "incident-boundary";

fn state() -> AppState {
    AppState::new(
        DbPool::open_in_memory().unwrap(),
        Arc::new(MemoryBlobStore::new()),
        Arc::new(SystemClock),
    )
}

fn router(state: &AppState) -> Router {
    build_router(&HttpServerConfig::default(), state)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn incident_form(fields: &[(&str, &str)], evidence: Option<(&str, &[u8])>) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, data)) = evidence {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"evidence\"; filename=\"{file_name}\"\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/submit-incident")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_login() {
    let state = state();
    UserRepository::new(state.pool.clone())
        .add_user("auditor", "s3cret-passphrase")
        .await
        .unwrap();
    let app = router(&state);

    let (status, body) = send_json(
        &app,
        json_request(
            "POST",
            "/login",
            json!({"username": "auditor", "password": "s3cret-passphrase"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    for (username, password) in [("auditor", "wrong-password"), ("nobody", "s3cret-passphrase")] {
        let (status, body) = send_json(
            &app,
            json_request(
                "POST",
                "/login",
                json!({"username": username, "password": password}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Invalid username or password.");
    }
}

#[tokio::test]
async fn test_audits_and_summary() {
    let state = state();
    let app = router(&state);

    for (id, date, status) in [
        ("A-1", "2024-01-15", "completed"),
        ("A-2", "2024-03-01", " COMPLETED "),
        ("A-3", "2024-02-10", "scheduled"),
    ] {
        let (code, body) = send_json(
            &app,
            json_request(
                "POST",
                "/audits",
                json!({
                    "audit_id": id,
                    "audit_name": format!("Audit {id}"),
                    "dept_audited": "Finance",
                    "auditor": "K. Lee",
                    "audit_date": date,
                    "status": status,
                }),
            ),
        )
        .await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["audit"]["audit_id"], id);
    }

    let (code, body) = send_json(
        &app,
        json_request("POST", "/audits", json!({"audit_id": "A-1", "audit_name": "Again"})),
    )
    .await;
    assert_eq!(code, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (code, audits) = send_json(&app, get("/audits")).await;
    assert_eq!(code, StatusCode::OK);
    let ids: Vec<&str> = audits
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["audit_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["A-2", "A-3", "A-1"]);

    let (code, summary) = send_json(&app, get("/audit-status-summary")).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(
        summary,
        json!([
            {"status": "Completed", "count": 2},
            {"status": "Scheduled", "count": 1},
        ])
    );
}

#[tokio::test]
async fn test_submit_incident_redirects() {
    let state = state();
    let app = router(&state);

    let response = app
        .clone()
        .oneshot(incident_form(
            &[
                ("incidentType", "Data Breach"),
                ("severity", "High"),
                ("date", "2024-04-02"),
                ("department", "IT"),
                ("description", "Laptop lost"),
            ],
            Some(("report.txt", b"police report")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/incident.html");

    let (code, incidents) = send_json(&app, get("/api/incidents")).await;
    assert_eq!(code, StatusCode::OK);
    let incident = &incidents[0];
    assert_eq!(incident["incident_type"], "Data Breach");
    assert_eq!(incident["severity_level"], "High");
    assert_eq!(incident["date_reported"], "2024-04-02");
    assert_eq!(incident["status"], "open");
    assert!(incident["evidence"]
        .as_str()
        .unwrap()
        .ends_with("report.txt"));
}

#[tokio::test]
async fn test_submit_incident_bad_date() {
    let state = state();
    let app = router(&state);

    let (code, _) = send(&app, incident_form(&[("date", "04/02/2024")], None)).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);

    let (_, incidents) = send_json(&app, get("/api/incidents")).await;
    assert_eq!(incidents, json!([]));
}
