use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use edudb_quiz::{
    certificate::{CertificateClient, CertificateError, CertificateRequest},
    models::{Level, Progress},
};

/// Stand-in for the certificate service: refuses "Mallory", issues for anyone else.
async fn generate(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["student_name"] == "Mallory" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "Student name is required" })),
        );
    }
    let id = format!("EDB-2026-{:06X}", body["advanced_score"].as_u64().unwrap_or(0));
    (
        StatusCode::OK,
        Json(json!({ "success": true, "certificate_id": id, "message": "Certificate generated successfully" })),
    )
}

async fn spawn_stub() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/api/certificate/generate", post(generate));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/")
}

fn graduated() -> Progress {
    let mut p = Progress::default();
    p.record(Level::Beginner, 15);
    p.record(Level::Intermediate, 14);
    p.record(Level::Advanced, 13);
    p
}

#[tokio::test]
async fn issues_certificate() {
    let client = CertificateClient::new(spawn_stub().await);
    let req = CertificateRequest::from_progress("Ada Lovelace", &graduated(), 420).unwrap();
    let issued = client.issue(&req).await.unwrap();
    assert_eq!(issued.certificate_id, "EDB-2026-00000D");
}

#[tokio::test]
async fn service_refusal_surfaces_message() {
    let client = CertificateClient::new(spawn_stub().await);
    let req = CertificateRequest::from_progress("Mallory", &graduated(), 0).unwrap();
    match client.issue(&req).await {
        Err(CertificateError::Rejected(msg)) => assert_eq!(msg, "Student name is required"),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_service_is_http_error() {
    // bind then drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = CertificateClient::new(format!("http://{addr}"));
    let req = CertificateRequest::from_progress("Ada", &graduated(), 0).unwrap();
    assert!(matches!(client.issue(&req).await, Err(CertificateError::Http(_))));
}
