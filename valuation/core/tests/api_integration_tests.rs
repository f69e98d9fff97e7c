// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP surface tests over the in-memory backends.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use valuation_core::application::repository_factory::Repositories;
use valuation_core::application::ValuationServices;
use valuation_core::infrastructure::storage::InMemoryBlobStore;
use valuation_core::presentation;

const QUERY: &str = "vehicleNumber=KA01AB1234&applicantContact=9876543210";
const BOUNDARY: &str = "valuation-test-boundary";

fn app() -> Router {
    presentation::app(ValuationServices::new(
        Repositories::in_memory(),
        Arc::new(InMemoryBlobStore::default()),
        None,
        None,
    ))
}

async fn send(
    app: &Router,
    method: Method,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    read(response).await
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn multipart(payload: &Value, files: &[(&str, &str, &[u8])]) -> Body {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"payload\"\r\n\r\n{payload}\r\n"
        )
        .as_bytes(),
    );
    for (field, file_name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    Body::from(body)
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&app(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_case_lifecycle_over_http() {
    let app = app();

    let (status, body) = send(&app, Method::GET, &format!("/valuations/v1?{QUERY}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    // Lenient section read on a missing case.
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/valuations/v1/qualitycontrol?{QUERY}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overallRating"], "");

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/valuations/v1/qualitycontrol?{QUERY}"),
        Some(json!({ "overallRating": "Good", "valuationAmount": 450000, "chassisPunch": "OK" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overallRating"], "Good");

    let (status, body) = send(&app, Method::GET, &format!("/valuations/v1?{QUERY}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "v1");
    assert_eq!(body["partitionKey"], "KA01AB1234|9876543210");
    assert_eq!(body["status"], "Open");
    assert_eq!(body["workflow"].as_array().unwrap().len(), 5);

    let (status, _) = send(&app, Method::DELETE, &format!("/valuations/v1?{QUERY}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, Method::GET, &format!("/valuations/v1?{QUERY}"), None).await;
    assert_eq!(body["status"], "Deleted");
}

#[tokio::test]
async fn test_missing_identity_is_bad_request() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::GET,
        "/valuations/v1/stakeholder?vehicleNumber=KA01",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");
}

#[tokio::test]
async fn test_workflow_routes() {
    let app = app();
    send(
        &app,
        Method::PUT,
        &format!("/valuations/w1/valuationresponse?{QUERY}"),
        Some(json!({ "rawResponse": "manual" })),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/valuations/w1/workflow/2/start?{QUERY}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "sequence_violation");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/valuations/w1/workflow/1/complete?{QUERY}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Completed");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/valuations/w1/workflow/2/start?{QUERY}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assignedToRole"], "BackEnd");

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/valuations/w1/workflow/9/start?{QUERY}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/valuations/w1/workflow/2/annotations?{QUERY}"),
        Some(json!({ "redFlag": true, "remarks": "Odometer tampered" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["redFlag"], true);

    let (status, body) = send(&app, Method::GET, "/valuations/open", None).await;
    assert_eq!(status, StatusCode::OK);
    let open = body.as_array().unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0]["inProgressSteps"][0]["stepOrder"], 2);
}

#[tokio::test]
async fn test_multipart_stakeholder_upload() {
    let app = app();
    let payload = json!({
        "name": "Acme Finance",
        "applicant": { "name": "Ravi", "contact": "9876543210" }
    });

    let request = Request::builder()
        .method(Method::PUT)
        .uri(format!("/valuations/s1/stakeholder?{QUERY}"))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(multipart(&payload, &[("rcFile", "rc.pdf", b"%PDF-1.4")]))
        .unwrap();
    let (status, body) = read(app.clone().oneshot(request).await.unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Acme Finance");
    let documents = body["documents"].as_array().unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0]["type"], "RC");
    assert!(documents[0]["url"].as_str().unwrap().ends_with("-rc.pdf"));

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/valuations/s1/stakeholder?{QUERY}"),
        None,
    )
    .await;
    assert_eq!(body["applicant"]["name"], "Ravi");
}

#[tokio::test]
async fn test_multipart_rejects_unknown_photo_slot() {
    let app = app();
    let request = Request::builder()
        .method(Method::PUT)
        .uri(format!("/valuations/p1/photos?{QUERY}"))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(multipart(&json!({}), &[("Sunroof", "roof.jpg", b"\xff\xd8")]))
        .unwrap();
    let (status, body) = read(app.clone().oneshot(request).await.unwrap()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");

    let (status, _) = send(&app, Method::GET, &format!("/valuations/p1?{QUERY}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_enrichment_without_providers_is_bad_gateway() {
    let app = app();
    send(
        &app,
        Method::PUT,
        &format!("/valuations/e1/qualitycontrol?{QUERY}"),
        Some(json!({ "overallRating": "Good" })),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/valuations/e1/valuation?{QUERY}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "upstream_unavailable");

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/valuations/e1/vehicledetails/with-rc?{QUERY}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_workflow_table_routes() {
    let app = app();

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/valuations/t1/workflow/table?{QUERY}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/valuations/t1/workflow/table?{QUERY}"),
        Some(json!({
            "workflow": "AVO",
            "workflowStepOrder": 3,
            "status": "InProgress",
            "name": "Acme Finance"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valuationId"], "t1");
    assert_eq!(body["vehicleNumber"], "KA01AB1234");

    let (_, body) = send(&app, Method::GET, "/workflows/in-progress", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/valuations/t1/workflow/table?{QUERY}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, Method::GET, "/workflows/in-progress", None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_workflow_table_keeps_assignment_across_step_changes() {
    let app = app();
    let table = format!("/valuations/a1/workflow/table?{QUERY}");
    send(
        &app,
        Method::PUT,
        &format!("/valuations/a1/qualitycontrol?{QUERY}"),
        Some(json!({ "overallRating": "Good" })),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &table,
        Some(json!({
            "workflow": "Stakeholder",
            "workflowStepOrder": 1,
            "status": "InProgress",
            "assignedTo": "Priya",
            "assignedToPhoneNumber": "9000000001",
            "assignedToEmail": "priya@acme.example",
            "assignedToWhatsapp": "9000000001",
            "createdBy": "ops"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assignedTo"], "Priya");

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/valuations/a1/workflow/1/complete?{QUERY}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The step change reaches the table in the background.
    let mut body = Value::Null;
    for _ in 0..50 {
        body = send(&app, Method::GET, &table, None).await.1;
        if body["workflowStepOrder"] == 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(body["workflowStepOrder"], 2);
    assert_eq!(body["workflow"], "BackEnd");
    assert_eq!(body["assignedToRole"], "BackEnd");
    assert_eq!(body["assignedTo"], "Priya");
    assert_eq!(body["assignedToEmail"], "priya@acme.example");
    assert_eq!(body["createdBy"], "ops");
}
