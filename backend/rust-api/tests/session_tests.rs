use axum::http::StatusCode;
use serde_json::json;

mod common;

use common::{create_test_app, login, rating, send_json};

#[tokio::test]
async fn test_login_presents_first_remaining_row() {
    let app = create_test_app();
    let view = login(&app.router, "  Bu Sari  ", "RAG4O").await;

    assert_eq!(view["teacher_name"], "Bu Sari");
    assert_eq!(view["dataset_name"], "RAG4O");
    assert_eq!(view["status"], "active");
    assert_eq!(view["progress"]["annotated"], 0);
    assert_eq!(view["progress"]["total"], 2);
    assert_eq!(view["current"]["row_id"], 10);
    assert_eq!(view["current"]["number"], 1);
    assert_eq!(view["current"]["feedback"], "Count the ones again");
    assert!(view.get("warning").is_none());
}

#[tokio::test]
async fn test_annotate_until_complete() {
    let app = create_test_app();
    let view = login(&app.router, "Pak Budi", "RAG4O").await;
    let id = view["session_id"].as_str().unwrap();
    let uri = format!("/api/v1/sessions/{id}/annotations");

    let (status, first) = send_json(&app.router, "POST", &uri, Some(rating(10))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["outcome"], "saved");
    assert_eq!(first["message"], "Annotation saved successfully!");
    assert_eq!(first["session"]["current"]["row_id"], 11);

    let (status, second) = send_json(&app.router, "POST", &uri, Some(rating(11))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["session"]["status"], "complete");
    assert!(second["session"]["current"].is_null());
    assert_eq!(second["session"]["progress"]["fraction"], 1.0);

    let (status, view) = send_json(&app.router, "GET", &format!("/api/v1/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["status"], "complete");

    let records = app.annotations.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].teacher_name, "Pak Budi");
    assert_eq!(records[0].problem, "12 + 7 = ?");
    assert_eq!(records[0].teacher_comments.as_deref(), Some("clear and kind"));
}

#[tokio::test]
async fn test_duplicate_submission_is_already_annotated() {
    let app = create_test_app();
    let a = login(&app.router, "Bu Sari", "RAG4O").await;
    let b = login(&app.router, "Bu Sari", "RAG4O").await;

    let uri_a = format!("/api/v1/sessions/{}/annotations", a["session_id"].as_str().unwrap());
    let uri_b = format!("/api/v1/sessions/{}/annotations", b["session_id"].as_str().unwrap());

    let (status, _) = send_json(&app.router, "POST", &uri_a, Some(rating(10))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send_json(&app.router, "POST", &uri_b, Some(rating(10))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["outcome"], "already_annotated");
    assert_eq!(
        json["message"],
        "This question was already annotated. Skipping to next question."
    );
    assert_eq!(json["session"]["progress"]["annotated"], 1);
    assert_eq!(json["session"]["current"]["row_id"], 11);
    assert_eq!(app.annotations.records().len(), 1);
}

#[tokio::test]
async fn test_login_resumes_from_stored_annotations() {
    let app = create_test_app();
    let first = login(&app.router, "Bu Sari", "RAG4O").await;
    let uri = format!("/api/v1/sessions/{}/annotations", first["session_id"].as_str().unwrap());
    send_json(&app.router, "POST", &uri, Some(rating(10))).await;

    let again = login(&app.router, "Bu Sari", "RAG4O").await;
    assert_eq!(again["progress"]["annotated"], 1);
    assert_eq!(again["current"]["row_id"], 11);

    let other = login(&app.router, "Pak Budi", "RAG4O").await;
    assert_eq!(other["progress"]["annotated"], 0);
    assert_eq!(other["current"]["row_id"], 10);
}

#[tokio::test]
async fn test_invalid_score_returns_400() {
    let app = create_test_app();
    let view = login(&app.router, "Bu Sari", "RAG4O").await;
    let uri = format!("/api/v1/sessions/{}/annotations", view["session_id"].as_str().unwrap());

    let mut body = rating(10);
    body["accuracy"] = json!(2);
    let (status, _) = send_json(&app.router, "POST", &uri, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.annotations.records().is_empty());
}

#[tokio::test]
async fn test_malformed_body_returns_json_error() {
    let app = create_test_app();
    let (status, json) = send_json(
        &app.router,
        "POST",
        "/api/v1/sessions",
        Some(json!({ "teacher": "missing fields" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
    assert!(json["message"].is_string());
}

#[tokio::test]
async fn test_login_rejects_blank_name_and_unknown_dataset() {
    let app = create_test_app();

    let (status, body) = send_json(
        &app.router,
        "POST",
        "/api/v1/sessions",
        Some(json!({ "teacher_name": "   ", "dataset_name": "RAG4O" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Please enter your name");

    let (status, _) = send_json(
        &app.router,
        "POST",
        "/api/v1/sessions",
        Some(json!({ "teacher_name": "Bu Sari", "dataset_name": "English Dataset (GPT-4o)" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_row_outside_dataset_returns_404() {
    let app = create_test_app();
    let view = login(&app.router, "Bu Sari", "RAG4O").await;
    let uri = format!("/api/v1/sessions/{}/annotations", view["session_id"].as_str().unwrap());

    let (status, _) = send_json(&app.router, "POST", &uri, Some(rating(1))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_store_outage_on_insert_returns_503_and_keeps_progress() {
    let app = create_test_app();
    let view = login(&app.router, "Bu Sari", "RAG4O").await;
    let id = view["session_id"].as_str().unwrap();
    app.annotations.fail_inserts(true);

    let (status, body) = send_json(
        &app.router,
        "POST",
        &format!("/api/v1/sessions/{id}/annotations"),
        Some(rating(10)),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.as_str().unwrap().starts_with("Error saving to database"));

    let (_, view) = send_json(&app.router, "GET", &format!("/api/v1/sessions/{id}"), None).await;
    assert_eq!(view["progress"]["annotated"], 0);
    assert_eq!(view["current"]["row_id"], 10);

    app.annotations.fail_inserts(false);
    let (status, json) = send_json(
        &app.router,
        "POST",
        &format!("/api/v1/sessions/{id}/annotations"),
        Some(rating(10)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["outcome"], "saved");
}

#[tokio::test]
async fn test_query_outage_degrades_session_with_warning() {
    let app = create_test_app();
    app.annotations.fail_queries(true);

    let view = login(&app.router, "Bu Sari", "RAG4O").await;
    assert_eq!(view["progress"]["annotated"], 0);
    assert_eq!(view["current"]["row_id"], 10);
    assert!(view["warning"]
        .as_str()
        .unwrap()
        .starts_with("Could not fetch previous annotations"));
}

#[tokio::test]
async fn test_switch_dataset() {
    let app = create_test_app();
    let view = login(&app.router, "Bu Sari", "RAG4O").await;
    let id = view["session_id"].as_str().unwrap();

    let (status, switched) = send_json(
        &app.router,
        "PUT",
        &format!("/api/v1/sessions/{id}/dataset"),
        Some(json!({ "dataset_name": "5N" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(switched["session_id"], id);
    assert_eq!(switched["dataset_name"], "5N");
    assert_eq!(switched["progress"]["total"], 3);
    assert_eq!(switched["current"]["row_id"], 1);

    let (status, _) = send_json(
        &app.router,
        "PUT",
        &format!("/api/v1/sessions/{id}/dataset"),
        Some(json!({ "dataset_name": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_then_session_is_gone() {
    let app = create_test_app();
    let view = login(&app.router, "Bu Sari", "RAG4O").await;
    let uri = format!("/api/v1/sessions/{}", view["session_id"].as_str().unwrap());

    let (status, _) = send_json(&app.router, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send_json(&app.router, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(&app.router, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_responses_carry_trace_id() {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    let app = create_test_app();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/rubric")
                .header("x-trace-id", "trace-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["x-trace-id"], "trace-123");
}
