#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

use annotation_api::{
    config::Config,
    create_router,
    models::DatasetProfile,
    services::{
        annotation_store::MemoryAnnotationStore, dataset_catalog::DatasetCatalog,
        session_store::MemorySessionStore, AppState,
    },
    utils::retry::RetryConfig,
};

pub const CSV_FIXTURE: &str = "\
No,Soal,Jawaban,Jawaban_Salah,SPK,SAL,Final_Feedback_Type,Generated_Feedback,dict_generated_feedback
10,12 + 7 = ?,19,18,High,Low,Verification,raw,\"{\"\"Feedback\"\": \"\"Count the ones again\"\"}\"
11,6 x 4 = ?,24,20,Medium,Medium,Hint,raw,\"{\"\"Feedback\"\": \"\"Think of four groups of six\"\"}\"
";

pub struct TestApp {
    pub router: Router,
    pub annotations: Arc<MemoryAnnotationStore>,
}

/// Router over in-memory stores. `RAG4O` is read from a CSV fixture, the
/// other datasets fall back to sample rows.
pub fn create_test_app() -> TestApp {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let dir = tempfile::tempdir().expect("tempdir");
    let rag4o = DatasetProfile::Rag.descriptors()[0];
    std::fs::write(dir.path().join(rag4o.file_name), CSV_FIXTURE).expect("write fixture");

    let app = create_test_app_from_dir(dir.path());
    // Datasets are loaded eagerly; the directory is no longer needed
    drop(dir);
    app
}

pub fn create_test_app_from_dir(dir: &Path) -> TestApp {
    let catalog = DatasetCatalog::load(DatasetProfile::Rag, dir).expect("catalog");
    let annotations = Arc::new(MemoryAnnotationStore::new());

    let state = AppState::with_stores(
        Config::in_memory(dir),
        catalog,
        annotations.clone(),
        Arc::new(MemorySessionStore::new()),
    )
    .with_retry(RetryConfig::no_retry());

    TestApp {
        router: create_router(Arc::new(state)),
        annotations,
    }
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

pub async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, json)
}

pub async fn login(app: &Router, teacher: &str, dataset: &str) -> Value {
    let (status, json) = send_json(
        app,
        "POST",
        "/api/v1/sessions",
        Some(serde_json::json!({ "teacher_name": teacher, "dataset_name": dataset })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "login failed: {json}");
    json
}

pub fn rating(row_id: i64) -> Value {
    serde_json::json!({
        "row_id": row_id,
        "relevancy": 4,
        "accuracy": 1,
        "motivation": 3,
        "demotivation": 1,
        "guidance": 2,
        "tone_style": 3,
        "teacher_comments": "clear and kind"
    })
}
