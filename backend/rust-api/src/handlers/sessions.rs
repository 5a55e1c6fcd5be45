use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::{
    extractors::AppJson,
    models::{LoginRequest, SubmitAnnotationRequest, SwitchDatasetRequest},
    services::{errors::SessionError, session_service::AnnotationSessionService, AppState},
};

fn error_response(e: SessionError) -> (StatusCode, String) {
    let status = e.status_code();
    if status.is_server_error() {
        tracing::error!("Session request failed: {}", e);
    } else {
        tracing::warn!("Session request rejected: {}", e);
    }
    (status, e.to_string())
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    tracing::info!(
        "Login for teacher={}, dataset={}",
        req.teacher_name.trim(),
        req.dataset_name
    );

    let service = AnnotationSessionService::from_state(&state);
    let view = service.login(req).await.map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = AnnotationSessionService::from_state(&state);
    let view = service.view(&session_id).await.map_err(error_response)?;
    Ok(Json(view))
}

pub async fn switch_dataset(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    AppJson(req): AppJson<SwitchDatasetRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    tracing::info!(
        "Switching session {} to dataset {}",
        session_id,
        req.dataset_name
    );

    let service = AnnotationSessionService::from_state(&state);
    let view = service
        .switch_dataset(&session_id, req)
        .await
        .map_err(error_response)?;
    Ok(Json(view))
}

pub async fn submit_annotation(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    AppJson(req): AppJson<SubmitAnnotationRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    tracing::info!(
        "Submitting annotation for session {} row {}",
        session_id,
        req.row_id
    );

    let service = AnnotationSessionService::from_state(&state);
    let response = service
        .submit(&session_id, req)
        .await
        .map_err(error_response)?;
    Ok(Json(response))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let service = AnnotationSessionService::from_state(&state);
    service.logout(&session_id).await.map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}
