use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

use crate::models::rubric::RubricResponse;
use crate::services::AppState;

pub async fn list_datasets(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.catalog.summaries())
}

pub async fn get_rubric() -> impl IntoResponse {
    Json(RubricResponse::build())
}
